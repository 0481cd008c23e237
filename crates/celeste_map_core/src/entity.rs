//! Entities and triggers placed in a level

use crate::{Attributes, RawElement, Value};
use serde::{Deserialize, Serialize};

/// Attributes lifted into dedicated fields and left out of `attributes`.
const PLACEMENT_ATTRIBUTES: [&str; 5] = ["id", "x", "y", "width", "height"];

/// Entity name of the player spawn marker.
pub const SPAWN_POINT: &str = "player";

/// An entity or trigger placed in a level.
///
/// Positions are level-relative pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityInstance {
    /// Editor-assigned id, unique within the map when present
    pub id: Option<i64>,
    /// Type name (e.g., "spinner", "refill", "player")
    pub name: String,
    pub position: [f32; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<[u32; 2]>,
    /// Path nodes, level-relative pixels
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<[f32; 2]>,
    /// Every other attribute, in file order
    #[serde(default)]
    pub attributes: Attributes,
}

impl EntityInstance {
    pub fn new(name: String, position: [f32; 2]) -> Self {
        Self {
            id: None,
            name,
            position,
            size: None,
            nodes: Vec::new(),
            attributes: Attributes::new(),
        }
    }

    /// Build from an `entities`/`triggers` child element.
    ///
    /// Missing coordinates default to the level origin, matching how the game
    /// treats them.
    pub fn from_element(element: &RawElement) -> Self {
        let number = |name: &str| element.attribute(name).and_then(Value::as_float);

        let size = match (number("width"), number("height")) {
            (Some(w), Some(h)) => Some([w.max(0.0) as u32, h.max(0.0) as u32]),
            _ => None,
        };

        let nodes = element
            .children_named("node")
            .map(|node| {
                let x = node.attribute("x").and_then(Value::as_float).unwrap_or(0.0);
                let y = node.attribute("y").and_then(Value::as_float).unwrap_or(0.0);
                [x, y]
            })
            .collect();

        let attributes = element
            .attributes
            .iter()
            .filter(|(name, _)| !PLACEMENT_ATTRIBUTES.contains(name))
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();

        Self {
            id: element.attribute("id").and_then(Value::as_int),
            name: element.name.clone(),
            position: [number("x").unwrap_or(0.0), number("y").unwrap_or(0.0)],
            size,
            nodes,
            attributes,
        }
    }

    pub fn is_spawn_point(&self) -> bool {
        self.name == SPAWN_POINT
    }

    /// Get a string property
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|v| v.as_string())
    }

    /// Get an integer property
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.attributes.get(key).and_then(|v| v.as_int())
    }

    /// Get a float property
    pub fn get_float(&self, key: &str) -> Option<f32> {
        self.attributes.get(key).and_then(|v| v.as_float())
    }

    /// Get a boolean property
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.attributes.get(key).and_then(|v| v.as_bool())
    }
}
