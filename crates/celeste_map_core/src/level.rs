//! A single room of a map

use crate::{EntityInstance, MapError, RawElement, TileMatrix, Value, TILE_SIZE};

/// A level (room): its placement in world pixels, solid tiles and contents.
#[derive(Debug, Clone)]
pub struct Level {
    pub name: String,
    /// World position of the top-left corner, in pixels
    pub x: i32,
    pub y: i32,
    /// Size in pixels
    pub width: u32,
    pub height: u32,
    pub solids: TileMatrix,
    /// Background tile grid text
    pub bg: Option<String>,
    pub fg_tiles: Option<String>,
    pub bg_tiles: Option<String>,
    pub obj_tiles: Option<String>,
    pub entities: Vec<EntityInstance>,
    pub triggers: Vec<EntityInstance>,
}

impl Level {
    pub fn new(name: String, x: i32, y: i32, width: u32, height: u32, solids: TileMatrix) -> Self {
        Self {
            name,
            x,
            y,
            width,
            height,
            solids,
            bg: None,
            fg_tiles: None,
            bg_tiles: None,
            obj_tiles: None,
            entities: Vec::new(),
            triggers: Vec::new(),
        }
    }

    /// Build a level from a `level` element
    pub fn from_element(element: &RawElement) -> Result<Self, MapError> {
        let name = match element.attribute("name") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(MapError::InvalidAttribute {
                    element: element.name.clone(),
                    attribute: "name",
                    expected: "string",
                    found: other.kind(),
                })
            }
            None => {
                return Err(MapError::MissingAttribute {
                    element: element.name.clone(),
                    attribute: "name",
                })
            }
        };

        Self::build(element, name.clone()).map_err(|e| e.in_level(&name))
    }

    fn build(element: &RawElement, name: String) -> Result<Self, MapError> {
        let x = ranged_attribute(element, "x", int_attribute(element, "x")?)?;
        let y = ranged_attribute(element, "y", int_attribute(element, "y")?)?;
        let width = ranged_attribute(element, "width", int_attribute(element, "width")?.max(0))?;
        let height = ranged_attribute(element, "height", int_attribute(element, "height")?.max(0))?;

        let mut solids_text = None;
        let mut level = Level::new(name, x, y, width, height, TileMatrix::default());

        for child in &element.children {
            let text = || child.inner_text.clone();
            match child.name.as_str() {
                "solids" => solids_text = text(),
                "bg" => level.bg = text(),
                "fgtiles" => level.fg_tiles = text(),
                "bgtiles" => level.bg_tiles = text(),
                "objtiles" => level.obj_tiles = text(),
                "entities" => {
                    level.entities = child.children.iter().map(EntityInstance::from_element).collect();
                }
                "triggers" => {
                    level.triggers = child.children.iter().map(EntityInstance::from_element).collect();
                }
                other => {
                    tracing::debug!(level = %level.name, child = other, "skipping level child");
                }
            }
        }

        level.solids = TileMatrix::from_text(
            solids_text.as_deref().unwrap_or_default(),
            width / TILE_SIZE,
            height / TILE_SIZE,
        )?;

        Ok(level)
    }

    /// World position of the top-left tile, in tiles
    pub fn tile_origin(&self) -> (i32, i32) {
        (
            self.x.div_euclid(TILE_SIZE as i32),
            self.y.div_euclid(TILE_SIZE as i32),
        )
    }

    /// Whether the world pixel `(x, y)` lies inside this level
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let (x, y) = (x as i64, y as i64);
        x >= self.x as i64
            && y >= self.y as i64
            && x < self.x as i64 + self.width as i64
            && y < self.y as i64 + self.height as i64
    }

    pub fn spawn_points(&self) -> impl Iterator<Item = &EntityInstance> {
        self.entities.iter().filter(|e| e.is_spawn_point())
    }
}

fn int_attribute(element: &RawElement, attribute: &'static str) -> Result<i64, MapError> {
    let value = element
        .attribute(attribute)
        .ok_or_else(|| MapError::MissingAttribute {
            element: element.name.clone(),
            attribute,
        })?;
    value.as_int().ok_or_else(|| MapError::InvalidAttribute {
        element: element.name.clone(),
        attribute,
        expected: "integer",
        found: value.kind(),
    })
}

/// Narrow an integer attribute to the field's type
fn ranged_attribute<T: TryFrom<i64>>(
    element: &RawElement,
    attribute: &'static str,
    value: i64,
) -> Result<T, MapError> {
    T::try_from(value).map_err(|_| MapError::InvalidAttribute {
        element: element.name.clone(),
        attribute,
        expected: "integer in range",
        found: "out-of-range number",
    })
}
