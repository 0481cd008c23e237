//! Whole-map model built from a decoded element tree

use crate::{resolve_map_bounds, Bounds, Level, MapError, RawElement, Tile, TileSource, Value, TILE_SIZE};
use serde::{Deserialize, Serialize};

/// Map-level metadata from the `meta` element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapMeta {
    /// Level the player starts in, from `meta/mode@StartLevel`
    pub start_level: Option<String>,
}

impl MapMeta {
    pub fn from_element(element: &RawElement) -> Self {
        let start_level = element
            .child("mode")
            .and_then(|mode| mode.attribute("StartLevel"))
            .and_then(Value::as_string)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Self { start_level }
    }
}

/// A decoded map: its levels, metadata and world bounds.
///
/// Construction decodes every level and then computes the bounds, so a
/// `CelesteMap` is always ready for [`CelesteMap::autotile`].
#[derive(Debug, Clone)]
pub struct CelesteMap {
    pub name: String,
    pub package: String,
    pub levels: Vec<Level>,
    pub meta: MapMeta,
    bounds: Option<Bounds>,
}

impl CelesteMap {
    /// Build the map model from the decoder's root element
    pub fn from_element(root: &RawElement) -> Result<Self, MapError> {
        let mut levels = Vec::new();
        let mut meta = MapMeta::default();

        for child in &root.children {
            match child.name.as_str() {
                "levels" => {
                    for element in &child.children {
                        levels.push(Level::from_element(element)?);
                    }
                }
                "meta" => meta = MapMeta::from_element(child),
                other => tracing::debug!(child = other, "skipping map child"),
            }
        }

        Ok(Self::new(
            root.name.clone(),
            root.package.clone().unwrap_or_default(),
            levels,
            meta,
        ))
    }

    pub fn new(name: String, package: String, levels: Vec<Level>, meta: MapMeta) -> Self {
        let bounds = resolve_map_bounds(&levels);
        Self {
            name,
            package,
            levels,
            meta,
            bounds,
        }
    }

    /// Union of all level rectangles, `None` when the map has no levels
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn level(&self, name: &str) -> Option<&Level> {
        self.levels.iter().find(|l| l.name == name)
    }

    /// The level the player starts in.
    ///
    /// Uses the metadata when it names an existing level, otherwise the first
    /// level that holds a spawn point.
    pub fn start_level(&self) -> Option<&Level> {
        if let Some(name) = &self.meta.start_level {
            match self.level(name) {
                Some(level) => return Some(level),
                None => tracing::warn!(map = %self.name, start_level = %name, "start level not found"),
            }
        }
        self.levels.iter().find(|l| l.spawn_points().next().is_some())
    }

    /// Record neighborhoods for every solid tile of every level
    pub fn autotile(&self) {
        for level in &self.levels {
            level.solids.autotile(self, level);
        }
    }
}

impl TileSource for CelesteMap {
    fn tile_at(&self, tile_x: i32, tile_y: i32) -> Option<&Tile> {
        let size = TILE_SIZE as i32;
        let level = self.level_at(tile_x.checked_mul(size)?, tile_y.checked_mul(size)?)?;
        let (origin_x, origin_y) = level.tile_origin();
        level.solids.get(tile_x - origin_x, tile_y - origin_y)
    }

    fn level_at(&self, x: i32, y: i32) -> Option<&Level> {
        if !self.bounds?.contains(x, y) {
            return None;
        }
        self.levels.iter().find(|l| l.contains(x, y))
    }
}
