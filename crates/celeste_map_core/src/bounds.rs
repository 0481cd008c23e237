//! World-space bounding boxes

use crate::Level;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in world pixels; `right`/`bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_rect(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self::new(
            x,
            y,
            x.saturating_add_unsigned(width),
            y.saturating_add_unsigned(height),
        )
    }

    /// Rectangle covered by a level
    pub fn of_level(level: &Level) -> Self {
        Self::from_rect(level.x, level.y, level.width, level.height)
    }

    pub fn width(&self) -> u32 {
        self.right.abs_diff(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.abs_diff(self.top)
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

/// Union of every level rectangle, or `None` for a map without levels
pub fn resolve_map_bounds<'a>(levels: impl IntoIterator<Item = &'a Level>) -> Option<Bounds> {
    levels
        .into_iter()
        .map(Bounds::of_level)
        .reduce(|acc, b| acc.union(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TileMatrix;

    fn level(x: i32, y: i32, width: u32, height: u32) -> Level {
        Level::new("l".to_string(), x, y, width, height, TileMatrix::default())
    }

    #[test]
    fn test_union_of_levels() {
        let levels = vec![level(0, 0, 320, 184), level(-80, 200, 40, 40), level(320, -16, 8, 8)];
        let bounds = resolve_map_bounds(&levels).unwrap();

        assert_eq!(bounds, Bounds::new(-80, -16, 328, 240));
        assert_eq!(bounds.width(), 408);
        assert_eq!(bounds.height(), 256);
    }

    #[test]
    fn test_union_does_not_include_origin() {
        let levels = vec![level(100, 100, 8, 8)];
        let bounds = resolve_map_bounds(&levels).unwrap();
        assert_eq!(bounds, Bounds::new(100, 100, 108, 108));
        assert!(!bounds.contains(0, 0));
    }

    #[test]
    fn test_no_levels_no_bounds() {
        assert_eq!(resolve_map_bounds(&Vec::<Level>::new()), None);
    }
}
