//! Solid tile grids and neighborhood snapshots
//!
//! A [`TileMatrix`] is built once per level from the level's `solids` text
//! block. After every level of a map exists and the map bounds are known,
//! [`TileMatrix::autotile`] records each solid tile's [`Adjacents`], reaching
//! into neighboring levels through a [`TileSource`] for tiles on the edge.

use std::sync::OnceLock;

use crate::{Level, MapError};

/// Pixel size of one tile.
pub const TILE_SIZE: u32 = 8;

/// Tile id of empty space (`'0'`).
pub const AIR_ID: u32 = '0' as u32;

/// Offsets of the distance-2 cardinal neighbors: top, left, right, bottom.
pub const OUTER_RING: [(i32, i32); 4] = [(0, -2), (-2, 0), (2, 0), (0, 2)];

static AIR: Tile = Tile::air();

/// World-level tile lookup used to resolve neighbors across level edges.
///
/// Coordinates passed to [`TileSource::tile_at`] are world tile coordinates
/// (pixels divided by [`TILE_SIZE`]); [`TileSource::level_at`] takes world
/// pixels.
pub trait TileSource {
    fn tile_at(&self, tile_x: i32, tile_y: i32) -> Option<&Tile>;

    fn level_at(&self, x: i32, y: i32) -> Option<&Level>;
}

/// One cell of a solid tile grid.
#[derive(Debug, Clone)]
pub struct Tile {
    id: u32,
    adjacents: OnceLock<Adjacents>,
}

impl Tile {
    pub const fn new(id: u32) -> Self {
        Self {
            id,
            adjacents: OnceLock::new(),
        }
    }

    /// A non-solid tile
    pub const fn air() -> Self {
        Self::new(AIR_ID)
    }

    pub fn from_char(c: char) -> Self {
        Self::new(c as u32)
    }

    /// Character code of the tile material
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn id_char(&self) -> char {
        char::from_u32(self.id).unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    pub fn is_solid(&self) -> bool {
        is_solid_id(self.id)
    }

    /// Neighborhood snapshot, present once the map has been autotiled
    pub fn adjacents(&self) -> Option<&Adjacents> {
        self.adjacents.get()
    }

    /// Attach the neighborhood snapshot. A tile is written at most once;
    /// a second call leaves the first snapshot in place and returns `false`.
    pub fn set_adjacents(&self, adjacents: Adjacents) -> bool {
        self.adjacents.set(adjacents).is_ok()
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::air()
    }
}

pub fn is_solid_id(id: u32) -> bool {
    id != AIR_ID
}

/// Snapshot of the tile ids around a solid tile.
///
/// The 3x3 block is row-major with the tile itself at index 4. The outer
/// ring holds the distance-2 cardinal neighbors in [`OUTER_RING`] order and
/// is only sampled when the whole 3x3 block is solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjacents {
    ids: [u32; 9],
    outer: Option<[u32; 4]>,
}

impl Adjacents {
    pub const CENTER: usize = 4;

    pub fn new(ids: [u32; 9], outer: Option<[u32; 4]>) -> Self {
        Self { ids, outer }
    }

    /// Tile id at offset `(dx, dy)`, each in `-1..=1`
    pub fn get(&self, dx: i32, dy: i32) -> Option<u32> {
        if !(-1..=1).contains(&dx) || !(-1..=1).contains(&dy) {
            return None;
        }
        Some(self.ids[((dy + 1) * 3 + dx + 1) as usize])
    }

    /// Tile id at row-major index `0..9`
    pub fn at(&self, index: usize) -> u32 {
        self.ids[index]
    }

    pub fn ids(&self) -> &[u32; 9] {
        &self.ids
    }

    pub fn center(&self) -> u32 {
        self.ids[Self::CENTER]
    }

    pub fn outer(&self) -> Option<&[u32; 4]> {
        self.outer.as_ref()
    }

    /// True when every cell of the 3x3 block is solid
    pub fn is_block_solid(&self) -> bool {
        self.ids.iter().all(|&id| is_solid_id(id))
    }
}

/// Grid of tiles for one level.
///
/// `width`/`height` are the dimensions of the encoded text grid;
/// `actual_width`/`actual_height` are the level's declared size in tiles.
/// Cells inside the declared size but past the encoded grid read as air.
#[derive(Debug, Clone, Default)]
pub struct TileMatrix {
    tiles: Vec<Tile>,
    width: u32,
    height: u32,
    actual_width: u32,
    actual_height: u32,
}

impl TileMatrix {
    /// Build a grid from a `solids` text block.
    ///
    /// Rows are separated by `\n` (CRLF is normalized first) and padded on
    /// the right with `'0'` up to the longest row. A trailing newline does
    /// not start an extra row.
    pub fn from_text(text: &str, actual_width: u32, actual_height: u32) -> Result<Self, MapError> {
        let text = text.replace("\r\n", "\n");
        let rows: Vec<&str> = text.lines().collect();

        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
        let height = rows.len() as u32;

        if width > actual_width || height > actual_height {
            return Err(MapError::GridExceedsLevel {
                grid: (width, height),
                declared: (actual_width, actual_height),
            });
        }

        let cells = width
            .checked_mul(height)
            .ok_or(MapError::GridTooLarge { grid: (width, height) })?;

        let mut tiles = Vec::with_capacity(cells as usize);
        for row in rows {
            let mut len = 0;
            for c in row.chars() {
                tiles.push(Tile::from_char(c));
                len += 1;
            }
            for _ in len..width {
                tiles.push(Tile::air());
            }
        }

        Ok(Self {
            tiles,
            width,
            height,
            actual_width,
            actual_height,
        })
    }

    /// Width of the encoded grid
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the encoded grid
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn actual_width(&self) -> u32 {
        self.actual_width
    }

    pub fn actual_height(&self) -> u32 {
        self.actual_height
    }

    /// Tile at local coordinates.
    ///
    /// `None` means the position lies outside this level; the caller has to
    /// resolve it through the owning map instead of assuming air.
    pub fn get(&self, x: i32, y: i32) -> Option<&Tile> {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return None;
        };
        if x >= self.actual_width || y >= self.actual_height {
            return None;
        }
        if x >= self.width || y >= self.height {
            return Some(&AIR);
        }
        self.tiles.get(y as usize * self.width as usize + x as usize)
    }

    /// Iterate `(x, y, tile)` over the encoded grid in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &Tile)> {
        let width = self.width.max(1) as usize;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, t)| ((i % width) as u32, (i / width) as u32, t))
    }

    /// One encoded row as text
    pub fn row_text(&self, y: u32) -> Option<String> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.width as usize;
        let end = start + self.width as usize;
        Some(self.tiles[start..end].iter().map(Tile::id_char).collect())
    }

    pub fn solid_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_solid()).count()
    }

    /// Record the neighborhood of every solid tile.
    ///
    /// Must run after every level of `map` exists and the map bounds are
    /// known. Positions outside this grid's declared size are looked up in
    /// world space through `map`; positions no level covers read as air.
    pub fn autotile<M: TileSource + ?Sized>(&self, map: &M, level: &Level) {
        let (origin_x, origin_y) = level.tile_origin();

        let sample = |x: i32, y: i32| -> u32 {
            match self.get(x, y) {
                Some(tile) => tile.id(),
                None => map
                    .tile_at(origin_x + x, origin_y + y)
                    .map_or(AIR_ID, Tile::id),
            }
        };

        for (x, y, tile) in self.iter() {
            if !tile.is_solid() || tile.adjacents().is_some() {
                continue;
            }
            let (x, y) = (x as i32, y as i32);

            let mut ids = [AIR_ID; 9];
            for dy in -1..=1 {
                for dx in -1..=1 {
                    ids[((dy + 1) * 3 + dx + 1) as usize] = sample(x + dx, y + dy);
                }
            }

            let outer = if ids.iter().all(|&id| is_solid_id(id)) {
                Some(OUTER_RING.map(|(dx, dy)| sample(x + dx, y + dy)))
            } else {
                None
            };

            tile.set_adjacents(Adjacents::new(ids, outer));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoNeighbors;

    impl TileSource for NoNeighbors {
        fn tile_at(&self, _tile_x: i32, _tile_y: i32) -> Option<&Tile> {
            None
        }

        fn level_at(&self, _x: i32, _y: i32) -> Option<&Level> {
            None
        }
    }

    fn level(name: &str, solids: &str, width_tiles: u32, height_tiles: u32) -> Level {
        Level::new(
            name.to_string(),
            0,
            0,
            width_tiles * TILE_SIZE,
            height_tiles * TILE_SIZE,
            TileMatrix::from_text(solids, width_tiles, height_tiles).unwrap(),
        )
    }

    #[test]
    fn test_rows_are_padded_with_air() {
        let matrix = TileMatrix::from_text("01\n0\n", 2, 2).unwrap();

        assert_eq!(matrix.width(), 2);
        assert_eq!(matrix.height(), 2);
        assert_eq!(matrix.row_text(0).as_deref(), Some("01"));
        assert_eq!(matrix.row_text(1).as_deref(), Some("00"));
        assert!(!matrix.get(1, 1).unwrap().is_solid());
        assert!(matrix.get(1, 0).unwrap().is_solid());
    }

    #[test]
    fn test_crlf_is_normalized() {
        let matrix = TileMatrix::from_text("11\r\n1\r\n", 2, 2).unwrap();
        assert_eq!(matrix.row_text(0).as_deref(), Some("11"));
        assert_eq!(matrix.row_text(1).as_deref(), Some("10"));
    }

    #[test]
    fn test_get_distinguishes_outside_from_air() {
        let matrix = TileMatrix::from_text("1", 3, 2).unwrap();

        // Past the encoded grid but inside the level
        let tile = matrix.get(2, 1).expect("inside declared size");
        assert!(!tile.is_solid());

        // Outside the level entirely
        assert!(matrix.get(3, 0).is_none());
        assert!(matrix.get(-1, 0).is_none());
        assert!(matrix.get(0, 2).is_none());
    }

    #[test]
    fn test_grid_larger_than_level_is_rejected() {
        let err = TileMatrix::from_text("111\n111", 2, 2).unwrap_err();
        assert!(matches!(
            err,
            MapError::GridExceedsLevel {
                grid: (3, 2),
                declared: (2, 2)
            }
        ));
    }

    #[test]
    fn test_unaddressable_grid_is_rejected() {
        let mut text = "0".repeat(65_536);
        text.push('\n');
        text.push_str(&"0\n".repeat(65_536));

        let err = TileMatrix::from_text(&text, 65_536, 65_537).unwrap_err();
        assert_eq!(err, MapError::GridTooLarge { grid: (65_536, 65_537) });
    }

    #[test]
    fn test_get_far_outside_declared_size() {
        let matrix = TileMatrix::from_text("1", u32::MAX, 1).unwrap();
        assert!(!matrix.get(i32::MAX, 0).unwrap().is_solid());
        assert!(matrix.get(i32::MIN, 0).is_none());
    }

    #[test]
    fn test_empty_text_is_all_air() {
        let matrix = TileMatrix::from_text("", 4, 4).unwrap();
        assert_eq!(matrix.width(), 0);
        assert!(!matrix.get(3, 3).unwrap().is_solid());
    }

    #[test]
    fn test_adjacents_offsets() {
        let mut ids = [AIR_ID; 9];
        ids[0] = '1' as u32;
        ids[5] = '3' as u32;
        let adjacents = Adjacents::new(ids, None);

        assert_eq!(adjacents.get(-1, -1), Some('1' as u32));
        assert_eq!(adjacents.get(1, 0), Some('3' as u32));
        assert_eq!(adjacents.get(2, 0), None);
        assert!(!adjacents.is_block_solid());
    }

    #[test]
    fn test_autotile_samples_only_solid_tiles() {
        let level = level("a", "010\n111\n010", 3, 3);
        level.solids.autotile(&NoNeighbors, &level);

        assert!(level.solids.get(0, 0).unwrap().adjacents().is_none());

        let center = level.solids.get(1, 1).unwrap().adjacents().unwrap();
        assert_eq!(center.get(0, -1), Some('1' as u32));
        assert_eq!(center.get(-1, -1), Some(AIR_ID));
        assert!(center.outer().is_none());

        // Edge tile: neighbors outside the level read as air
        let top = level.solids.get(1, 0).unwrap().adjacents().unwrap();
        assert_eq!(top.get(0, -1), Some(AIR_ID));
    }

    #[test]
    fn test_autotile_outer_ring_only_for_solid_blocks() {
        let level = level("a", "11111\n11111\n11111\n11111\n11110", 5, 5);
        level.solids.autotile(&NoNeighbors, &level);

        let center = level.solids.get(2, 2).unwrap().adjacents().unwrap();
        let ring = center.outer().expect("3x3 is solid");
        assert!(ring.iter().all(|&id| is_solid_id(id)));

        let corner = level.solids.get(3, 3).unwrap().adjacents().unwrap();
        assert!(corner.outer().is_none(), "bottom-right neighbor is air");
    }

    #[test]
    fn test_adjacents_are_written_once() {
        let tile = Tile::from_char('1');
        assert!(tile.set_adjacents(Adjacents::new(['1' as u32; 9], None)));
        assert!(!tile.set_adjacents(Adjacents::new([AIR_ID; 9], None)));
        assert_eq!(tile.adjacents().unwrap().center(), '1' as u32);
    }
}
