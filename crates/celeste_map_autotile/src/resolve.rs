//! Resolution pass: atlas cells for every solid tile of a level

use std::collections::HashSet;

use celeste_map_core::{Level, Tile};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use xxhash_rust::xxh32::xxh32;

use crate::{AtlasCoord, AutotileSettings, RuleSetTable, VariantSelection};

const TILE_SEED: u32 = 0x4345_4c45;

/// Where a solid tile's art comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTile<'a> {
    /// Position in the level's grid, in tiles
    pub x: u32,
    pub y: u32,
    pub id: char,
    pub atlas_path: &'a str,
    pub coord: AtlasCoord,
    /// False when a fallback supplied the cell
    pub matched: bool,
}

/// Seed identifying one tile instance
pub fn tile_seed(level_name: &str, x: u32, y: u32) -> u64 {
    let mut bytes = Vec::with_capacity(level_name.len() + 8);
    bytes.extend_from_slice(level_name.as_bytes());
    bytes.extend_from_slice(&x.to_le_bytes());
    bytes.extend_from_slice(&y.to_le_bytes());
    u64::from(xxh32(&bytes, TILE_SEED))
}

/// Deterministic RNG for one tile instance
pub fn tile_rng(level_name: &str, x: u32, y: u32) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(tile_seed(level_name, x, y))
}

/// Pick an atlas cell for every solid tile of `level`.
///
/// The level must have been autotiled. Tile ids without a ruleset use
/// `settings.fallback_tileset`, then the missing atlas; tiles no rule
/// matches use `settings.missing_coord` in the missing atlas. Neither
/// fallback is an error.
pub fn resolve_level<'a>(
    table: &'a RuleSetTable,
    level: &Level,
    settings: &'a AutotileSettings,
) -> Vec<ResolvedTile<'a>> {
    let mut unmatched_ids: HashSet<char> = HashSet::new();
    let mut entropy = match settings.variant_selection {
        VariantSelection::Random => Some(SmallRng::from_entropy()),
        VariantSelection::Seeded => None,
    };
    let missing = |x, y, id| ResolvedTile {
        x,
        y,
        id,
        atlas_path: settings.missing_atlas_path.as_str(),
        coord: settings.missing_coord(),
        matched: false,
    };

    let mut resolved = Vec::new();
    for (x, y, tile) in level.solids.iter() {
        if !tile.is_solid() {
            continue;
        }
        let id = tile.id_char();

        if !table.contains(id) && unmatched_ids.insert(id) {
            tracing::warn!(level = %level.name, tile_id = %id, "no ruleset for tile id, using fallback");
        }
        let Some(set) = table.get_or_fallback(id, settings.fallback_tileset) else {
            resolved.push(missing(x, y, id));
            continue;
        };

        let coord = match entropy.as_mut() {
            Some(rng) => set.match_tile(tile, rng),
            None => set.match_tile(tile, &mut tile_rng(&level.name, x, y)),
        };

        match coord {
            Some(coord) => resolved.push(ResolvedTile {
                x,
                y,
                id,
                atlas_path: set.atlas_path.as_str(),
                coord,
                matched: true,
            }),
            None => {
                tracing::debug!(level = %level.name, x, y, tile_id = %id, "no rule matches tile");
                resolved.push(missing(x, y, id));
            }
        }
    }

    resolved
}

/// Resolve a single tile with the seeded variant choice
pub fn resolve_tile<'a>(
    table: &'a RuleSetTable,
    tile: &Tile,
    level_name: &str,
    x: u32,
    y: u32,
    settings: &AutotileSettings,
) -> Option<(&'a str, AtlasCoord)> {
    let set = table.get_or_fallback(tile.id_char(), settings.fallback_tileset)?;
    let coord = set.match_tile(tile, &mut tile_rng(level_name, x, y))?;
    Some((set.atlas_path.as_str(), coord))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_rulesets;
    use celeste_map_core::{CelesteMap, MapMeta, TileMatrix};

    const RULES: &str = r#"[
        {
            "id": "1",
            "rules": [
                { "mask": "x0x-x1x-xxx", "tiles": [[0, 0], [1, 0], [2, 0], [3, 0]] },
                { "mask": "center", "tiles": [[5, 5]] },
                { "mask": "padding", "tiles": [[6, 6]] }
            ]
        },
        { "id": "3", "copy": "1" }
    ]"#;

    fn map_with(text: &str, width_tiles: u32, height_tiles: u32) -> CelesteMap {
        let solids = TileMatrix::from_text(text, width_tiles, height_tiles).unwrap();
        let level = Level::new("a-00".to_string(), 0, 0, width_tiles * 8, height_tiles * 8, solids);
        let map = CelesteMap::new("Test".to_string(), "Test".to_string(), vec![level], MapMeta::default());
        map.autotile();
        map
    }

    #[test]
    fn test_seed_depends_on_identity() {
        assert_eq!(tile_seed("a-00", 3, 4), tile_seed("a-00", 3, 4));
        assert_ne!(tile_seed("a-00", 3, 4), tile_seed("a-00", 4, 3));
        assert_ne!(tile_seed("a-00", 3, 4), tile_seed("a-01", 3, 4));
    }

    #[test]
    fn test_resolves_top_edge_and_fallbacks() {
        let table = parse_rulesets(RULES).unwrap();
        let settings = AutotileSettings::default();
        // Row 0 is the top edge; the '1' under it has solid above.
        let map = map_with("1110\n111q\n", 4, 2);
        let resolved = resolve_level(&table, &map.levels[0], &settings);

        assert_eq!(resolved.len(), 7);

        let top = resolved.iter().find(|t| (t.x, t.y) == (1, 0)).unwrap();
        assert!(top.matched);
        assert_eq!(top.atlas_path, "dirt");
        assert!(top.coord.1 == 0 && top.coord.0 < 4);

        // Solid above and air at the map edge below: nothing matches
        let below = resolved.iter().find(|t| (t.x, t.y) == (1, 1)).unwrap();
        assert!(!below.matched);
        assert_eq!(below.atlas_path, "missing");
        assert_eq!(below.coord, (0, 0));

        let unknown = resolved.iter().find(|t| t.id == 'q').unwrap();
        assert!(!unknown.matched);
        assert_eq!(unknown.atlas_path, "missing");
    }

    #[test]
    fn test_fallback_tileset_is_used() {
        let table = parse_rulesets(RULES).unwrap();
        let settings = AutotileSettings {
            fallback_tileset: Some('1'),
            missing_coord: [7, 7],
            ..AutotileSettings::default()
        };
        let map = map_with("q\n", 1, 1);
        let resolved = resolve_level(&table, &map.levels[0], &settings);

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, 'q');
        assert_eq!(resolved[0].atlas_path, "dirt");
        assert!(resolved[0].matched);
    }

    #[test]
    fn test_fallback_keeps_own_material_solid() {
        let table = parse_rulesets(
            r#"[{ "id": "1", "ignores": "*", "rules": [{ "mask": "xxx-111-xxx", "tiles": [[4, 1]] }] }]"#,
        )
        .unwrap();
        let settings = AutotileSettings {
            fallback_tileset: Some('1'),
            ..AutotileSettings::default()
        };
        let map = map_with("qqq\n", 3, 1);
        let resolved = resolve_level(&table, &map.levels[0], &settings);

        let middle = resolved.iter().find(|t| (t.x, t.y) == (1, 0)).unwrap();
        assert_eq!(middle.id, 'q');
        assert!(middle.matched);
        assert_eq!(middle.atlas_path, "dirt");
        assert_eq!(middle.coord, (4, 1));

        // Left edge: nothing beyond the only level
        let edge = resolved.iter().find(|t| (t.x, t.y) == (0, 0)).unwrap();
        assert!(!edge.matched);
    }

    #[test]
    fn test_center_and_padding_in_level() {
        let table = parse_rulesets(RULES).unwrap();
        let settings = AutotileSettings::default();
        let text = "01110\n11111\n11111\n11111\n11111\n";
        let map = map_with(text, 5, 5);
        let resolved = resolve_level(&table, &map.levels[0], &settings);
        let at = |x, y| resolved.iter().find(|t| (t.x, t.y) == (x, y)).unwrap().coord;

        // (2,2): ring reaches (2,0) solid, (0,2), (4,2), (2,4) solid
        assert_eq!(at(2, 2), (5, 5));
        // (2,3): ring below lands outside the only level, read as air
        assert_eq!(at(2, 3), (6, 6));
    }

    #[test]
    fn test_seeded_selection_is_stable() {
        let table = parse_rulesets(RULES).unwrap();
        let settings = AutotileSettings::default();
        let map = map_with("1111111111\n", 10, 1);

        let first = resolve_level(&table, &map.levels[0], &settings);
        let second = resolve_level(&table, &map.levels[0], &settings);
        assert_eq!(first, second);

        let tile = map.levels[0].solids.get(4, 0).unwrap();
        let single = resolve_tile(&table, tile, "a-00", 4, 0, &settings).unwrap();
        assert_eq!(single, (first[4].atlas_path, first[4].coord));
    }

    #[test]
    fn test_copied_ruleset_resolves_with_own_atlas() {
        let table = parse_rulesets(RULES).unwrap();
        let settings = AutotileSettings::default();
        let map = map_with("3\n", 1, 1);
        let resolved = resolve_level(&table, &map.levels[0], &settings);

        assert_eq!(resolved[0].atlas_path, "snow");
        assert!(resolved[0].matched);
    }

    #[test]
    fn test_random_selection_stays_within_candidates() {
        let table = parse_rulesets(RULES).unwrap();
        let settings = AutotileSettings {
            variant_selection: VariantSelection::Random,
            ..AutotileSettings::default()
        };
        let map = map_with("1111\n", 4, 1);
        for tile in resolve_level(&table, &map.levels[0], &settings) {
            assert!(tile.matched);
            assert_eq!(tile.coord.1, 0);
            assert!(tile.coord.0 < 4);
        }
    }
}
