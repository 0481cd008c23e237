//! Rule-based autotiling for Celeste tile grids
//!
//! Every solid tile has its 3×3 neighborhood recorded by
//! [`celeste_map_core::TileMatrix::autotile`]. This crate matches those
//! neighborhoods against per-material rulesets to pick an atlas cell.
//!
//! - [`Mask`] - 9-cell neighborhood pattern, or `center`/`padding`
//! - [`RuleSet`] - ordered rules for one tile id; first match wins
//! - [`RuleSetTable`] - rulesets built from a JSON description
//! - [`resolve_level`] - atlas cells for a whole level, with fallbacks
//!
//! # Example
//!
//! ```rust
//! use celeste_map_autotile::{parse_rulesets, resolve_level, AutotileSettings};
//! use celeste_map_core::{CelesteMap, Level, MapMeta, TileMatrix};
//!
//! let table = parse_rulesets(r#"[
//!     { "id": "1", "rules": [{ "mask": "xxx-x1x-xxx", "tiles": [[0, 0]] }] }
//! ]"#).unwrap();
//!
//! let solids = TileMatrix::from_text("11\n", 2, 1).unwrap();
//! let level = Level::new("a-00".to_string(), 0, 0, 16, 8, solids);
//! let map = CelesteMap::new("Demo".into(), "Demo".into(), vec![level], MapMeta::default());
//! map.autotile();
//!
//! let settings = AutotileSettings::default();
//! let tiles = resolve_level(&table, &map.levels[0], &settings);
//! assert_eq!(tiles.len(), 2);
//! assert_eq!(tiles[0].atlas_path, "dirt");
//! ```

pub mod config;
mod error;
pub mod mask;
pub mod resolve;
pub mod ruleset;
pub mod table;

pub use config::{AutotileSettings, VariantSelection};
pub use error::{MaskError, RulesetError, SettingsError};
pub use mask::{Mask, MaskCell};
pub use resolve::{resolve_level, resolve_tile, tile_rng, tile_seed, ResolvedTile};
pub use ruleset::{AtlasCoord, Ignores, Rule, RuleSet};
pub use table::{
    load_rulesets, load_rulesets_from_bytes, parse_rulesets, vanilla_tileset_name, RuleDescription,
    RuleSetTable, TilesetDescription,
};
