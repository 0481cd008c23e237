//! Celeste map decoding and autotiling
//!
//! This crate re-exports the workspace crates and adds the load pipeline:
//!
//! - [`model`] - element tree, map model, tile grids
//! - [`binary`] - binary map reader and writer
//! - [`autotile`] - rulesets and atlas resolution
//!
//! Library code only emits `tracing` events; install a subscriber to see
//! them.

mod loader;

pub use celeste_map_autotile as autotile;
pub use celeste_map_binary as binary;
pub use celeste_map_core as model;

pub use loader::{load_map_from_bytes, load_map_from_path, load_rulesets, resolve_map, LevelTiles, MapLoadError};

pub use celeste_map_autotile::{AutotileSettings, ResolvedTile, RuleSet, RuleSetTable, VariantSelection};
pub use celeste_map_binary::{decode_map, encode_map, DecodeError};
pub use celeste_map_core::{CelesteMap, EntityInstance, Level, RawElement, Tile, TileMatrix, Value};

/// Common imports
pub mod prelude {
    pub use crate::{
        load_map_from_bytes, load_map_from_path, load_rulesets, resolve_map, AutotileSettings, CelesteMap,
        Level, MapLoadError, RuleSetTable,
    };
}
