//! Load pipeline: bytes → element tree → map model → neighborhoods
//!
//! The map is fully built before autotiling so neighbor lookups can cross
//! into any level.
//!
//! # Example
//!
//! ```rust,no_run
//! use celeste_map::{load_map_from_path, load_rulesets, resolve_map, AutotileSettings};
//!
//! # fn main() -> Result<(), celeste_map::MapLoadError> {
//! let map = load_map_from_path("Maps/1-ForsakenCity.bin")?;
//! let rulesets = load_rulesets("rulesets.json")?;
//! let settings = AutotileSettings::load("autotile.toml")?;
//!
//! for level in resolve_map(&map, &rulesets, &settings) {
//!     println!("{}: {} tiles", level.name, level.tiles.len());
//! }
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use celeste_map_autotile::{resolve_level, AutotileSettings, ResolvedTile, RuleSetTable, RulesetError, SettingsError};
use celeste_map_binary::{decode_map, DecodeError};
use celeste_map_core::{CelesteMap, MapError};
use thiserror::Error;

/// Error type for map loading failures
#[derive(Debug, Error)]
pub enum MapLoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to decode map: {0}")]
    Decode(#[from] DecodeError),
    #[error("Invalid map: {0}")]
    Map(#[from] MapError),
    #[error("Failed to load rulesets: {0}")]
    Ruleset(#[from] RulesetError),
    #[error("Failed to load autotile settings: {0}")]
    Settings(#[from] SettingsError),
}

/// Decode, build and autotile a map held in memory
pub fn load_map_from_bytes(bytes: &[u8]) -> Result<CelesteMap, MapLoadError> {
    let root = decode_map(bytes)?;
    let map = CelesteMap::from_element(&root)?;
    map.autotile();

    tracing::info!(
        package = %map.package,
        levels = map.levels.len(),
        start_level = map.start_level().map(|l| l.name.as_str()).unwrap_or("<none>"),
        "loaded map"
    );
    Ok(map)
}

pub fn load_map_from_path(path: impl AsRef<Path>) -> Result<CelesteMap, MapLoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| MapLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_map_from_bytes(&bytes)
}

/// Ruleset table from a JSON description file
pub fn load_rulesets(path: impl AsRef<Path>) -> Result<RuleSetTable, MapLoadError> {
    Ok(celeste_map_autotile::load_rulesets(path)?)
}

/// Resolved tiles of one level
#[derive(Debug, Clone)]
pub struct LevelTiles<'a> {
    pub name: &'a str,
    pub tiles: Vec<ResolvedTile<'a>>,
}

/// Resolve every level of an autotiled map, in file order
pub fn resolve_map<'a>(
    map: &'a CelesteMap,
    table: &'a RuleSetTable,
    settings: &'a AutotileSettings,
) -> Vec<LevelTiles<'a>> {
    map.levels
        .iter()
        .map(|level| LevelTiles {
            name: level.name.as_str(),
            tiles: resolve_level(table, level, settings),
        })
        .collect()
}
