//! Autotile settings, loaded from TOML

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{AtlasCoord, SettingsError};

/// How a rule's candidate cell is picked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantSelection {
    /// Seeded from the tile's level and position; stable across passes
    #[default]
    Seeded,
    /// Fresh randomness on every pass
    Random,
}

/// Fallbacks and variant selection for a resolution pass.
///
/// ```toml
/// fallback_tileset = "1"
/// missing_atlas_path = "missing"
/// missing_coord = [0, 0]
/// variant_selection = "seeded"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutotileSettings {
    /// Ruleset used for tile ids that have none
    pub fallback_tileset: Option<char>,
    pub missing_atlas_path: String,
    /// Atlas cell used when no rule matches
    pub missing_coord: [u32; 2],
    pub variant_selection: VariantSelection,
}

impl Default for AutotileSettings {
    fn default() -> Self {
        Self {
            fallback_tileset: None,
            missing_atlas_path: "missing".to_string(),
            missing_coord: [0, 0],
            variant_selection: VariantSelection::Seeded,
        }
    }
}

impl AutotileSettings {
    pub fn from_toml_str(s: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn missing_coord(&self) -> AtlasCoord {
        (self.missing_coord[0], self.missing_coord[1])
    }
}
