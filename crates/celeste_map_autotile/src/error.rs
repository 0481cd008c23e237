use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading ruleset descriptions
#[derive(Debug, Error)]
pub enum RulesetError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tileset id {0:?} must be a single character")]
    InvalidId(String),
    #[error("tileset {0:?} is declared more than once")]
    DuplicateId(char),
    #[error("tileset {id:?} copies {copy:?}, which is not declared before it")]
    UnknownCopy { id: char, copy: String },
    #[error("tileset {0:?} declares both `copy` and its own rules")]
    CopyWithRules(char),
    #[error("tileset {id:?} has an invalid ignore entry {entry:?}")]
    InvalidIgnore { id: char, entry: String },
    #[error("tileset {id:?} has an invalid mask {mask:?}: {reason}")]
    InvalidMask {
        id: char,
        mask: String,
        reason: MaskError,
    },
    #[error("tileset {id:?} rule {mask:?} has no candidate tiles")]
    EmptyRule { id: char, mask: String },
}

/// Why a mask string was rejected
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MaskError {
    #[error("expected 9 cells, found {0}")]
    Length(usize),
    #[error("unexpected cell {0:?}, expected '0', '1' or 'x'")]
    Cell(char),
}

/// Errors raised while loading [`crate::AutotileSettings`]
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
