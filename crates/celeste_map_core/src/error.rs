use thiserror::Error;

/// Errors raised while turning a decoded element tree into a map model
#[derive(Debug, Error, PartialEq)]
pub enum MapError {
    #[error("element '{element}' is missing attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },
    #[error("attribute '{attribute}' on '{element}' should be {expected}, found {found}")]
    InvalidAttribute {
        element: String,
        attribute: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("tile grid {grid:?} is larger than the level's declared size {declared:?}")]
    GridExceedsLevel { grid: (u32, u32), declared: (u32, u32) },
    #[error("tile grid {grid:?} has more cells than can be addressed")]
    GridTooLarge { grid: (u32, u32) },
    #[error("level '{level}': {source}")]
    InLevel {
        level: String,
        #[source]
        source: Box<MapError>,
    },
}

impl MapError {
    /// Attach the name of the level being built
    pub fn in_level(self, level: &str) -> Self {
        MapError::InLevel {
            level: level.to_string(),
            source: Box::new(self),
        }
    }
}
