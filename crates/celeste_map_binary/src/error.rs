use thiserror::Error;

/// Fatal decoding failures. Decoding never returns a partial tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The leading string is not the map header
    #[error("invalid map header: expected \"CELESTE MAP\", found {found:?}")]
    Format { found: String },
    #[error("read of {needed} byte(s) at offset {offset} runs past the end of the buffer ({available} left)")]
    TruncatedData {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("unsupported value type tag {tag} at offset {offset}")]
    UnsupportedValueType { tag: u8, offset: usize },
    #[error("lookup index {index} is out of range for a table of {len} strings")]
    InvalidLookupIndex { index: u16, len: usize },
    #[error("variable-length integer at offset {offset} does not fit in 64 bits")]
    MalformedVarInt { offset: usize },
}
