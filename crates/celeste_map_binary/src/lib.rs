//! Reader and writer for Celeste's binary map format.
//!
//! A map file is a header, a package name, a string lookup table and a
//! tree of named elements carrying typed attributes. [`decode_map`] turns
//! the bytes into a [`RawElement`] tree; [`encode_map`] does the reverse.
//!
//! ```
//! use celeste_map_binary::{decode_map, encode_map};
//! use celeste_map_core::RawElement;
//!
//! let tree = RawElement::new("Map").with_child(RawElement::new("levels"));
//! let bytes = encode_map(&tree, Some("Example")).unwrap();
//! let decoded = decode_map(&bytes).unwrap();
//! assert_eq!(decoded.children[0].name, "levels");
//! ```

mod cursor;
mod error;
pub mod reader;
pub mod writer;

pub use celeste_map_core::RawElement;
pub use cursor::ByteCursor;
pub use error::DecodeError;
pub use reader::{decode_map, MapBinReader, HEADER};
pub use writer::{encode_map, EncodeError, MapBinWriter};
