//! Core data structures for celeste_map
//!
//! This crate provides the plain-data model of a decoded map:
//! - `RawElement` - The generic attributed tree the binary decoder produces
//! - `Value` - Typed attribute value
//! - `CelesteMap` / `Level` - The map model built from that tree
//! - `TileMatrix` / `Tile` / `Adjacents` - Solid tile grids and neighborhoods
//! - `Bounds` - World-space bounding boxes
//!
//! It has no rendering dependency.

mod bounds;
mod element;
mod entity;
mod error;
mod level;
mod map;
mod tile;
mod value;

pub use bounds::{resolve_map_bounds, Bounds};
pub use element::{Attributes, RawElement, INNER_TEXT_ATTRIBUTE};
pub use entity::{EntityInstance, SPAWN_POINT};
pub use error::MapError;
pub use level::Level;
pub use map::{CelesteMap, MapMeta};
pub use tile::{is_solid_id, Adjacents, Tile, TileMatrix, TileSource, AIR_ID, OUTER_RING, TILE_SIZE};
pub use value::Value;
