//! Attribute value type carried by decoded map elements

use serde::{Deserialize, Serialize};

/// A single attribute value.
///
/// The variants mirror the primitive kinds the binary format can encode.
/// Lookup-table references, inline strings and run-length strings all decode
/// to [`Value::String`]; the encoding is a storage detail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    U8(u8),
    I16(i16),
    I32(i32),
    F32(f32),
    String(String),
}

impl Value {
    /// Get value as string reference
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get value as integer, widening any of the integer encodings.
    ///
    /// Floats with no fractional part are accepted too: level positions are
    /// occasionally stored as floats by older tools.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::U8(v) => Some(*v as i64),
            Value::I16(v) => Some(*v as i64),
            Value::I32(v) => Some(*v as i64),
            Value::F32(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    /// Get value as float
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::F32(f) => Some(*f),
            Value::U8(v) => Some(*v as f32),
            Value::I16(v) => Some(*v as f32),
            Value::I32(v) => Some(*v as f32),
            _ => None,
        }
    }

    /// Get value as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Name of the variant, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::U8(_) => "u8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::F32(_) => "f32",
            Value::String(_) => "string",
        }
    }
}

// Convenience conversions
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::I16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::F32(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
