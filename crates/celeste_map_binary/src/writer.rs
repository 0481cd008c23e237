//! Binary map encoder, the inverse of [`crate::reader`].

use std::collections::HashMap;

use celeste_map_core::{RawElement, Value, INNER_TEXT_ATTRIBUTE};
use thiserror::Error;

use crate::reader::{tags, HEADER};

/// Reasons a tree cannot be represented in the binary format
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("more than {} distinct names and strings", u16::MAX)]
    LookupTableFull,
    #[error("element {element:?} has {count} attributes (max {})", u8::MAX)]
    TooManyAttributes { element: String, count: usize },
    #[error("element {element:?} has {count} children (max {})", u16::MAX)]
    TooManyChildren { element: String, count: usize },
    #[error("character {0:?} cannot be stored in a single byte")]
    UnencodableChar(char),
}

/// Encode a tree into map file bytes.
///
/// `package` falls back to the root's recorded package, then to an empty
/// string.
pub fn encode_map(root: &RawElement, package: Option<&str>) -> Result<Vec<u8>, EncodeError> {
    let package = package.or(root.package.as_deref()).unwrap_or_default();
    MapBinWriter::new().encode(root, package)
}

/// Encoder state: output buffer and string interning table.
///
/// Element names, attribute names and string values are interned. Inner
/// text is written run-length encoded when that is shorter, inline
/// otherwise.
#[derive(Debug, Default)]
pub struct MapBinWriter {
    out: Vec<u8>,
    lookup: Vec<String>,
    indices: HashMap<String, u16>,
}

impl MapBinWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode(mut self, root: &RawElement, package: &str) -> Result<Vec<u8>, EncodeError> {
        self.collect_strings(root)?;

        self.write_string(HEADER)?;
        self.write_string(package)?;
        // collect_strings caps the table at u16::MAX entries
        self.write_u16(self.lookup.len() as u16);
        for entry in std::mem::take(&mut self.lookup) {
            self.write_string(&entry)?;
        }

        self.write_tree(root)?;
        Ok(self.out)
    }

    fn intern(&mut self, s: &str) -> Result<(), EncodeError> {
        if self.indices.contains_key(s) {
            return Ok(());
        }
        let index = u16::try_from(self.lookup.len()).map_err(|_| EncodeError::LookupTableFull)?;
        self.lookup.push(s.to_string());
        self.indices.insert(s.to_string(), index);
        Ok(())
    }

    fn collect_strings(&mut self, root: &RawElement) -> Result<(), EncodeError> {
        let mut pending = vec![root];
        while let Some(element) = pending.pop() {
            self.intern(&element.name)?;
            for (key, value) in element.attributes.iter() {
                self.intern(key)?;
                if let Value::String(s) = value {
                    self.intern(s)?;
                }
            }
            if element.inner_text.is_some() {
                self.intern(INNER_TEXT_ATTRIBUTE)?;
            }
            pending.extend(element.children.iter().rev());
        }
        Ok(())
    }

    /// Pre-order, each child's subtree before the next sibling
    fn write_tree(&mut self, root: &RawElement) -> Result<(), EncodeError> {
        let mut pending = vec![root];
        while let Some(element) = pending.pop() {
            self.write_element(element)?;
            pending.extend(element.children.iter().rev());
        }
        Ok(())
    }

    fn write_element(&mut self, element: &RawElement) -> Result<(), EncodeError> {
        let attribute_count = element.attributes.len() + usize::from(element.inner_text.is_some());
        let attribute_count = u8::try_from(attribute_count).map_err(|_| EncodeError::TooManyAttributes {
            element: element.name.clone(),
            count: attribute_count,
        })?;
        let child_count = u16::try_from(element.children.len()).map_err(|_| EncodeError::TooManyChildren {
            element: element.name.clone(),
            count: element.children.len(),
        })?;

        self.write_lookup(&element.name);
        self.out.push(attribute_count);

        for (key, value) in element.attributes.iter() {
            self.write_lookup(key);
            self.write_value(value)?;
        }

        if let Some(text) = &element.inner_text {
            self.write_lookup(INNER_TEXT_ATTRIBUTE);
            self.write_inner_text(text)?;
        }

        self.write_u16(child_count);
        Ok(())
    }

    fn write_value(&mut self, value: &Value) -> Result<(), EncodeError> {
        match value {
            Value::Bool(b) => {
                self.out.push(tags::BOOL);
                self.out.push(u8::from(*b));
            }
            Value::U8(n) => {
                self.out.push(tags::U8);
                self.out.push(*n);
            }
            Value::I16(n) => {
                self.out.push(tags::I16);
                self.out.extend_from_slice(&n.to_le_bytes());
            }
            Value::I32(n) => {
                self.out.push(tags::I32);
                self.out.extend_from_slice(&n.to_le_bytes());
            }
            Value::F32(f) => {
                self.out.push(tags::F32);
                self.write_float(*f);
            }
            Value::String(s) => {
                self.out.push(tags::LOOKUP);
                self.write_lookup(s);
            }
        }
        Ok(())
    }

    fn write_inner_text(&mut self, text: &str) -> Result<(), EncodeError> {
        let pairs = run_length_pairs(text)?;
        let run_length_size = pairs.len() * 2;
        if run_length_size <= u16::MAX as usize && run_length_size < text.chars().count() {
            self.out.push(tags::RUN_LENGTH);
            self.write_u16(run_length_size as u16);
            for (times, byte) in pairs {
                self.out.push(times);
                self.out.push(byte);
            }
        } else {
            self.out.push(tags::STRING);
            self.write_string(text)?;
        }
        Ok(())
    }

    fn write_lookup(&mut self, s: &str) {
        // Every written string went through collect_strings first
        let index = self.indices.get(s).copied().unwrap_or_default();
        self.write_u16(index);
    }

    fn write_u16(&mut self, value: u16) {
        self.out.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_var_int(&mut self, mut value: u64) {
        loop {
            let digit = (value % 128) as u8;
            value /= 128;
            if value == 0 {
                self.out.push(digit);
                return;
            }
            self.out.push(digit | 0x80);
        }
    }

    /// Length-prefixed, one byte per character
    pub fn write_string(&mut self, s: &str) -> Result<(), EncodeError> {
        let bytes = latin1_bytes(s)?;
        self.write_var_int(bytes.len() as u64);
        self.out.extend_from_slice(&bytes);
        Ok(())
    }

    pub fn write_float(&mut self, value: f32) {
        self.out.extend_from_slice(&value.to_bits().to_le_bytes());
    }
}

fn latin1_bytes(s: &str) -> Result<Vec<u8>, EncodeError> {
    s.chars()
        .map(|c| u8::try_from(c).map_err(|_| EncodeError::UnencodableChar(c)))
        .collect()
}

/// Runs of at most 255 repeats
fn run_length_pairs(text: &str) -> Result<Vec<(u8, u8)>, EncodeError> {
    let mut pairs: Vec<(u8, u8)> = Vec::new();
    for byte in latin1_bytes(text)? {
        match pairs.last_mut() {
            Some((times, last)) if *last == byte && *times < u8::MAX => *times += 1,
            _ => pairs.push((1, byte)),
        }
    }
    Ok(pairs)
}
