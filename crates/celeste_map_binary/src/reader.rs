//! Binary map decoder
//!
//! File layout (multi-byte integers little-endian):
//!   [varint len] "CELESTE MAP"
//!   [varint len] package name
//!   u16 lookup count, then that many [varint len] strings
//!   element tree
//!
//! Element: u16 name index, u8 attribute count, then per attribute
//! (u16 name index, u8 type tag, value), then u16 child count. Children
//! follow their parent depth-first, each child's whole subtree before the
//! next sibling.

use celeste_map_core::{Attributes, RawElement, Value, INNER_TEXT_ATTRIBUTE};

use crate::{ByteCursor, DecodeError};

/// Leading string of every map file.
pub const HEADER: &str = "CELESTE MAP";

/// Type tags preceding attribute values
pub mod tags {
    pub const BOOL: u8 = 0;
    pub const U8: u8 = 1;
    pub const I16: u8 = 2;
    pub const I32: u8 = 3;
    pub const F32: u8 = 4;
    pub const LOOKUP: u8 = 5;
    pub const STRING: u8 = 6;
    pub const RUN_LENGTH: u8 = 7;
}

/// Decode a whole map file into its root element.
///
/// The package name from the header is stored in the root's `package`.
pub fn decode_map(bytes: &[u8]) -> Result<RawElement, DecodeError> {
    MapBinReader::new(bytes).decode()
}

/// Decoder state: the cursor plus the file's string lookup table.
pub struct MapBinReader<'a> {
    cursor: ByteCursor<'a>,
    lookup: Vec<String>,
}

/// Sibling list the next decoded element is appended to, repeated
/// `remaining` times.
struct AppendTarget {
    parent: Option<usize>,
    remaining: u16,
}

impl<'a> MapBinReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: ByteCursor::new(bytes),
            lookup: Vec::new(),
        }
    }

    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    pub fn lookup_table(&self) -> &[String] {
        &self.lookup
    }

    /// Decode header, package, lookup table and element tree
    pub fn decode(mut self) -> Result<RawElement, DecodeError> {
        let header = self.read_string()?;
        if header != HEADER {
            return Err(DecodeError::Format { found: header });
        }

        let package = self.read_string()?;

        let count = self.read_u16()?;
        self.lookup = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let entry = self.read_string()?;
            self.lookup.push(entry);
        }

        let mut root = self.decode_tree()?;
        root.package = Some(package);

        if !self.cursor.is_empty() {
            tracing::debug!(
                trailing = self.cursor.remaining(),
                "ignoring bytes after the element tree"
            );
        }

        Ok(root)
    }

    /// Decode one element tree.
    ///
    /// Elements are not decoded recursively. A LIFO stack holds the sibling
    /// lists that the next elements belong to: an element with `k` children
    /// pushes `k` append slots for its own child list, so its whole subtree
    /// is consumed before any earlier-pushed sibling slot is popped. A FIFO
    /// queue here would attach grandchildren to the wrong parent.
    pub fn decode_tree(&mut self) -> Result<RawElement, DecodeError> {
        let mut arena: Vec<RawElement> = Vec::new();
        let mut links: Vec<Vec<usize>> = Vec::new();
        let mut stack = vec![AppendTarget {
            parent: None,
            remaining: 1,
        }];

        while let Some(top) = stack.last_mut() {
            let parent = top.parent;
            top.remaining -= 1;
            if top.remaining == 0 {
                stack.pop();
            }

            let (element, child_count) = self.read_element()?;
            let index = arena.len();
            arena.push(element);
            links.push(Vec::with_capacity(child_count as usize));

            if let Some(parent) = parent {
                links[parent].push(index);
            }

            if child_count > 0 {
                stack.push(AppendTarget {
                    parent: Some(index),
                    remaining: child_count,
                });
            }
        }

        tracing::debug!(elements = arena.len(), lookup = self.lookup.len(), "decoded element tree");

        // Children always come after their parent, so attach back to front.
        for index in (0..arena.len()).rev() {
            let (head, tail) = arena.split_at_mut(index + 1);
            let parent = &mut head[index];
            for &child in &links[index] {
                parent.children.push(std::mem::take(&mut tail[child - index - 1]));
            }
        }

        Ok(arena.swap_remove(0))
    }

    /// Read one element's own fields; returns it with its child count
    fn read_element(&mut self) -> Result<(RawElement, u16), DecodeError> {
        let name = self.read_lookup()?;
        let attribute_count = self.read_u8()?;

        let mut element = RawElement::new(name);
        element.attributes = Attributes::with_capacity(attribute_count as usize);

        for _ in 0..attribute_count {
            let key = self.read_lookup()?;
            let tag_offset = self.cursor.position();
            let tag = self.read_u8()?;
            let value = self.read_value(tag, tag_offset)?;

            if key.is_empty() {
                continue;
            }
            match value {
                Value::String(text) if key == INNER_TEXT_ATTRIBUTE => element.inner_text = Some(text),
                value => {
                    element.attributes.insert(key, value);
                }
            }
        }

        let child_count = self.read_u16()?;
        Ok((element, child_count))
    }

    fn read_value(&mut self, tag: u8, offset: usize) -> Result<Value, DecodeError> {
        Ok(match tag {
            tags::BOOL => Value::Bool(self.read_u8()? != 0),
            tags::U8 => Value::U8(self.read_u8()?),
            tags::I16 => Value::I16(self.read_i16()?),
            tags::I32 => Value::I32(self.read_i32()?),
            tags::F32 => Value::F32(self.read_float()?),
            tags::LOOKUP => Value::String(self.read_lookup()?),
            tags::STRING => Value::String(self.read_string()?),
            tags::RUN_LENGTH => Value::String(self.read_run_length()?),
            tag => return Err(DecodeError::UnsupportedValueType { tag, offset }),
        })
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.cursor.read_u8()
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.cursor.read_array()?))
    }

    /// Two's complement of the 16-bit little-endian value
    pub fn read_i16(&mut self) -> Result<i16, DecodeError> {
        Ok(i16::from_le_bytes(self.cursor.read_array()?))
    }

    /// Two's complement of the 32-bit little-endian value
    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.cursor.read_array()?))
    }

    /// Base-128 unsigned integer, least significant digit first
    pub fn read_var_int(&mut self) -> Result<u64, DecodeError> {
        let offset = self.cursor.position();
        let overflow = || DecodeError::MalformedVarInt { offset };

        let mut value: u64 = 0;
        let mut multiplier: u64 = 1;
        loop {
            let byte = self.read_u8()?;
            let digit = u64::from(byte & 0x7f)
                .checked_mul(multiplier)
                .ok_or_else(overflow)?;
            value = value.checked_add(digit).ok_or_else(overflow)?;
            if byte < 0x80 {
                return Ok(value);
            }
            multiplier = multiplier.checked_mul(128).ok_or_else(overflow)?;
        }
    }

    /// Length-prefixed string, one code point per byte
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let offset = self.cursor.position();
        let len = usize::try_from(self.read_var_int()?)
            .map_err(|_| DecodeError::MalformedVarInt { offset })?;
        Ok(latin1(self.cursor.read_bytes(len)?))
    }

    /// String from the lookup table, by 16-bit index
    pub fn read_lookup(&mut self) -> Result<String, DecodeError> {
        let index = self.read_u16()?;
        self.lookup
            .get(index as usize)
            .cloned()
            .ok_or(DecodeError::InvalidLookupIndex {
                index,
                len: self.lookup.len(),
            })
    }

    /// 16-bit byte count followed by `(repeat, char)` pairs
    pub fn read_run_length(&mut self) -> Result<String, DecodeError> {
        let byte_count = self.read_u16()?;
        let mut text = String::new();
        for _ in (0..byte_count).step_by(2) {
            let [times, c] = self.cursor.read_array()?;
            text.extend(std::iter::repeat(c as char).take(times as usize));
        }
        Ok(text)
    }

    /// IEEE-754 single precision stored least significant byte first.
    ///
    /// A zero exponent always reads as `0.0`; denormals are not produced.
    pub fn read_float(&mut self) -> Result<f32, DecodeError> {
        let [b4, b3, b2, b1] = self.cursor.read_array::<4>()?;

        let exponent = u32::from(b1 % 128) * 2 + u32::from(b2 / 128);
        let sign = if b1 > 127 { -1.0 } else { 1.0 };
        let mantissa = (u32::from(b2 % 128) * 256 + u32::from(b3)) * 256 + u32::from(b4);

        Ok(match exponent {
            0 => 0.0,
            255 if mantissa == 0 => sign * f32::INFINITY,
            255 => f32::NAN,
            _ => {
                let fraction = mantissa as f32 / (1u32 << 23) as f32 + 1.0;
                // 2^(exponent - 127), exact for every normal exponent
                let scale = f32::from_bits(exponent << 23);
                sign * fraction * scale
            }
        })
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(out: &mut Vec<u8>, s: &str) {
        out.push(s.len() as u8);
        out.extend_from_slice(s.as_bytes());
    }

    /// Header, package and lookup table for hand-built fixtures
    fn preamble(lookup: &[&str]) -> Vec<u8> {
        let mut out = Vec::new();
        string(&mut out, HEADER);
        string(&mut out, "Test");
        out.extend_from_slice(&(lookup.len() as u16).to_le_bytes());
        for entry in lookup {
            string(&mut out, entry);
        }
        out
    }

    fn reader_over(bytes: &[u8]) -> MapBinReader<'_> {
        MapBinReader::new(bytes)
    }

    #[test]
    fn test_var_int_accumulates_little_endian_digits() {
        assert_eq!(reader_over(&[0x00]).read_var_int(), Ok(0));
        assert_eq!(reader_over(&[0x7f]).read_var_int(), Ok(127));
        assert_eq!(reader_over(&[0x81, 0x01]).read_var_int(), Ok(129));
        assert_eq!(reader_over(&[0x80, 0x80, 0x01]).read_var_int(), Ok(16384));
        assert_eq!(reader_over(&[0xff, 0xff, 0x7f]).read_var_int(), Ok(2_097_151));
    }

    #[test]
    fn test_var_int_overflow_is_rejected() {
        let bytes = [0xffu8; 11];
        assert_eq!(
            reader_over(&bytes).read_var_int(),
            Err(DecodeError::MalformedVarInt { offset: 0 })
        );
    }

    #[test]
    fn test_var_int_without_terminator_is_truncated() {
        assert!(matches!(
            reader_over(&[0x80, 0x80]).read_var_int(),
            Err(DecodeError::TruncatedData { offset: 2, .. })
        ));
    }

    #[test]
    fn test_strings_are_latin1() {
        let bytes = [3, b'c', 0xe9, b'!'];
        assert_eq!(reader_over(&bytes).read_string().unwrap(), "c\u{e9}!");
    }

    #[test]
    fn test_signed_integers() {
        assert_eq!(reader_over(&[0xff, 0xff]).read_i16(), Ok(-1));
        assert_eq!(reader_over(&[0x00, 0x80]).read_i16(), Ok(i16::MIN));
        assert_eq!(reader_over(&[0xff, 0x7f]).read_i16(), Ok(i16::MAX));
        assert_eq!(reader_over(&[0x00, 0x00, 0x00, 0x80]).read_i32(), Ok(i32::MIN));
        assert_eq!(reader_over(&[0x38, 0xff, 0xff, 0xff]).read_i32(), Ok(-200));
    }

    #[test]
    fn test_float_special_values() {
        assert_eq!(reader_over(&[0x00, 0x00, 0x00, 0x00]).read_float(), Ok(0.0));
        // Zero exponent with a mantissa still reads as zero
        assert_eq!(reader_over(&[0x01, 0x00, 0x00, 0x80]).read_float(), Ok(0.0));

        let neg_inf = reader_over(&[0x00, 0x00, 0x80, 0xff]).read_float().unwrap();
        assert_eq!(neg_inf, f32::NEG_INFINITY);

        let pos_inf = reader_over(&[0x00, 0x00, 0x80, 0x7f]).read_float().unwrap();
        assert_eq!(pos_inf, f32::INFINITY);

        let nan = reader_over(&[0x01, 0x00, 0x80, 0x7f]).read_float().unwrap();
        assert!(nan.is_nan());
    }

    #[test]
    fn test_float_normal_values() {
        assert_eq!(reader_over(&1.5f32.to_le_bytes()).read_float(), Ok(1.5));
        assert_eq!(reader_over(&(-2.0f32).to_le_bytes()).read_float(), Ok(-2.0));
        assert_eq!(reader_over(&0.1f32.to_le_bytes()).read_float(), Ok(0.1));
        assert_eq!(reader_over(&1234.5678f32.to_le_bytes()).read_float(), Ok(1234.5678));
        assert_eq!(reader_over(&f32::MAX.to_le_bytes()).read_float(), Ok(f32::MAX));
    }

    #[test]
    fn test_run_length_expands_pairs() {
        let bytes = [4, 0, 3, b'a', 2, b'b'];
        assert_eq!(reader_over(&bytes).read_run_length().unwrap(), "aaabb");
    }

    #[test]
    fn test_run_length_zero_repeat_and_empty() {
        let bytes = [4, 0, 0, b'x', 1, b'\n'];
        assert_eq!(reader_over(&bytes).read_run_length().unwrap(), "\n");
        assert_eq!(reader_over(&[0, 0]).read_run_length().unwrap(), "");
    }

    #[test]
    fn test_bad_header_is_format_error() {
        let mut bytes = Vec::new();
        string(&mut bytes, "CELESTE MAQ");
        string(&mut bytes, "Test");
        bytes.extend_from_slice(&[0, 0]);

        assert_eq!(
            decode_map(&bytes),
            Err(DecodeError::Format {
                found: "CELESTE MAQ".to_string()
            })
        );
    }

    #[test]
    fn test_minimal_map_decodes() {
        let mut bytes = preamble(&["Map"]);
        bytes.extend_from_slice(&[0, 0, 0, 0, 0]);

        let root = decode_map(&bytes).unwrap();
        assert_eq!(root.name, "Map");
        assert_eq!(root.package.as_deref(), Some("Test"));
        assert!(root.children.is_empty());
        assert!(root.attributes.is_empty());
    }

    #[test]
    fn test_tree_order_follows_append_stack() {
        // Map { a { c }, b }: a's subtree sits between a and b in the stream
        let mut bytes = preamble(&["Map", "a", "b", "c"]);
        bytes.extend_from_slice(&[0, 0, 0, 2, 0]); // Map, 0 attrs, 2 children
        bytes.extend_from_slice(&[1, 0, 0, 1, 0]); // a, 0 attrs, 1 child
        bytes.extend_from_slice(&[3, 0, 0, 0, 0]); // c, leaf
        bytes.extend_from_slice(&[2, 0, 0, 0, 0]); // b, leaf

        let root = decode_map(&bytes).unwrap();

        assert_eq!(root.children.len(), 2);
        let a = &root.children[0];
        let b = &root.children[1];
        assert_eq!(a.name, "a");
        assert_eq!(b.name, "b");
        assert_eq!(a.children.len(), 1);
        assert_eq!(a.children[0].name, "c");
        assert!(a.children[0].children.is_empty());
        assert!(b.children.is_empty());
    }

    #[test]
    fn test_deep_nesting_does_not_recurse() {
        const DEPTH: usize = 200_000;
        let mut bytes = preamble(&["n"]);
        for _ in 0..DEPTH {
            bytes.extend_from_slice(&[0, 0, 0, 1, 0]);
        }
        bytes.extend_from_slice(&[0, 0, 0, 0, 0]);

        let root = decode_map(&bytes).unwrap();
        let mut depth = 0;
        let mut node = &root;
        while let Some(child) = node.children.first() {
            depth += 1;
            node = child;
        }
        assert_eq!(depth, DEPTH);
        drop(root);
    }

    #[test]
    fn test_every_value_tag() {
        let mut bytes = preamble(&["e", "b", "u", "s", "l", "f", "r", "i", "t", "innerText"]);
        bytes.extend_from_slice(&[0, 0, 9]); // e, 9 attributes
        bytes.extend_from_slice(&[1, 0, tags::BOOL, 1]);
        bytes.extend_from_slice(&[2, 0, tags::U8, 200]);
        bytes.extend_from_slice(&[3, 0, tags::I16, 0xfe, 0xff]);
        bytes.extend_from_slice(&[4, 0, tags::I32, 0x00, 0x00, 0x01, 0x00]);
        bytes.extend_from_slice(&[5, 0, tags::F32]);
        bytes.extend_from_slice(&0.5f32.to_le_bytes());
        bytes.extend_from_slice(&[6, 0, tags::LOOKUP, 1, 0]);
        bytes.extend_from_slice(&[7, 0, tags::STRING, 2, b'h', b'i']);
        bytes.extend_from_slice(&[8, 0, tags::RUN_LENGTH, 2, 0, 3, b'1']);
        bytes.extend_from_slice(&[9, 0, tags::RUN_LENGTH, 4, 0, 2, b'1', 1, b'0']);
        bytes.extend_from_slice(&[0, 0]); // no children

        let root = decode_map(&bytes).unwrap();
        let attr = |name: &str| root.attribute(name).cloned();

        assert_eq!(attr("b"), Some(Value::Bool(true)));
        assert_eq!(attr("u"), Some(Value::U8(200)));
        assert_eq!(attr("s"), Some(Value::I16(-2)));
        assert_eq!(attr("l"), Some(Value::I32(65536)));
        assert_eq!(attr("f"), Some(Value::F32(0.5)));
        assert_eq!(attr("r"), Some(Value::String("b".into())));
        assert_eq!(attr("i"), Some(Value::String("hi".into())));
        assert_eq!(attr("t"), Some(Value::String("111".into())));
        assert_eq!(root.inner_text.as_deref(), Some("110"));
        assert!(root.attribute(INNER_TEXT_ATTRIBUTE).is_none());
    }

    #[test]
    fn test_unknown_tag_is_fatal() {
        let mut bytes = preamble(&["e", "k"]);
        bytes.extend_from_slice(&[0, 0, 1, 1, 0, 8, 0, 0, 0]);

        let header_len = preamble(&["e", "k"]).len();
        assert_eq!(
            decode_map(&bytes),
            Err(DecodeError::UnsupportedValueType {
                tag: 8,
                offset: header_len + 5
            })
        );
    }

    #[test]
    fn test_truncated_tree_is_fatal() {
        let mut bytes = preamble(&["Map", "a"]);
        bytes.extend_from_slice(&[0, 0, 0, 2, 0]); // promises two children
        bytes.extend_from_slice(&[1, 0, 0, 0, 0]); // only one present

        assert!(matches!(
            decode_map(&bytes),
            Err(DecodeError::TruncatedData { .. })
        ));
    }

    #[test]
    fn test_lookup_index_out_of_range() {
        let mut bytes = preamble(&["Map"]);
        bytes.extend_from_slice(&[5, 0, 0, 0, 0]);

        assert_eq!(
            decode_map(&bytes),
            Err(DecodeError::InvalidLookupIndex { index: 5, len: 1 })
        );
    }
}
