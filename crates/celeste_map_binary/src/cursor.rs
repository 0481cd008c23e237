//! Sequential reader over an immutable byte buffer

use crate::DecodeError;

/// Bounds-checked cursor. Reads hand out slices of the underlying buffer;
/// nothing is copied.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take the next `n` bytes
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(self.truncated(n));
        }
        let start = self.position;
        self.position += n;
        Ok(&self.bytes[start..self.position])
    }

    /// Take exactly `N` bytes as an array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let byte = *self.bytes.get(self.position).ok_or_else(|| self.truncated(1))?;
        self.position += 1;
        Ok(byte)
    }

    fn truncated(&self, needed: usize) -> DecodeError {
        DecodeError::TruncatedData {
            offset: self.position,
            needed,
            available: self.remaining(),
        }
    }
}
