//! Positioned little-endian reads over an in-memory byte buffer.

use crate::error::{Result, ShaderError};

/// Random-access byte source with a cursor.
///
/// Implementors provide positioning and raw reads; the typed reads are built
/// on top and fail with [`ShaderError::Truncated`] on short input.
pub trait ByteSource {
    fn position(&self) -> usize;
    fn seek(&mut self, pos: usize);
    fn len(&self) -> usize;
    fn read_into(&mut self, buf: &mut [u8]) -> Result<()>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remaining(&self) -> usize {
        self.len().saturating_sub(self.position())
    }

    fn read_u32_le(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_into(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_i32_le(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_into(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    /// Reads a length to be used for an allocation; negative lengths are
    /// treated as truncation.
    fn read_len(&mut self) -> Result<usize> {
        let len = self.read_i32_le()?;
        usize::try_from(len).map_err(|_| ShaderError::Truncated {
            expected: len as u32 as usize,
            actual: self.remaining(),
        })
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        if len > self.remaining() {
            return Err(ShaderError::Truncated {
                expected: len,
                actual: self.remaining(),
            });
        }
        let mut buf = vec![0u8; len];
        self.read_into(&mut buf)?;
        Ok(buf)
    }

    /// Length-prefixed byte array.
    fn read_byte_vec(&mut self) -> Result<Vec<u8>> {
        let len = self.read_len()?;
        self.read_bytes(len)
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(ShaderError::Truncated {
                expected: n,
                actual: self.remaining(),
            });
        }
        let pos = self.position();
        self.seek(pos + n);
        Ok(())
    }

    fn align_to_4(&mut self) {
        let pos = self.position();
        self.seek(pos.next_multiple_of(4).min(self.len().max(pos)));
    }

    /// Length-prefixed UTF-8 string followed by padding to 4 bytes.
    fn read_aligned_string(&mut self) -> Result<String> {
        let bytes = self.read_byte_vec()?;
        self.align_to_4();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// NUL-terminated UTF-8 string; consumes the terminator when present.
    fn read_cstring(&mut self) -> Result<String> {
        let mut bytes = Vec::new();
        let mut b = [0u8; 1];
        while self.remaining() > 0 {
            self.read_into(&mut b)?;
            if b[0] == 0 {
                break;
            }
            bytes.push(b[0]);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// [`ByteSource`] over a borrowed slice.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}

impl ByteSource for ByteCursor<'_> {
    fn position(&self) -> usize {
        self.pos
    }

    fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        let end = self
            .pos
            .checked_add(buf.len())
            .filter(|&end| end <= self.data.len())
            .ok_or(ShaderError::Truncated {
                expected: buf.len(),
                actual: self.data.len().saturating_sub(self.pos),
            })?;
        buf.copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(())
    }
}
