use super::{Error, Result};

use byteorder::{ByteOrder, LittleEndian};

/// Bounds-checked field extraction over an untrusted buffer.
///
/// Construction rejects over-length buffers up front; every accessor
/// validates `offset + width` against the buffer length, so a `Reader` can
/// never alias memory outside the buffer it was built over.
pub struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    /// Wrap `buf`, rejecting it when it exceeds `max` bytes.
    pub fn new(buf: &'a [u8], max: usize) -> Result<Self> {
        if buf.len() > max {
            return Err(Error::Encoding(format!("buffer of {} exceeds bound {}", buf.len(), max)));
        }
        Ok(Reader { buf })
    }

    /// A `width`-byte field at `offset`, validated against the buffer length.
    pub fn bytes(&self, offset: usize, width: usize) -> Result<&'a [u8]> {
        let end = offset
            .checked_add(width)
            .ok_or_else(|| Error::Encoding("field range overflow".to_owned()))?;
        if end > self.buf.len() {
            return Err(Error::Encoding(format!(
                "field [{}, {}) out of range for buffer of {}",
                offset,
                end,
                self.buf.len()
            )));
        }
        Ok(&self.buf[offset..end])
    }

    pub fn u32_le(&self, offset: usize) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.bytes(offset, 4)?))
    }

    pub fn u64_le(&self, offset: usize) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.bytes(offset, 8)?))
    }

    pub fn u128_le(&self, offset: usize) -> Result<u128> {
        Ok(LittleEndian::read_u128(self.bytes(offset, 16)?))
    }

    pub fn hash(&self, offset: usize) -> Result<[u8; 32]> {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.bytes(offset, 32)?);
        Ok(out)
    }
}
