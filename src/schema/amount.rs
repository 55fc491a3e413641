use super::{Error, Reader, Result};

/// Width of the fixed amount record stored in a token cell's data payload.
///
/// The 8 byte form is used by token-definition cells and supply instances,
/// the 16 byte form by the fungible-token variant. One conservation engine
/// serves both, parameterized by this width.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AmountWidth {
    U64,
    U128,
}

impl AmountWidth {
    pub fn size(&self) -> usize {
        match self {
            AmountWidth::U64 => 8,
            AmountWidth::U128 => 16,
        }
    }

    /// Decode an amount record of exactly this width, widened to u128 for
    /// aggregation.
    pub fn decode(&self, buf: &[u8]) -> Result<u128> {
        if buf.len() != self.size() {
            return Err(Error::Encoding(format!(
                "amount record of {} bytes, expected {}",
                buf.len(),
                self.size()
            )));
        }
        let reader = Reader::new(buf, self.size())?;
        match self {
            AmountWidth::U64 => Ok(reader.u64_le(0)? as u128),
            AmountWidth::U128 => reader.u128_le(0),
        }
    }
}

/// Decode an 8 byte little-endian amount record.
pub fn decode_amount_u64(buf: &[u8]) -> Result<u64> {
    AmountWidth::U64.decode(buf).map(|amount| amount as u64)
}

/// Decode a 16 byte little-endian amount record.
pub fn decode_amount_u128(buf: &[u8]) -> Result<u128> {
    AmountWidth::U128.decode(buf)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_amount_record_is_exact_width() {
        assert_eq!(decode_amount_u64(&[1, 0, 0, 0, 0, 0, 0, 0]).unwrap(), 1);
        assert!(decode_amount_u64(&[1, 0, 0, 0]).is_err());
        assert!(decode_amount_u64(&[0u8; 16]).is_err());

        let mut rec = [0u8; 16];
        rec[0] = 200;
        assert_eq!(decode_amount_u128(&rec).unwrap(), 200);
        assert!(decode_amount_u128(&rec[..8]).is_err());
    }
}
