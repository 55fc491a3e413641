use super::types::TxHash;

use byteorder::{ByteOrder, LittleEndian};

use crate::colored::Colorize;

/// Size of a serialized [OutPoint]: a 32 byte transaction hash followed by a
/// little-endian u32 output index.
pub const OUTPOINT_SIZE: usize = 36;

/// A reference to a specific cell by originating transaction and index.
///
/// An out point is consumed exactly once across the ledger's history, which
/// is what makes it usable as a collision-proof identity seed (see
/// [crate::scripts::identity]).
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// Hash of the transaction which created the referenced cell.
    pub tx_hash: TxHash,
    /// Index of the referenced cell in that transaction's outputs.
    pub index: u32,
}

impl std::fmt::Debug for OutPoint {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::result::Result<(), std::fmt::Error> {
        write!(fmt, "{}:{}", hex::encode(self.tx_hash), self.index)
    }
}

impl std::fmt::Display for OutPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = format!("{}:{}", hex::encode(self.tx_hash), self.index).blue();
        write!(f, "{}", s)
    }
}

impl OutPoint {
    pub fn new(tx_hash: TxHash, index: u32) -> Self {
        OutPoint { tx_hash, index }
    }

    /// Fixed-width serialized form: `tx_hash(32) · index(4, LE)`.
    pub fn to_bytes(&self) -> [u8; OUTPOINT_SIZE] {
        let mut bytes = [0u8; OUTPOINT_SIZE];
        bytes[..32].copy_from_slice(&self.tx_hash);
        LittleEndian::write_u32(&mut bytes[32..], self.index);
        bytes
    }
}
