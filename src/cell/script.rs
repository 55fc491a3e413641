use super::types::*;
use super::Result;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

type Blake2b256 = Blake2b<U32>;

/// A script attached to a cell, either as its lock (who may consume the cell)
/// or as its type (what transformations of the cell's data are valid).
///
/// Two scripts are the same iff their serialized forms hash equal, see
/// [Script::hash].
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Script {
    /// Reference to the code executed when the script runs.
    pub code_hash: [u8; 32],
    /// Distinguishes code referenced by data hash from code referenced by type.
    pub hash_type: u8,
    /// Argument byte string supplied to the code at verification time.
    pub args: Vec<u8>,
}

impl std::fmt::Display for Script {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "script args: {}", hex::encode(&self.args))
    }
}

impl Script {
    pub fn new(code_hash: [u8; 32], args: Vec<u8>) -> Self {
        Script { code_hash, hash_type: 0, args }
    }

    /// Serialize the script and return its blake2b-256 hash.
    pub fn hash(&self) -> ScriptHash {
        let encoded = bincode::serialize(self).unwrap();
        let mut hasher = Blake2b256::new();
        hasher.update(&encoded);
        hasher.finalize().into()
    }

    /// Canonical serialized form of the script.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_script_hash_depends_on_args() {
        let s1 = Script::new([1u8; 32], vec![0, 1, 2]);
        let s2 = Script::new([1u8; 32], vec![0, 1, 3]);
        assert_eq!(s1.hash(), s1.clone().hash());
        assert_ne!(s1.hash(), s2.hash());
    }
}
