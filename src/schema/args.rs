use super::{Error, Reader, Result};
use crate::cell::types::*;
use crate::cell::{OutPoint, Script, OUTPOINT_SIZE};

/// Serialized size of the payment-rate lock args without the optional
/// reusable-script hash: `pubkey-hash(20) · capacity-rate(8) · token-rate(16)
/// · token-type-hash(32)`.
pub const WALLET_ARGS_LEN: usize = 20 + 8 + 16 + 32;
/// Serialized size with the reusable-script hash appended.
pub const WALLET_ARGS_UNIQUE_LEN: usize = WALLET_ARGS_LEN + 32;

/// Identity args without the role flag: the creating out point.
pub const IDENTITY_ARGS_LEN: usize = OUTPOINT_SIZE;
/// Identity args with the one byte role flag appended.
pub const IDENTITY_ARGS_FLAGGED_LEN: usize = OUTPOINT_SIZE + 1;

/// Deserialize and validate a script buffer loaded from the ledger.
pub fn decode_script(buf: &[u8]) -> Result<Script> {
    if buf.len() > MAX_SCRIPT_SIZE {
        return Err(Error::ScriptTooLong);
    }
    Ok(bincode::deserialize(buf)?)
}

/// Extract the embedded credential from a witness buffer.
///
/// The credential is length prefixed (u32, little-endian) and must be fully
/// contained within the witness. A zero length prefix yields an empty
/// credential, which the authorization gate treats as absent.
pub fn witness_credential(buf: &[u8]) -> Result<Vec<u8>> {
    let reader = Reader::new(buf, MAX_WITNESS_SIZE)
        .map_err(|_| Error::Encoding("witness exceeds size bound".to_owned()))?;
    let len = reader.u32_le(0)? as usize;
    Ok(reader.bytes(4, len)?.to_vec())
}

/// Decode a fixed-width serialized [OutPoint].
pub fn decode_outpoint(buf: &[u8]) -> Result<OutPoint> {
    if buf.len() < 32 {
        return Err(Error::OutPointHashSize);
    }
    if buf.len() != OUTPOINT_SIZE {
        return Err(Error::OutPointIndexSize);
    }
    let reader = Reader::new(buf, OUTPOINT_SIZE)?;
    Ok(OutPoint::new(reader.hash(0)?, reader.u32_le(32)?))
}

/// Arguments of the payment-rate wallet lock (spec layout, offsets
/// cumulative): `pubkey-hash(20) · capacity-rate(8) · token-rate(16) ·
/// token-type-hash(32) [· reusable-script-hash(32)]`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct WalletArgs {
    /// Hash of the owner's public key; a valid credential against it
    /// overrides the algorithmic rules.
    pub pubkey_hash: PublicKeyHash,
    /// Minimum capacity increase accepted on the wallet cell.
    pub capacity_rate: u64,
    /// Minimum token amount paid into the wallet per paying script.
    pub token_rate: u128,
    /// Type hash of the token this wallet stores.
    pub token_type: ScriptHash,
    /// When present, only the one reusable script with this type hash may
    /// pay into the wallet.
    pub reusable_script_hash: Option<ScriptHash>,
}

impl WalletArgs {
    pub fn decode(args: &[u8]) -> Result<Self> {
        if args.len() != WALLET_ARGS_LEN && args.len() != WALLET_ARGS_UNIQUE_LEN {
            return Err(Error::ArgumentsLen { got: args.len() });
        }
        let reader = Reader::new(args, WALLET_ARGS_UNIQUE_LEN)?;
        let mut pubkey_hash = [0u8; 20];
        pubkey_hash.copy_from_slice(reader.bytes(0, 20)?);
        let capacity_rate = reader.u64_le(20)?;
        let token_rate = reader.u128_le(28)?;
        let token_type = reader.hash(44)?;
        let reusable_script_hash = if args.len() == WALLET_ARGS_UNIQUE_LEN {
            Some(reader.hash(WALLET_ARGS_LEN)?)
        } else {
            None
        };
        Ok(WalletArgs { pubkey_hash, capacity_rate, token_rate, token_type, reusable_script_hash })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(WALLET_ARGS_UNIQUE_LEN);
        out.extend_from_slice(&self.pubkey_hash);
        out.extend_from_slice(&self.capacity_rate.to_le_bytes());
        out.extend_from_slice(&self.token_rate.to_le_bytes());
        out.extend_from_slice(&self.token_type);
        if let Some(hash) = self.reusable_script_hash {
            out.extend_from_slice(&hash);
        }
        out
    }
}

/// Arguments of the fungible-token definition script: the 32 byte governance
/// lock hash whose presence among global inputs authorizes minting.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TokenDefArgs {
    pub governance_lock_hash: ScriptHash,
}

impl TokenDefArgs {
    pub fn decode(args: &[u8]) -> Result<Self> {
        if args.len() != 32 {
            return Err(Error::ArgumentsLen { got: args.len() });
        }
        Ok(TokenDefArgs { governance_lock_hash: Reader::new(args, 32)?.hash(0)? })
    }
}

/// Arguments of the reusable-script payment plugin: the lock hash of the
/// wallet cell the script's usage fee is paid into.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PluginArgs {
    pub wallet_lock_hash: ScriptHash,
}

impl PluginArgs {
    pub fn decode(args: &[u8]) -> Result<Self> {
        if args.len() < 32 {
            return Err(Error::ArgumentsLen { got: args.len() });
        }
        let reader = Reader::new(args, MAX_SCRIPT_SIZE)?;
        Ok(PluginArgs { wallet_lock_hash: reader.hash(0)? })
    }
}

/// Identity (type-ID) arguments: the out point consumed when the identity
/// was created, optionally followed by a one byte role flag distinguishing
/// the info/definition cell (`1`) from instance cells.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IdentityArgs {
    pub out_point: OutPoint,
    pub role_flag: Option<u8>,
}

impl IdentityArgs {
    pub fn decode(args: &[u8]) -> Result<Self> {
        if args.len() != IDENTITY_ARGS_LEN && args.len() != IDENTITY_ARGS_FLAGGED_LEN {
            return Err(Error::ArgumentsLen { got: args.len() });
        }
        let reader = Reader::new(args, IDENTITY_ARGS_FLAGGED_LEN)?;
        let out_point = OutPoint::new(reader.hash(0)?, reader.u32_le(32)?);
        let role_flag = if args.len() == IDENTITY_ARGS_FLAGGED_LEN {
            Some(reader.bytes(OUTPOINT_SIZE, 1)?[0])
        } else {
            None
        };
        Ok(IdentityArgs { out_point, role_flag })
    }

    /// The 36 byte compound identity shared by the info cell and its
    /// instances (the role flag excluded).
    pub fn id_bytes(&self) -> [u8; OUTPOINT_SIZE] {
        self.out_point.to_bytes()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.out_point.to_bytes().to_vec();
        if let Some(flag) = self.role_flag {
            out.push(flag);
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wallet_args_roundtrip() {
        let args = WalletArgs {
            pubkey_hash: [9u8; 20],
            capacity_rate: 1000,
            token_rate: 50,
            token_type: [3u8; 32],
            reusable_script_hash: None,
        };
        let encoded = args.encode();
        assert_eq!(encoded.len(), WALLET_ARGS_LEN);
        assert_eq!(WalletArgs::decode(&encoded).unwrap(), args);

        let unique = WalletArgs { reusable_script_hash: Some([5u8; 32]), ..args };
        let encoded = unique.encode();
        assert_eq!(encoded.len(), WALLET_ARGS_UNIQUE_LEN);
        assert_eq!(WalletArgs::decode(&encoded).unwrap(), unique);
    }

    #[test]
    fn test_wallet_args_rejects_odd_lengths() {
        assert_eq!(WalletArgs::decode(&[0u8; 75]), Err(Error::ArgumentsLen { got: 75 }));
        assert_eq!(WalletArgs::decode(&[0u8; 77]), Err(Error::ArgumentsLen { got: 77 }));
        assert_eq!(WalletArgs::decode(&[0u8; 109]), Err(Error::ArgumentsLen { got: 109 }));
    }

    #[test]
    fn test_outpoint_size_errors_are_distinct() {
        assert_eq!(decode_outpoint(&[0u8; 31]), Err(Error::OutPointHashSize));
        assert_eq!(decode_outpoint(&[0u8; 35]), Err(Error::OutPointIndexSize));
        assert_eq!(decode_outpoint(&[0u8; 37]), Err(Error::OutPointIndexSize));
        assert!(decode_outpoint(&[0u8; 36]).is_ok());
    }

    #[test]
    fn test_witness_credential_length_prefix() {
        let mut witness = vec![3, 0, 0, 0];
        witness.extend_from_slice(&[7, 8, 9]);
        assert_eq!(witness_credential(&witness).unwrap(), vec![7, 8, 9]);

        // Prefix running past the end of the witness is an encoding error.
        let truncated = vec![4, 0, 0, 0, 1];
        assert!(witness_credential(&truncated).is_err());

        // Zero length credential decodes as empty.
        assert_eq!(witness_credential(&[0, 0, 0, 0]).unwrap(), Vec::<u8>::new());
    }
}
