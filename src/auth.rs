//! The authorization gate: detection and validation of an owner-supplied
//! credential.
//!
//! A signed override and the algorithmic invariant rules are mutually
//! exclusive authorization paths: a valid credential lets the resource owner
//! unilaterally authorize any transaction touching their cell, while an
//! absent (or invalid) credential routes control to the rule engines.
use crate::cell::types::{PublicKeyHash, TxHash};
use crate::ledger::{LedgerAccessor, LoadError, Source};
use crate::schema;

use std::convert::TryFrom;

use ed25519_dalek::{PublicKey, Signature, Verifier};
use tracing::debug;

#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    Syscall(String),
    Encoding(String),
}

impl std::error::Error for Error {}

impl std::convert::From<LoadError> for Error {
    fn from(error: LoadError) -> Self {
        Error::Syscall(format!("{:?}", error))
    }
}

impl std::convert::From<schema::Error> for Error {
    fn from(error: schema::Error) -> Self {
        Error::Encoding(format!("{:?}", error))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Presence of an owner credential on the first input of the script group.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Credential {
    Present(Vec<u8>),
    Absent,
}

/// Inspect the witness attached to the first cell in this script's input
/// group.
///
/// Absence of a witness, or a witness whose embedded credential has zero
/// length, means [Credential::Absent]. A malformed witness is an encoding
/// error, and accessor failures other than the out-of-bound sentinel stay
/// fatal.
pub fn probe_signature<A: LedgerAccessor>(accessor: &A) -> Result<Credential> {
    let witness = match accessor.load_witness(Source::GroupInput, 0) {
        Ok(witness) => witness,
        Err(LoadError::IndexOutOfBound) => return Ok(Credential::Absent),
        Err(err) => return Err(err.into()),
    };
    if witness.is_empty() {
        return Ok(Credential::Absent);
    }
    let credential = schema::witness_credential(&witness)?;
    if credential.is_empty() {
        debug!("witness present but credential empty");
        return Ok(Credential::Absent);
    }
    Ok(Credential::Present(credential))
}

/// The external signature-verification collaborator bound to a public-key
/// hash argument.
pub trait SignatureVerifier {
    /// Whether `credential` validly authorizes `message` on behalf of the
    /// key hashing to `pubkey_hash`.
    fn verify(&self, pubkey_hash: &PublicKeyHash, credential: &[u8], message: &TxHash) -> bool;
}

/// Default verifier: the credential is `public-key(32) · signature(64)`, the
/// public key must hash (blake3, truncated to 20 bytes) to the configured
/// pubkey hash, and the signature must cover the transaction hash.
#[derive(Debug, Default)]
pub struct Ed25519Verifier;

impl Ed25519Verifier {
    /// The 20 byte hash a wallet's args bind a public key with.
    pub fn hash_public(public: &PublicKey) -> PublicKeyHash {
        let encoded = bincode::serialize(public).unwrap();
        let digest = blake3::hash(&encoded);
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest.as_bytes()[..20]);
        out
    }
}

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, pubkey_hash: &PublicKeyHash, credential: &[u8], message: &TxHash) -> bool {
        if credential.len() != 32 + 64 {
            return false;
        }
        let public = match PublicKey::from_bytes(&credential[..32]) {
            Ok(public) => public,
            Err(_) => return false,
        };
        if Self::hash_public(&public) != *pubkey_hash {
            debug!("credential public key does not match configured hash");
            return false;
        }
        let signature = match Signature::try_from(&credential[32..]) {
            Ok(signature) => signature,
            Err(_) => return false,
        };
        public.verify(message, &signature).is_ok()
    }
}
