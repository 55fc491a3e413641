// The capacity of a particular cell.
pub type Capacity = u64;

// The blake2b-256 hash of a serialized script.
pub type ScriptHash = [u8; 32];

// The hash of a transaction.
pub type TxHash = [u8; 32];

// The truncated (20 byte) hash of some signer's public key.
pub type PublicKeyHash = [u8; 20];

/// Hard upper bound on a serialized script, enforced before decoding.
pub const MAX_SCRIPT_SIZE: usize = 32768;

/// Hard upper bound on a witness buffer.
pub const MAX_WITNESS_SIZE: usize = 32768;
