//! The ledger accessor interface and the in-memory transaction snapshot.
//!
//! Scripts never touch transaction structures directly; they read fields
//! through [LedgerAccessor], probing indices `0, 1, 2, …` until
//! [LoadError::IndexOutOfBound] is returned. That variant is the sole
//! loop-termination signal and is kept distinct from every fatal kind.
mod accessor;
mod source;
mod transaction;

pub use accessor::*;
pub use source::*;
pub use transaction::*;

#[derive(Debug, Eq, PartialEq)]
pub enum LoadError {
    /// The probed index lies past the end of the selected cell set. Never
    /// fatal: it terminates an iteration.
    IndexOutOfBound,
    /// The cell exists but the requested optional field is absent (e.g. a
    /// type hash on a cell with no type script).
    ItemMissing,
    /// Any other accessor failure. Always fatal, propagated immediately.
    Syscall(String),
}

impl std::error::Error for LoadError {}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;
