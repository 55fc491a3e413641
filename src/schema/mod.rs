//! Decoding of untrusted byte buffers.
//!
//! Every field accessor in this module is bounds checked against the buffer
//! it reads from; no accessor may be reached without the enclosing buffer
//! having passed its class's size bound first.
mod amount;
mod args;
mod reader;

pub use amount::*;
pub use args::*;
pub use reader::*;

#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// Malformed, truncated or ill-typed buffer.
    Encoding(String),
    /// Script args do not match an expected fixed or bounded length.
    ArgumentsLen { got: usize },
    /// A script-class buffer exceeds [crate::cell::types::MAX_SCRIPT_SIZE].
    ScriptTooLong,
    /// A serialized out point whose transaction hash is not 32 bytes.
    OutPointHashSize,
    /// A serialized out point whose index is not 4 bytes.
    OutPointIndexSize,
}

impl std::error::Error for Error {}

impl std::convert::From<Box<bincode::ErrorKind>> for Error {
    fn from(error: Box<bincode::ErrorKind>) -> Self {
        Error::Encoding(format!("{:?}", error))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
