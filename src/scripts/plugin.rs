//! The reusable-script payment plugin.
//!
//! A reusable script embeds this check to tie its own execution to a usage
//! fee: every transaction running it must move exactly one cell locked by
//! the author's wallet, which puts the wallet's own payment-rate lock in
//! the position to enforce the fee amount.
use super::ExitCode;
use crate::aggregate;
use crate::ledger::{LedgerAccessor, LoadError, Source};
use crate::schema::{self, PluginArgs};

use tracing::debug;

#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    Encoding(String),
    Syscall(String),
    ScriptTooLong,
    /// The plugin args do not carry a 32 byte wallet lock hash.
    ArgsEncoding,
    /// Not exactly one wallet cell on each side of the transaction.
    CellWallet,
}

impl std::error::Error for Error {}

impl std::convert::From<LoadError> for Error {
    fn from(error: LoadError) -> Self {
        Error::Syscall(format!("{:?}", error))
    }
}

impl std::convert::From<schema::Error> for Error {
    fn from(error: schema::Error) -> Self {
        match error {
            schema::Error::ArgumentsLen { .. } => Error::ArgsEncoding,
            schema::Error::ScriptTooLong => Error::ScriptTooLong,
            other => Error::Encoding(format!("{:?}", other)),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl ExitCode for Error {
    fn exit_code(&self) -> i8 {
        match self {
            Error::Encoding(_) => -2,
            Error::Syscall(_) => -3,
            Error::ScriptTooLong => -21,
            Error::ArgsEncoding => -51,
            Error::CellWallet => -53,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Verify one execution of the payment plugin: exactly one cell bearing the
/// configured wallet lock hash among the global inputs and exactly one among
/// the global outputs.
pub fn verify<A: LedgerAccessor>(accessor: &A) -> Result<()> {
    let script = schema::decode_script(&accessor.script()?)?;
    let args = PluginArgs::decode(&script.args)?;

    let inputs = aggregate::count_lock_hash(accessor, Source::Input, &args.wallet_lock_hash)?;
    let outputs = aggregate::count_lock_hash(accessor, Source::Output, &args.wallet_lock_hash)?;
    if inputs != 1 || outputs != 1 {
        debug!(inputs, outputs, "wallet cell count off");
        return Err(Error::CellWallet);
    }
    Ok(())
}
