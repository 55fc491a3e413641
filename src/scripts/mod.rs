//! The invariant rule engines, one module per script.
//!
//! Every engine is a pure function from (script arguments, transaction
//! snapshot) to an accept/reject verdict: the first failing check aborts the
//! whole verification, and the named violation is preserved in a stable
//! negative exit code. `0` is success; `-1`/`-2`/`-3`/`-21` are the shared
//! argument-length / encoding / syscall / over-length classes; the domain
//! codes `-47..=-63` are per script, matching [Error::exit_code] in each
//! module.
pub mod identity;
pub mod plugin;
pub mod supply;
pub mod token;
pub mod wallet;

use crate::SUCCESS;

/// Stable process exit codes for a script's error taxonomy.
pub trait ExitCode {
    fn exit_code(&self) -> i8;
}

/// Collapse a verification result into the script's terminal status.
pub fn run<E: ExitCode>(result: std::result::Result<(), E>) -> i8 {
    match result {
        Ok(()) => SUCCESS,
        Err(err) => err.exit_code(),
    }
}
