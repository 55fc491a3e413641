//! The identity (type-ID) uniqueness rule.
//!
//! A cell is in `Creating` state iff its script args encode the out point of
//! the transaction's first global input exactly; because that out point is
//! consumed exactly once ever, the identity is bound to a single
//! irreproducible creation event. Any other transaction is in `Updating`
//! state, which requires exactly one cell with this script's hash among the
//! input group and exactly one among the output group, ensuring at most one
//! cell bearing a given identity exists at any time.
use super::ExitCode;
use crate::aggregate::{self, Step};
use crate::ledger::{CellField, InputField, LedgerAccessor, LoadError, Source};
use crate::schema::{self, IdentityArgs};

use tracing::debug;

#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    Encoding(String),
    Syscall(String),
    /// Neither a valid creation nor a one-in/one-out update.
    IdentityViolation,
    /// The first input's out point index field is not 4 bytes.
    OutPointIndexSize,
    /// The first input's out point transaction hash is not 32 bytes.
    OutPointHashSize,
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
            schema::Error::OutPointHashSize => Error::OutPointHashSize,
            schema::Error::OutPointIndexSize => Error::OutPointIndexSize,
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
            Error::IdentityViolation => -61,
            Error::OutPointIndexSize => -62,
            Error::OutPointHashSize => -63,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Verify one execution of the identity script: accept a valid creation, or
/// fall through to the update uniqueness check.
pub fn verify<A: LedgerAccessor>(accessor: &A) -> Result<()> {
    if is_creation(accessor)? {
        debug!("identity bound to first input out point, creation accepted");
        return Ok(());
    }
    verify_update(accessor)
}

/// Whether this transaction creates the identity: the script args must
/// byte-equal the first global input's out point.
///
/// Args of an unexpected length merely fail the creation test (the update
/// path may still apply); a malformed first-input out point stays fatal.
pub fn is_creation<A: LedgerAccessor>(accessor: &A) -> Result<bool> {
    let script = schema::decode_script(&accessor.script()?)?;
    let args = match IdentityArgs::decode(&script.args) {
        Ok(args) => args,
        Err(schema::Error::ArgumentsLen { .. }) => return Ok(false),
        Err(err) => return Err(err.into()),
    };
    let first = accessor.load_input_field(Source::Input, 0, InputField::OutPoint)?;
    let out_point = schema::decode_outpoint(&first)?;
    Ok(args.out_point == out_point)
}

/// The `Updating` state check: exactly one cell with this script's hash in
/// the input group and exactly one in the output group, probed through
/// zero-length field reads.
pub fn verify_update<A: LedgerAccessor>(accessor: &A) -> Result<()> {
    let in_count = aggregate::fold(
        0usize,
        |i| to_step(accessor.probe_input(Source::GroupInput, i, InputField::Since)),
        |count, ()| {
            *count += 1;
            if *count > 1 {
                debug!("more than one identity cell in input group");
                return Err(Error::IdentityViolation);
            }
            Ok(())
        },
    )?;
    let out_count = aggregate::fold(
        0usize,
        |i| to_step(accessor.probe_cell(Source::GroupOutput, i, CellField::Capacity)),
        |count, ()| {
            *count += 1;
            if *count > 1 {
                debug!("more than one identity cell in output group");
                return Err(Error::IdentityViolation);
            }
            Ok(())
        },
    )?;
    if in_count == 1 && out_count == 1 {
        Ok(())
    } else {
        Err(Error::IdentityViolation)
    }
}

fn to_step(result: std::result::Result<(), LoadError>) -> Result<Step<()>> {
    aggregate::step_from(result).map_err(Error::from)
}
