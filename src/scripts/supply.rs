//! The info-cell supply rule, an extension of the identity update path.
//!
//! The info cell's data payload carries the token's total supply. Across a
//! transaction the supply may stay unchanged (with unchanged instance sums)
//! or strictly increase by exactly the increase of the summed instance
//! amounts (an authorized mint). Any supply decrease is an unauthorized
//! burn, and any mint whose instance-sum delta does not match the supply
//! delta is invalid.
use super::identity;
use super::ExitCode;
use crate::aggregate::{self, Step};
use crate::cell::OUTPOINT_SIZE;
use crate::ledger::{CellField, InputField, LedgerAccessor, LoadError, Source};
use crate::schema::{self, IdentityArgs, Reader};

use tracing::debug;

#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    ArgumentsLen,
    Encoding(String),
    Syscall(String),
    ScriptTooLong,
    /// The first global input's out point could not be loaded.
    OutPointLoad,
    /// The first global input's out point failed to decode.
    OutPointEncoding,
    /// Out point index field of the wrong size.
    OutPointIndexSize,
    /// Out point transaction hash of the wrong size.
    OutPointHashSize,
    /// Total supply decreased.
    UnauthorizedBurn,
    /// The info cell failed the one-in/one-out uniqueness check.
    IdentityViolation,
    /// Supply delta and instance-sum delta disagree.
    MintValidation,
    /// An info or instance data payload too short for its amount field.
    DataField,
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
            schema::Error::ArgumentsLen { .. } => Error::ArgumentsLen,
            schema::Error::ScriptTooLong => Error::ScriptTooLong,
            other => Error::Encoding(format!("{:?}", other)),
        }
    }
}

impl std::convert::From<identity::Error> for Error {
    fn from(error: identity::Error) -> Self {
        match error {
            identity::Error::IdentityViolation => Error::IdentityViolation,
            identity::Error::OutPointIndexSize => Error::OutPointIndexSize,
            identity::Error::OutPointHashSize => Error::OutPointHashSize,
            identity::Error::Encoding(s) => Error::Encoding(s),
            identity::Error::Syscall(s) => Error::Syscall(s),
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
            Error::ArgumentsLen => -1,
            Error::Encoding(_) => -2,
            Error::Syscall(_) => -3,
            Error::ScriptTooLong => -21,
            Error::OutPointLoad => -53,
            Error::OutPointEncoding => -54,
            Error::OutPointIndexSize => -55,
            Error::OutPointHashSize => -56,
            Error::UnauthorizedBurn => -58,
            Error::IdentityViolation => -61,
            Error::MintValidation => -62,
            Error::DataField => -63,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Verify one execution of the info-cell type script.
///
/// Creation transactions (args bound to the first input's out point) are
/// accepted outright; updates must keep the info cell unique and satisfy
/// the supply/instance-sum relation.
pub fn verify<A: LedgerAccessor>(accessor: &A) -> Result<()> {
    let script = schema::decode_script(&accessor.script()?)?;
    let args = IdentityArgs::decode(&script.args)?;
    // The info cell always carries the role flag.
    if args.role_flag.is_none() {
        return Err(Error::ArgumentsLen);
    }

    let first = accessor
        .load_input_field(Source::Input, 0, InputField::OutPoint)
        .map_err(|_| Error::OutPointLoad)?;
    let first_out_point = schema::decode_outpoint(&first).map_err(|err| match err {
        schema::Error::OutPointHashSize => Error::OutPointHashSize,
        schema::Error::OutPointIndexSize => Error::OutPointIndexSize,
        _ => Error::OutPointEncoding,
    })?;

    if args.out_point == first_out_point {
        debug!("info cell creation accepted");
        return Ok(());
    }

    identity::verify_update(accessor)?;

    let in_supply = total_supply(accessor, Source::GroupInput)?;
    let out_supply = total_supply(accessor, Source::GroupOutput)?;
    let id = args.id_bytes();
    let in_instances = instance_sum(accessor, Source::Input, &id)?;
    let out_instances = instance_sum(accessor, Source::Output, &id)?;

    if out_supply < in_supply {
        debug!("total supply decreased");
        return Err(Error::UnauthorizedBurn);
    }
    let supply_delta = out_supply - in_supply;
    if supply_delta > 0 || out_instances > in_instances {
        if out_instances > in_instances && out_instances - in_instances == supply_delta {
            debug!("mint validated");
            Ok(())
        } else {
            debug!("mint delta mismatch");
            Err(Error::MintValidation)
        }
    } else {
        Ok(())
    }
}

/// The `total_supply` field: the first 8 bytes of the info cell's data
/// payload on the given side.
fn total_supply<A: LedgerAccessor>(accessor: &A, source: Source) -> Result<u64> {
    let data = accessor.load_cell_data(source, 0)?;
    if data.len() < 8 {
        return Err(Error::DataField);
    }
    let reader = Reader::new(&data, data.len()).map_err(|_| Error::DataField)?;
    reader.u64_le(0).map_err(|_| Error::DataField)
}

/// Sum the instance amounts across all global cells of `source` whose type
/// script args equal the 36 byte compound identity.
fn instance_sum<A: LedgerAccessor>(
    accessor: &A,
    source: Source,
    id: &[u8; OUTPOINT_SIZE],
) -> Result<u64> {
    aggregate::fold(
        0u64,
        |i| match accessor.load_cell_field(source, i, CellField::Type) {
            Ok(bytes) => Ok(Step::Keep((i, bytes))),
            Err(LoadError::IndexOutOfBound) => Ok(Step::Done),
            // Cells without a type script cannot be instances.
            Err(LoadError::ItemMissing) => Ok(Step::Skip),
            Err(err) => Err(err.into()),
        },
        |total, (i, bytes)| {
            let type_script = schema::decode_script(&bytes)?;
            if type_script.args.len() != OUTPOINT_SIZE
                || type_script.args.as_slice() != &id[..]
            {
                return Ok(());
            }
            let data = accessor.load_cell_data(source, i)?;
            let amount = schema::decode_amount_u64(&data).map_err(|_| Error::DataField)?;
            *total += amount;
            Ok(())
        },
    )
}
