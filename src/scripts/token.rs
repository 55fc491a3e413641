//! The fungible-token conservation rules.
//!
//! Two modes share this module. [verify] is the governance mode: unless the
//! configured governance lock appears among the transaction's global inputs,
//! the summed output amounts of this type-group may not exceed the summed
//! input amounts. It serves both amount-record widths.
//!
//! [verify_instance] is the instance-definition mode used by the supply
//! flow: the script args are the token's creating out point, creation is
//! accepted outright, and when the matching info cell appears among the
//! outputs the amount check is deferred to the supply engine (which compares
//! the instance-sum delta against the supply delta). Without an info cell
//! the sums must be exactly equal on both sides.
use super::ExitCode;
use crate::aggregate::{self, Step, SumError};
use crate::cell::OUTPOINT_SIZE;
use crate::ledger::{CellField, InputField, LedgerAccessor, LoadError, Source};
use crate::schema::{self, AmountWidth, IdentityArgs, TokenDefArgs};

use tracing::debug;

#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    ArgumentsLen,
    Encoding(String),
    Syscall(String),
    ScriptTooLong,
    /// Conservation violated, or a malformed amount record in instance mode.
    AmountError,
    /// The first global input's out point could not be loaded.
    OutPointLoad,
    /// The first global input's out point failed to decode.
    OutPointEncoding,
    /// Out point index field of the wrong size.
    OutPointIndexSize,
    /// Out point transaction hash of the wrong size.
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
            schema::Error::ArgumentsLen { .. } => Error::ArgumentsLen,
            schema::Error::ScriptTooLong => Error::ScriptTooLong,
            other => Error::Encoding(format!("{:?}", other)),
        }
    }
}

impl std::convert::From<SumError> for Error {
    fn from(error: SumError) -> Self {
        match error {
            SumError::Load(err) => err.into(),
            SumError::Decode(err) => err.into(),
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
            Error::AmountError => -52,
            Error::OutPointLoad => -53,
            Error::OutPointEncoding => -54,
            Error::OutPointIndexSize => -55,
            Error::OutPointHashSize => -56,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Verify one execution of the governance-mode token script as the type of
/// every cell in its group.
///
/// Malformed amount records reject the transaction regardless of mint
/// authority; the governance exception only disables the conservation
/// comparison itself.
///
/// ## Parameters
/// * `accessor` - this script's view of the transaction under verification.
/// * `width` - the amount-record width of this token variant.
pub fn verify<A: LedgerAccessor>(accessor: &A, width: AmountWidth) -> Result<()> {
    let script = schema::decode_script(&accessor.script()?)?;
    let args = TokenDefArgs::decode(&script.args)?;

    // Summing decodes every record, so ill-sized payloads fail here even
    // when the governance path would accept the transaction.
    let input_total = aggregate::sum_amounts(accessor, Source::GroupInput, width)?;
    let output_total = aggregate::sum_amounts(accessor, Source::GroupOutput, width)?;

    if aggregate::any_lock_hash(accessor, Source::Input, &args.governance_lock_hash)? {
        debug!("governance lock present, conservation not enforced");
        return Ok(());
    }

    if output_total > input_total {
        debug!("conservation violated");
        return Err(Error::AmountError);
    }
    Ok(())
}

/// Verify one execution of the instance-definition token script.
///
/// The args are the 36 byte creating out point (no role flag). Creation is
/// accepted outright. Otherwise, when the info cell of the same identity
/// appears among the global outputs the amount check belongs to the supply
/// engine and this script accepts; without one the group sums must be
/// exactly equal, in both directions.
pub fn verify_instance<A: LedgerAccessor>(accessor: &A) -> Result<()> {
    // Amount records are validated on both sides up front, before any mode
    // decision.
    let input_total = sum_instance_amounts(accessor, Source::GroupInput)?;
    let output_total = sum_instance_amounts(accessor, Source::GroupOutput)?;

    let script = schema::decode_script(&accessor.script()?)?;
    let args = IdentityArgs::decode(&script.args)?;
    if args.role_flag.is_some() {
        // Instance args carry the bare out point; the flagged form belongs
        // to the info cell.
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
        debug!("token definition creation accepted");
        return Ok(());
    }

    if info_cell_in_output(accessor, &args.id_bytes())? {
        debug!("info cell present, deferring to the supply rule");
        return Ok(());
    }

    if input_total != output_total {
        debug!("instance sums unequal without an info cell");
        return Err(Error::AmountError);
    }
    Ok(())
}

/// Sum the 8 byte amount records of one instance group side; a record of the
/// wrong width is an amount violation here, not an encoding one.
fn sum_instance_amounts<A: LedgerAccessor>(accessor: &A, source: Source) -> Result<u64> {
    aggregate::fold(
        0u64,
        |i| aggregate::step_from(accessor.load_cell_data(source, i)).map_err(Error::from),
        |total, data| {
            let amount = schema::decode_amount_u64(&data).map_err(|_| Error::AmountError)?;
            *total += amount;
            Ok(())
        },
    )
}

/// Whether any global output carries the info cell of `id`: a type script
/// whose args are the 36 byte identity followed by a role flag of `1`.
fn info_cell_in_output<A: LedgerAccessor>(
    accessor: &A,
    id: &[u8; OUTPOINT_SIZE],
) -> Result<bool> {
    aggregate::fold(
        false,
        |i| match accessor.load_cell_field(Source::Output, i, CellField::Type) {
            Ok(bytes) => Ok(Step::Keep(bytes)),
            Err(LoadError::IndexOutOfBound) => Ok(Step::Done),
            // Typeless outputs cannot be info cells.
            Err(LoadError::ItemMissing) => Ok(Step::Skip),
            Err(err) => Err(err.into()),
        },
        |found, bytes| {
            let type_script = schema::decode_script(&bytes)?;
            if type_script.args.len() == OUTPOINT_SIZE + 1
                && type_script.args[OUTPOINT_SIZE] == 1
                && type_script.args[..OUTPOINT_SIZE] == id[..]
            {
                *found = true;
            }
            Ok(())
        },
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cell::{Cell, OutPoint, Script};
    use crate::ledger::{InputCell, TransactionView};

    fn token_type(governance_hash: [u8; 32]) -> Script {
        Script::new([3u8; 32], governance_hash.to_vec())
    }

    fn token_cell(type_: &Script, owner: u8, amount: u128) -> Cell {
        Cell::new(
            100,
            Script::new([0u8; 32], vec![owner]),
            Some(type_.clone()),
            amount.to_le_bytes().to_vec(),
        )
    }

    fn token_input(type_: &Script, owner: u8, amount: u128) -> InputCell {
        InputCell::new(OutPoint::new([0u8; 32], 0), token_cell(type_, owner, amount))
    }

    #[test]
    fn test_conservation_holds() {
        let governance = Script::new([9u8; 32], vec![]);
        let type_ = token_type(governance.hash());
        let tx = TransactionView::new(
            vec![token_input(&type_, 1, 300), token_input(&type_, 2, 200)],
            vec![token_cell(&type_, 3, 500)],
            vec![],
            vec![],
        );
        let ctx = tx.type_context(type_);
        assert_eq!(verify(&ctx, AmountWidth::U128), Ok(()));
    }

    #[test]
    fn test_inflation_without_governance_rejected() {
        let governance = Script::new([9u8; 32], vec![]);
        let type_ = token_type(governance.hash());
        let tx = TransactionView::new(
            vec![token_input(&type_, 1, 500)],
            vec![token_cell(&type_, 2, 501)],
            vec![],
            vec![],
        );
        let ctx = tx.type_context(type_);
        assert_eq!(verify(&ctx, AmountWidth::U128), Err(Error::AmountError));
    }

    #[test]
    fn test_governance_input_authorizes_mint() {
        let governance = Script::new([9u8; 32], vec![]);
        let type_ = token_type(governance.hash());
        // The governance cell itself is outside the type group; its lock
        // hash among the global inputs is what authorizes the mint.
        let governance_input = InputCell::new(
            OutPoint::new([1u8; 32], 0),
            Cell::new(50, governance.clone(), None, vec![]),
        );
        let tx = TransactionView::new(
            vec![token_input(&type_, 1, 500), governance_input],
            vec![token_cell(&type_, 2, 900)],
            vec![],
            vec![],
        );
        let ctx = tx.type_context(type_);
        assert_eq!(verify(&ctx, AmountWidth::U128), Ok(()));
    }

    #[test]
    fn test_malformed_record_rejected_even_with_governance() {
        let governance = Script::new([9u8; 32], vec![]);
        let type_ = token_type(governance.hash());
        let governance_input = InputCell::new(
            OutPoint::new([1u8; 32], 0),
            Cell::new(50, governance.clone(), None, vec![]),
        );
        let mut bad = token_cell(&type_, 2, 900);
        bad.data = vec![1, 2, 3];
        let tx = TransactionView::new(
            vec![token_input(&type_, 1, 500), governance_input],
            vec![bad],
            vec![],
            vec![],
        );
        let ctx = tx.type_context(type_);
        assert!(matches!(verify(&ctx, AmountWidth::U128), Err(Error::Encoding(_))));
    }

    #[test]
    fn test_u64_width_variant() {
        let governance = Script::new([9u8; 32], vec![]);
        let type_ = token_type(governance.hash());
        let narrow = |owner: u8, amount: u64| {
            Cell::new(
                100,
                Script::new([0u8; 32], vec![owner]),
                Some(type_.clone()),
                amount.to_le_bytes().to_vec(),
            )
        };
        let tx = TransactionView::new(
            vec![InputCell::new(OutPoint::new([0u8; 32], 0), narrow(1, 500))],
            vec![narrow(2, 400)],
            vec![],
            vec![],
        );
        let ctx = tx.type_context(type_.clone());
        assert_eq!(verify(&ctx, AmountWidth::U64), Ok(()));
        // A 16 byte read of those same cells is a size mismatch.
        assert!(matches!(verify(&ctx, AmountWidth::U128), Err(Error::Encoding(_))));
    }

    fn instance_script(id: &OutPoint) -> Script {
        Script::new([4u8; 32], id.to_bytes().to_vec())
    }

    fn info_script(id: &OutPoint) -> Script {
        let mut args = id.to_bytes().to_vec();
        args.push(1);
        Script::new([4u8; 32], args)
    }

    fn instance_cell(id: &OutPoint, owner: u8, amount: u64) -> Cell {
        Cell::new(
            100,
            Script::new([0u8; 32], vec![owner]),
            Some(instance_script(id)),
            amount.to_le_bytes().to_vec(),
        )
    }

    fn plain_input(seed: u8) -> InputCell {
        InputCell::new(
            OutPoint::new([seed; 32], seed as u32),
            Cell::new(100, Script::new([0u8; 32], vec![seed]), None, vec![]),
        )
    }

    #[test]
    fn test_instance_creation_accepted_with_unequal_sums() {
        let first = plain_input(7);
        let id = first.out_point.clone();
        let tx = TransactionView::new(
            vec![first],
            vec![instance_cell(&id, 1, 1_000_000)],
            vec![],
            vec![],
        );
        assert_eq!(verify_instance(&tx.type_context(instance_script(&id))), Ok(()));
    }

    #[test]
    fn test_instance_sums_must_be_equal_without_info_cell() {
        let id = OutPoint::new([9u8; 32], 3);
        let transfer = TransactionView::new(
            vec![
                plain_input(7),
                InputCell::new(OutPoint::new([8u8; 32], 0), instance_cell(&id, 1, 600)),
            ],
            vec![instance_cell(&id, 2, 400), instance_cell(&id, 3, 200)],
            vec![],
            vec![],
        );
        assert_eq!(verify_instance(&transfer.type_context(instance_script(&id))), Ok(()));

        // A decrease rejects too: equality runs in both directions.
        let burn = TransactionView::new(
            vec![
                plain_input(7),
                InputCell::new(OutPoint::new([8u8; 32], 0), instance_cell(&id, 1, 600)),
            ],
            vec![instance_cell(&id, 2, 500)],
            vec![],
            vec![],
        );
        assert_eq!(
            verify_instance(&burn.type_context(instance_script(&id))),
            Err(Error::AmountError)
        );
    }

    #[test]
    fn test_info_cell_in_output_defers_amount_check() {
        let id = OutPoint::new([9u8; 32], 3);
        let info = Cell::new(
            100,
            Script::new([0u8; 32], vec![0]),
            Some(info_script(&id)),
            1100u64.to_le_bytes().to_vec(),
        );
        let tx = TransactionView::new(
            vec![
                plain_input(7),
                InputCell::new(OutPoint::new([8u8; 32], 0), instance_cell(&id, 1, 1000)),
            ],
            vec![instance_cell(&id, 1, 1000), instance_cell(&id, 2, 100), info],
            vec![],
            vec![],
        );
        // Sums differ by the minted 100, but the info cell hands the
        // comparison to the supply rule.
        assert_eq!(verify_instance(&tx.type_context(instance_script(&id))), Ok(()));
    }

    #[test]
    fn test_info_cell_of_another_identity_does_not_defer() {
        let id = OutPoint::new([9u8; 32], 3);
        let other = OutPoint::new([9u8; 32], 4);
        let foreign_info = Cell::new(
            100,
            Script::new([0u8; 32], vec![0]),
            Some(info_script(&other)),
            1100u64.to_le_bytes().to_vec(),
        );
        let tx = TransactionView::new(
            vec![
                plain_input(7),
                InputCell::new(OutPoint::new([8u8; 32], 0), instance_cell(&id, 1, 1000)),
            ],
            vec![instance_cell(&id, 2, 1100), foreign_info],
            vec![],
            vec![],
        );
        assert_eq!(
            verify_instance(&tx.type_context(instance_script(&id))),
            Err(Error::AmountError)
        );
    }

    #[test]
    fn test_instance_args_reject_role_flag() {
        let id = OutPoint::new([9u8; 32], 3);
        let tx = TransactionView::new(
            vec![
                plain_input(7),
                InputCell::new(OutPoint::new([8u8; 32], 0), instance_cell(&id, 1, 600)),
            ],
            vec![instance_cell(&id, 2, 600)],
            vec![],
            vec![],
        );
        // Running with the flagged (info) form of the args is a length error.
        let ctx = tx.type_context(info_script(&id));
        assert_eq!(verify_instance(&ctx), Err(Error::ArgumentsLen));
    }

    #[test]
    fn test_instance_malformed_record_is_amount_error() {
        let id = OutPoint::new([9u8; 32], 3);
        let mut bad = instance_cell(&id, 1, 600);
        bad.data = vec![1, 2, 3];
        let tx = TransactionView::new(
            vec![
                plain_input(7),
                InputCell::new(OutPoint::new([8u8; 32], 0), bad),
            ],
            vec![],
            vec![],
            vec![],
        );
        assert_eq!(
            verify_instance(&tx.type_context(instance_script(&id))),
            Err(Error::AmountError)
        );
    }
}
