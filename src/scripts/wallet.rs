//! The payment-rate wallet lock.
//!
//! A wallet cell accrues payment from the scripts associated with it and
//! releases funds only to its owner (signed override) or through an
//! algorithmically verified top-up: the one wallet cell on each side of the
//! transaction must keep its token type, and the capacity/token deltas must
//! meet the configured rates.
use super::ExitCode;
use crate::aggregate::{self, Step};
use crate::auth::{self, Credential, SignatureVerifier};
use crate::cell::types::ScriptHash;
use crate::ledger::{CellField, LedgerAccessor, LoadError, Source};
use crate::schema::{self, WalletArgs};

use tracing::debug;

#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    ArgumentsLen,
    Encoding(String),
    Syscall(String),
    ScriptTooLong,
    /// 0 or ≥2 wallet cells in this lock's input or output group.
    WalletQuantity,
    /// Token delta below the required rate (or not strictly positive).
    AmountError,
    /// More than one matching dependency cell in unique-script mode.
    UniqueScriptViolation,
    /// A matching dependency cell without a type script in unique-script mode.
    UniqueScriptMissingType,
    /// A matching dependency cell whose type hash is not the configured
    /// reusable-script hash.
    UniqueScriptMismatch,
    /// Dependency cell field load failed.
    CellDepLoad,
    /// A wallet cell without a type script.
    WalletCellMissingType,
    /// A wallet cell whose type hash is not the configured token type.
    TokenTypeMismatch,
    /// Capacity delta neither zero nor at the configured rate.
    WalletUnlock,
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

impl std::convert::From<auth::Error> for Error {
    fn from(error: auth::Error) -> Self {
        match error {
            auth::Error::Syscall(s) => Error::Syscall(s),
            auth::Error::Encoding(s) => Error::Encoding(s),
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
            Error::WalletQuantity => -47,
            Error::AmountError => -48,
            Error::UniqueScriptViolation => -49,
            Error::UniqueScriptMissingType => -50,
            Error::UniqueScriptMismatch => -51,
            Error::CellDepLoad => -52,
            Error::WalletCellMissingType => -53,
            Error::TokenTypeMismatch => -54,
            Error::WalletUnlock => -58,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// The matched wallet cell on one side of the transaction.
#[derive(Debug, Default, Eq, PartialEq)]
struct WalletSide {
    count: usize,
    capacity: u64,
    amount: u128,
}

/// Verify one execution of the wallet lock against the transaction snapshot.
///
/// A valid owner credential bypasses the rate rules entirely; otherwise the
/// transaction must keep exactly one wallet cell of the configured token
/// type on each side and meet the capacity and token rates.
///
/// ## Parameters
/// * `accessor` - this script's view of the transaction under verification.
/// * `verifier` - the external signature-verification collaborator.
pub fn verify<A: LedgerAccessor, V: SignatureVerifier>(accessor: &A, verifier: &V) -> Result<()> {
    let script = schema::decode_script(&accessor.script()?)?;
    let args = WalletArgs::decode(&script.args)?;
    let lock_hash = accessor.script_hash()?;

    if let Credential::Present(credential) = auth::probe_signature(accessor)? {
        let tx_hash = accessor.tx_hash()?;
        if verifier.verify(&args.pubkey_hash, &credential, &tx_hash) {
            debug!("owner credential validated, bypassing rate rules");
            return Ok(());
        }
        debug!("owner credential rejected, falling through to rate rules");
    }

    let required_token_rate = required_rate(accessor, &args, &lock_hash)?;
    let input = scan_side(accessor, Source::GroupInput, &args)?;
    let output = scan_side(accessor, Source::GroupOutput, &args)?;

    // Token payment must be strictly positive; an unchanged capacity is
    // accepted, otherwise the capacity delta must meet its rate. The
    // asymmetry between the two deltas is source behavior.
    let token_ok = output.amount > input.amount
        && output.amount - input.amount >= required_token_rate;
    if !token_ok {
        debug!("token delta below required rate");
        return Err(Error::AmountError);
    }
    let capacity_ok = output.capacity == input.capacity
        || (output.capacity > input.capacity
            && output.capacity - input.capacity >= args.capacity_rate);
    if !capacity_ok {
        return Err(Error::WalletUnlock);
    }
    Ok(())
}

/// Compute the required token payment: the base rate plus one increment for
/// every dependency cell sharing this lock's hash ("many payers, one
/// wallet" fan-in). In unique-script mode at most one matching dependency
/// cell is allowed, and its type hash must equal the configured
/// reusable-script hash.
fn required_rate<A: LedgerAccessor>(
    accessor: &A,
    args: &WalletArgs,
    lock_hash: &ScriptHash,
) -> Result<u128> {
    let (required, _matching) = aggregate::fold(
        (args.token_rate, 0usize),
        |i| match accessor.load_cell_field(Source::CellDep, i, CellField::LockHash) {
            Ok(hash) => Ok(Step::Keep((i, hash))),
            Err(LoadError::IndexOutOfBound) => Ok(Step::Done),
            Err(_) => Err(Error::CellDepLoad),
        },
        |(required, matching), (i, hash)| {
            if hash.as_slice() != &lock_hash[..] {
                return Ok(());
            }
            *matching += 1;
            *required += args.token_rate;
            if let Some(reusable_hash) = args.reusable_script_hash {
                if *matching > 1 {
                    return Err(Error::UniqueScriptViolation);
                }
                let type_hash =
                    match accessor.load_cell_field(Source::CellDep, i, CellField::TypeHash) {
                        Ok(hash) => hash,
                        Err(LoadError::ItemMissing) => {
                            return Err(Error::UniqueScriptMissingType)
                        }
                        Err(err) => return Err(err.into()),
                    };
                if type_hash.as_slice() != &reusable_hash[..] {
                    return Err(Error::UniqueScriptMismatch);
                }
            }
            Ok(())
        },
    )?;
    Ok(required)
}

/// Locate the single wallet cell in one group and record its capacity and
/// token amount. Every cell in the group must carry the configured token
/// type; 0 or ≥2 wallet cells is a quantity violation.
fn scan_side<A: LedgerAccessor>(
    accessor: &A,
    source: Source,
    args: &WalletArgs,
) -> Result<WalletSide> {
    let side = aggregate::fold(
        WalletSide::default(),
        |i| match accessor.load_cell_field(source, i, CellField::TypeHash) {
            Ok(hash) => Ok(Step::Keep((i, hash))),
            Err(LoadError::IndexOutOfBound) => Ok(Step::Done),
            Err(LoadError::ItemMissing) => Err(Error::WalletCellMissingType),
            Err(err) => Err(err.into()),
        },
        |side, (i, type_hash)| {
            if type_hash.as_slice() != &args.token_type[..] {
                return Err(Error::TokenTypeMismatch);
            }
            side.count += 1;
            if side.count > 1 {
                return Err(Error::WalletQuantity);
            }
            let data = accessor.load_cell_data(source, i)?;
            side.amount = schema::decode_amount_u128(&data)?;
            let capacity = accessor.load_cell_field(source, i, CellField::Capacity)?;
            side.capacity = schema::Reader::new(&capacity, 8)?.u64_le(0)?;
            Ok(())
        },
    )?;
    if side.count == 0 {
        return Err(Error::WalletQuantity);
    }
    Ok(side)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cell::{Cell, OutPoint, Script};
    use crate::ledger::{InputCell, TransactionView};

    fn reusable_type() -> Script {
        Script::new([5u8; 32], vec![])
    }

    fn wallet_args(capacity_rate: u64, token_rate: u128, unique: bool) -> WalletArgs {
        WalletArgs {
            pubkey_hash: [9u8; 20],
            capacity_rate,
            token_rate,
            token_type: Script::new([2u8; 32], vec![]).hash(),
            reusable_script_hash: if unique { Some(reusable_type().hash()) } else { None },
        }
    }

    fn wallet_cell(lock: &Script, capacity: u64, amount: u128) -> Cell {
        Cell::new(
            capacity,
            lock.clone(),
            Some(Script::new([2u8; 32], vec![])),
            amount.to_le_bytes().to_vec(),
        )
    }

    struct Rejector;
    impl SignatureVerifier for Rejector {
        fn verify(&self, _: &[u8; 20], _: &[u8], _: &[u8; 32]) -> bool {
            false
        }
    }

    fn wallet_tx(
        args: &WalletArgs,
        input: (u64, u128),
        output: (u64, u128),
        deps: Vec<Cell>,
    ) -> (TransactionView, Script) {
        let lock = Script::new([1u8; 32], args.encode());
        let tx = TransactionView::new(
            vec![InputCell::new(
                OutPoint::new([0u8; 32], 0),
                wallet_cell(&lock, input.0, input.1),
            )],
            vec![wallet_cell(&lock, output.0, output.1)],
            vec![],
            deps,
        );
        (tx, lock)
    }

    #[test]
    fn test_rate_fan_in_counts_matching_deps() {
        // Two dependency cells carry the wallet's own lock hash, so the
        // required payment is three rate increments in total.
        // Required payment: base 50 plus one increment per matching dep = 150.
        let args = wallet_args(0, 50, false);
        let lock = Script::new([1u8; 32], args.encode());
        let dep = wallet_cell(&lock, 1, 0);
        let (tx, lock) = wallet_tx(&args, (100, 200), (100, 350), vec![dep.clone(), dep]);
        let ctx = tx.lock_context(lock.clone());
        assert_eq!(verify(&ctx, &Rejector), Ok(()));

        let (tx, lock) = {
            let dep = wallet_cell(&lock, 1, 0);
            wallet_tx(&args, (100, 200), (100, 340), vec![dep.clone(), dep])
        };
        let ctx = tx.lock_context(lock);
        assert_eq!(verify(&ctx, &Rejector), Err(Error::AmountError));
    }

    #[test]
    fn test_unique_mode_rejects_second_matching_dep() {
        let args = wallet_args(0, 50, true);
        let lock = Script::new([1u8; 32], args.encode());
        let dep = Cell::new(1, lock.clone(), Some(reusable_type()), vec![]);
        let (tx, _) = wallet_tx(&args, (100, 200), (100, 400), vec![dep.clone(), dep]);
        let ctx = tx.lock_context(lock);
        assert_eq!(verify(&ctx, &Rejector), Err(Error::UniqueScriptViolation));
    }

    #[test]
    fn test_unique_mode_requires_reusable_type_hash() {
        let args = wallet_args(0, 50, true);
        let lock = Script::new([1u8; 32], args.encode());

        let untyped = Cell::new(1, lock.clone(), None, vec![]);
        let (tx, _) = wallet_tx(&args, (100, 200), (100, 300), vec![untyped]);
        assert_eq!(
            verify(&tx.lock_context(lock.clone()), &Rejector),
            Err(Error::UniqueScriptMissingType)
        );

        let wrong_type = Cell::new(1, lock.clone(), Some(Script::new([6u8; 32], vec![])), vec![]);
        let (tx, _) = wallet_tx(&args, (100, 200), (100, 300), vec![wrong_type]);
        assert_eq!(
            verify(&tx.lock_context(lock), &Rejector),
            Err(Error::UniqueScriptMismatch)
        );
    }

    #[test]
    fn test_two_wallets_on_one_side_rejected() {
        let args = wallet_args(0, 50, false);
        let lock = Script::new([1u8; 32], args.encode());
        let tx = TransactionView::new(
            vec![
                InputCell::new(OutPoint::new([0u8; 32], 0), wallet_cell(&lock, 100, 100)),
                InputCell::new(OutPoint::new([0u8; 32], 1), wallet_cell(&lock, 100, 100)),
            ],
            vec![wallet_cell(&lock, 100, 300)],
            vec![],
            vec![],
        );
        assert_eq!(
            verify(&tx.lock_context(lock), &Rejector),
            Err(Error::WalletQuantity)
        );
    }

    #[test]
    fn test_wallet_cell_must_keep_token_type() {
        let args = wallet_args(0, 50, false);
        let lock = Script::new([1u8; 32], args.encode());
        let mut other = wallet_cell(&lock, 100, 300);
        other.type_ = Some(Script::new([7u8; 32], vec![]));
        let tx = TransactionView::new(
            vec![InputCell::new(OutPoint::new([0u8; 32], 0), wallet_cell(&lock, 100, 100))],
            vec![other],
            vec![],
            vec![],
        );
        assert_eq!(
            verify(&tx.lock_context(lock), &Rejector),
            Err(Error::TokenTypeMismatch)
        );
    }
}
