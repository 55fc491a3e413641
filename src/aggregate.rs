//! The cell-group aggregator: the single iteration-protocol driver shared by
//! every rule engine.
//!
//! Callers probe indices `0, 1, 2, …` against the ledger accessor until it
//! reports [LoadError::IndexOutOfBound]; [step_from] maps that sentinel to
//! [Step::Done] and keeps all other accessor failures fatal. Each loop is
//! thereby bounded by the number of cells in the selected set.
use crate::ledger::{CellField, LedgerAccessor, LoadError, Source};
use crate::schema::{self, AmountWidth};

/// Outcome of probing one index.
pub enum Step<T> {
    /// The selected cell set is exhausted; the fold terminates.
    Done,
    /// A value was extracted at this index.
    Keep(T),
    /// The cell at this index does not participate (e.g. its lock hash does
    /// not match a filter).
    Skip,
}

/// Drive the iteration protocol: call `probe` with each index and fold every
/// kept value into `state`. `fold` may abort early by returning an error.
pub fn fold<S, T, E, P, F>(mut state: S, mut probe: P, mut fold: F) -> Result<S, E>
where
    P: FnMut(usize) -> Result<Step<T>, E>,
    F: FnMut(&mut S, T) -> Result<(), E>,
{
    let mut index = 0;
    loop {
        match probe(index)? {
            Step::Done => return Ok(state),
            Step::Keep(value) => fold(&mut state, value)?,
            Step::Skip => (),
        }
        index += 1;
    }
}

/// Interpret a raw accessor result as a [Step], mapping the out-of-bound
/// sentinel to termination. [LoadError::ItemMissing] stays an error here;
/// callers that tolerate absent fields match on it before converting.
pub fn step_from<T>(result: Result<T, LoadError>) -> Result<Step<T>, LoadError> {
    match result {
        Ok(value) => Ok(Step::Keep(value)),
        Err(LoadError::IndexOutOfBound) => Ok(Step::Done),
        Err(err) => Err(err),
    }
}

/// Count the cells of `source`, probing `field` existence only.
pub fn count_cells<A: LedgerAccessor>(
    accessor: &A,
    source: Source,
    field: CellField,
) -> Result<usize, LoadError> {
    fold(
        0usize,
        |i| step_from(accessor.probe_cell(source, i, field)),
        |count, ()| {
            *count += 1;
            Ok(())
        },
    )
}

/// Sum the fixed-width amount records held in the data payloads of every
/// cell in `source`. Records of the wrong width abort the aggregation.
pub fn sum_amounts<A: LedgerAccessor>(
    accessor: &A,
    source: Source,
    width: AmountWidth,
) -> Result<u128, SumError> {
    fold(
        0u128,
        |i| step_from(accessor.load_cell_data(source, i)).map_err(SumError::Load),
        |total, data| {
            let amount = width.decode(&data).map_err(SumError::Decode)?;
            *total += amount;
            Ok(())
        },
    )
}

/// Whether any cell in `source` carries a lock hash equal to `target`.
pub fn any_lock_hash<A: LedgerAccessor>(
    accessor: &A,
    source: Source,
    target: &[u8; 32],
) -> Result<bool, LoadError> {
    fold(
        false,
        |i| step_from(accessor.load_cell_field(source, i, CellField::LockHash)),
        |found, hash| {
            if hash.as_slice() == &target[..] {
                *found = true;
            }
            Ok(())
        },
    )
}

/// Count the cells in `source` whose lock hash equals `target`.
pub fn count_lock_hash<A: LedgerAccessor>(
    accessor: &A,
    source: Source,
    target: &[u8; 32],
) -> Result<usize, LoadError> {
    fold(
        0usize,
        |i| step_from(accessor.load_cell_field(source, i, CellField::LockHash)),
        |count, hash| {
            if hash.as_slice() == &target[..] {
                *count += 1;
            }
            Ok(())
        },
    )
}

/// Failure of a [sum_amounts] aggregation.
#[derive(Debug, Eq, PartialEq)]
pub enum SumError {
    Load(LoadError),
    Decode(schema::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cell::{Cell, OutPoint, Script};
    use crate::ledger::{CellField, InputCell, TransactionView};

    fn amount_cell(lock_args: u8, amount: u128) -> Cell {
        Cell::new(
            100,
            Script::new([0u8; 32], vec![lock_args]),
            None,
            amount.to_le_bytes().to_vec(),
        )
    }

    #[test]
    fn test_fold_terminates_on_out_of_bound() {
        let tx = TransactionView::new(
            vec![
                InputCell::new(OutPoint::new([0u8; 32], 0), amount_cell(1, 10)),
                InputCell::new(OutPoint::new([0u8; 32], 1), amount_cell(1, 20)),
            ],
            vec![],
            vec![],
            vec![],
        );
        let ctx = tx.lock_context(Script::new([0u8; 32], vec![1]));
        assert_eq!(count_cells(&ctx, Source::GroupInput, CellField::Capacity).unwrap(), 2);
        assert_eq!(
            sum_amounts(&ctx, Source::GroupInput, AmountWidth::U128).unwrap(),
            30
        );
        assert_eq!(sum_amounts(&ctx, Source::Output, AmountWidth::U128).unwrap(), 0);
    }

    #[test]
    fn test_early_abort_propagates() {
        let tx = TransactionView::new(
            vec![InputCell::new(
                OutPoint::new([0u8; 32], 0),
                Cell::new(100, Script::new([0u8; 32], vec![1]), None, vec![1, 2, 3]),
            )],
            vec![],
            vec![],
            vec![],
        );
        let ctx = tx.lock_context(Script::new([0u8; 32], vec![1]));
        // 3 byte payload is not a valid 16 byte amount record.
        assert!(matches!(
            sum_amounts(&ctx, Source::GroupInput, AmountWidth::U128),
            Err(SumError::Decode(_))
        ));
    }
}
