use super::source::{CellField, InputField, Source};
use super::Result;
use crate::cell::types::{ScriptHash, TxHash};

/// Read access to the transaction snapshot under verification.
///
/// Implementations supply cells and fields by `(source, index)`; callers
/// drive the iteration protocol by probing successive indices until
/// [crate::ledger::LoadError::IndexOutOfBound]. The snapshot is read-only:
/// nothing a script
/// does through this interface may mutate ledger state.
pub trait LedgerAccessor {
    /// The serialized form of the currently executing script.
    fn script(&self) -> Result<Vec<u8>>;

    /// The hash identifying the currently executing script.
    fn script_hash(&self) -> Result<ScriptHash>;

    /// The hash of the transaction under verification, used as the message
    /// bound by owner credentials.
    fn tx_hash(&self) -> Result<TxHash>;

    /// Load a cell field by source and index.
    fn load_cell_field(&self, source: Source, index: usize, field: CellField) -> Result<Vec<u8>>;

    /// Load an input field by source and index. Only input sources are
    /// meaningful here.
    fn load_input_field(&self, source: Source, index: usize, field: InputField) -> Result<Vec<u8>>;

    /// Load a cell's data payload by source and index.
    fn load_cell_data(&self, source: Source, index: usize) -> Result<Vec<u8>>;

    /// Load the witness associated with the input at `index`.
    fn load_witness(&self, source: Source, index: usize) -> Result<Vec<u8>>;

    /// Existence check: test field presence and index bounds without
    /// materializing data.
    ///
    /// A cell lacking the probed optional field yields
    /// [crate::ledger::LoadError::ItemMissing], never
    /// [crate::ledger::LoadError::IndexOutOfBound], so an absent field cannot
    /// be confused with the end of the cell set.
    fn probe_cell(&self, source: Source, index: usize, field: CellField) -> Result<()> {
        self.load_cell_field(source, index, field).map(|_| ())
    }

    /// Existence check for input fields, mirroring [Self::probe_cell].
    fn probe_input(&self, source: Source, index: usize, field: InputField) -> Result<()> {
        self.load_input_field(source, index, field).map(|_| ())
    }
}
