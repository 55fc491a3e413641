use super::source::{CellField, InputField, Source};
use super::{LedgerAccessor, LoadError, Result};
use crate::cell::types::*;
use crate::cell::{Cell, OutPoint, Script};

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use byteorder::{ByteOrder, LittleEndian};

type Blake2b256 = Blake2b<U32>;

/// A consumed cell together with the out point it was created at.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct InputCell {
    /// Reference to the cell being consumed.
    pub out_point: OutPoint,
    /// The input's since field (opaque to the rule engines; probed for
    /// existence only).
    pub since: u64,
    /// Snapshot of the consumed cell.
    pub cell: Cell,
}

impl InputCell {
    pub fn new(out_point: OutPoint, cell: Cell) -> Self {
        InputCell { out_point, since: 0, cell }
    }
}

/// A read-only snapshot of one transaction under evaluation: the cells it
/// consumes, the cells it creates, per-input witnesses and referenced
/// dependency cells.
///
/// The snapshot itself carries no notion of a "current" script; a
/// [ScriptContext] binds it to one executing script and resolves that
/// script's cell groups.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionView {
    pub inputs: Vec<InputCell>,
    pub outputs: Vec<Cell>,
    /// Witnesses positionally associated with inputs. May be shorter than
    /// `inputs`; absent entries read as out of bound.
    pub witnesses: Vec<Vec<u8>>,
    /// Read-only dependency cells.
    pub cell_deps: Vec<Cell>,
}

impl TransactionView {
    pub fn new(
        inputs: Vec<InputCell>,
        outputs: Vec<Cell>,
        witnesses: Vec<Vec<u8>>,
        cell_deps: Vec<Cell>,
    ) -> Self {
        TransactionView { inputs, outputs, witnesses, cell_deps }
    }

    /// Serialize the transaction and return its hash. Witnesses are excluded
    /// so that a credential placed in a witness can sign the hash.
    pub fn hash(&self) -> TxHash {
        let encoded =
            bincode::serialize(&(&self.inputs, &self.outputs, &self.cell_deps)).unwrap();
        let mut hasher = Blake2b256::new();
        hasher.update(&encoded);
        hasher.finalize().into()
    }

    /// Bind this snapshot to `script` executing as a lock script.
    pub fn lock_context(&self, script: Script) -> ScriptContext<'_> {
        ScriptContext::new(self, script, ScriptRole::Lock)
    }

    /// Bind this snapshot to `script` executing as a type script.
    pub fn type_context(&self, script: Script) -> ScriptContext<'_> {
        ScriptContext::new(self, script, ScriptRole::Type)
    }
}

/// Whether the bound script runs as a cell's lock or as its type. Cell
/// groups are resolved against the corresponding hash.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ScriptRole {
    Lock,
    Type,
}

/// One script's view of a [TransactionView]: the accessor implementation
/// handed to the rule engines.
pub struct ScriptContext<'a> {
    tx: &'a TransactionView,
    script: Script,
    script_hash: ScriptHash,
    group_inputs: Vec<usize>,
    group_outputs: Vec<usize>,
}

impl<'a> ScriptContext<'a> {
    fn new(tx: &'a TransactionView, script: Script, role: ScriptRole) -> Self {
        let script_hash = script.hash();
        let in_group = |cell: &Cell| match role {
            ScriptRole::Lock => cell.lock_hash() == script_hash,
            ScriptRole::Type => cell.type_hash() == Some(script_hash),
        };
        let group_inputs = tx
            .inputs
            .iter()
            .enumerate()
            .filter_map(|(i, input)| if in_group(&input.cell) { Some(i) } else { None })
            .collect();
        let group_outputs = tx
            .outputs
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| if in_group(cell) { Some(i) } else { None })
            .collect();
        ScriptContext { tx, script, script_hash, group_inputs, group_outputs }
    }

    fn cell_at(&self, source: Source, index: usize) -> Result<&'a Cell> {
        match source {
            Source::Input => self.tx.inputs.get(index).map(|input| &input.cell),
            Source::Output => self.tx.outputs.get(index),
            Source::GroupInput => self
                .group_inputs
                .get(index)
                .map(|&i| &self.tx.inputs[i].cell),
            Source::GroupOutput => self.group_outputs.get(index).map(|&i| &self.tx.outputs[i]),
            Source::CellDep => self.tx.cell_deps.get(index),
        }
        .ok_or(LoadError::IndexOutOfBound)
    }

    fn input_at(&self, source: Source, index: usize) -> Result<&'a InputCell> {
        match source {
            Source::Input => self.tx.inputs.get(index).ok_or(LoadError::IndexOutOfBound),
            Source::GroupInput => self
                .group_inputs
                .get(index)
                .map(|&i| &self.tx.inputs[i])
                .ok_or(LoadError::IndexOutOfBound),
            _ => Err(LoadError::Syscall(format!("input field load from {:?}", source))),
        }
    }
}

impl<'a> LedgerAccessor for ScriptContext<'a> {
    fn script(&self) -> Result<Vec<u8>> {
        self.script
            .serialize()
            .map_err(|err| LoadError::Syscall(format!("{:?}", err)))
    }

    fn script_hash(&self) -> Result<ScriptHash> {
        Ok(self.script_hash)
    }

    fn tx_hash(&self) -> Result<TxHash> {
        Ok(self.tx.hash())
    }

    fn load_cell_field(&self, source: Source, index: usize, field: CellField) -> Result<Vec<u8>> {
        let cell = self.cell_at(source, index)?;
        match field {
            CellField::Capacity => {
                let mut buf = [0u8; 8];
                LittleEndian::write_u64(&mut buf, cell.capacity);
                Ok(buf.to_vec())
            }
            CellField::LockHash => Ok(cell.lock_hash().to_vec()),
            CellField::TypeHash => match cell.type_hash() {
                Some(hash) => Ok(hash.to_vec()),
                None => Err(LoadError::ItemMissing),
            },
            CellField::Type => match &cell.type_ {
                Some(script) => script
                    .serialize()
                    .map_err(|err| LoadError::Syscall(format!("{:?}", err))),
                None => Err(LoadError::ItemMissing),
            },
        }
    }

    fn load_input_field(&self, source: Source, index: usize, field: InputField) -> Result<Vec<u8>> {
        let input = self.input_at(source, index)?;
        match field {
            InputField::OutPoint => Ok(input.out_point.to_bytes().to_vec()),
            InputField::Since => {
                let mut buf = [0u8; 8];
                LittleEndian::write_u64(&mut buf, input.since);
                Ok(buf.to_vec())
            }
        }
    }

    fn load_cell_data(&self, source: Source, index: usize) -> Result<Vec<u8>> {
        self.cell_at(source, index).map(|cell| cell.data.clone())
    }

    fn load_witness(&self, source: Source, index: usize) -> Result<Vec<u8>> {
        let position = match source {
            Source::Input => index,
            Source::GroupInput => {
                *self.group_inputs.get(index).ok_or(LoadError::IndexOutOfBound)?
            }
            _ => return Err(LoadError::Syscall(format!("witness load from {:?}", source))),
        };
        self.tx
            .witnesses
            .get(position)
            .cloned()
            .ok_or(LoadError::IndexOutOfBound)
    }
}
