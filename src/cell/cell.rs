use super::script::Script;
use super::types::*;

/// A unit of ledger state: capacity, a lock script governing who may consume
/// the cell, an optional type script governing how its data may change, and
/// an opaque data payload.
///
/// Cells are immutable once referenced. A transaction consumes existing cells
/// as inputs and creates new ones as outputs; the scripts in
/// [crate::scripts] only judge whether such a transition is lawful.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// The capacity supplied by this cell.
    pub capacity: Capacity,
    /// The owner lock of the cell.
    pub lock: Script,
    /// The type script of the cell, if any.
    pub type_: Option<Script>,
    /// The data held within this cell (opaque to the ledger).
    pub data: Vec<u8>,
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "cell [capacity: {}, data: {}]", self.capacity, hex::encode(&self.data))
    }
}

impl Cell {
    pub fn new(capacity: Capacity, lock: Script, type_: Option<Script>, data: Vec<u8>) -> Self {
        Cell { capacity, lock, type_, data }
    }

    /// The hash identifying this cell's lock script.
    pub fn lock_hash(&self) -> ScriptHash {
        self.lock.hash()
    }

    /// The hash identifying this cell's type script, when one is present.
    pub fn type_hash(&self) -> Option<ScriptHash> {
        self.type_.as_ref().map(|s| s.hash())
    }
}
