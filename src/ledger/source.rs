/// Selects the cell set an accessor read operates on.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Source {
    /// All input cells of the transaction.
    Input,
    /// All output cells of the transaction.
    Output,
    /// Input cells whose lock (or type) hash equals the running script's hash.
    GroupInput,
    /// Output cells whose lock (or type) hash equals the running script's hash.
    GroupOutput,
    /// Read-only dependency cells referenced by the transaction.
    CellDep,
}

/// A field of a cell addressable through the accessor.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum CellField {
    /// The cell's capacity, serialized as a little-endian u64.
    Capacity,
    /// The blake2b-256 hash of the cell's lock script.
    LockHash,
    /// The serialized type script; absent when the cell carries none.
    Type,
    /// The blake2b-256 hash of the type script; absent when the cell
    /// carries none.
    TypeHash,
}

/// A field of a transaction input addressable through the accessor.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum InputField {
    /// The consumed cell's out point, serialized as `tx_hash(32) · index(4)`.
    OutPoint,
    /// The input's since field, serialized as a little-endian u64.
    Since,
}
