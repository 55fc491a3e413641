//! Transaction-validating scripts for a cell-based ledger.
//!
//! Each script in [scripts] verifies one proposed state transition (a
//! transaction consuming input cells and producing output cells) against a
//! read-only snapshot exposed through the [ledger::LedgerAccessor] interface,
//! and returns an accept/reject verdict with a stable exit code.
#[macro_use]
extern crate serde_derive;
extern crate colored;

pub mod aggregate;
pub mod auth;
pub mod cell;
pub mod ledger;
pub mod schema;
pub mod scripts;

/// Success exit code shared by every script.
pub const SUCCESS: i8 = 0;
