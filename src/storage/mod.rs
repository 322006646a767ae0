//! Registration Storage Module
//!
//! Holds the week's claims in memory and keeps a durable JSON copy on disk.
//!
//! ## Core Concepts
//! - **Board**: one ordered entry list per category, guarded by a single mutex in `RegistrationStore`.
//! - **Priority**: entries with a special marker sort first, then by claim time.
//! - **Dirty tracking**: every mutation marks the board dirty; `PersistenceWorker` flushes it.
//! - **Snapshots**: `SnapshotFile` writes JSON atomically (temp file + rename) for every durable document.

pub mod memory;
pub mod persistence;
pub mod priority;
pub mod snapshot;
pub mod types;

#[cfg(test)]
mod tests;
