//! Weekly Slot Registration Gate
//!
//! This library crate defines the modules behind the registration server.
//! It serves as the foundation for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//! - **`schedule`**: the weekly window state machine, the clock abstraction and the
//!   scheduler that wipes the week's state at each cycle boundary.
//! - **`storage`**: the in-memory registration board with priority ordering, plus the
//!   snapshot file and the background persistence worker.
//! - **`ratelimit`**: sliding-window request limiting keyed by caller.
//! - **`capacity`**: per-day seat totals and the per-category capacity formulas.
//! - **`notify`**: vacancy detection and best-effort Web Push delivery.
//! - **`registration`**: the claim/release/board operations and their HTTP surface.
//! - **`config`**: runtime configuration from the environment and command line.

pub mod capacity;
pub mod config;
pub mod notify;
pub mod ratelimit;
pub mod registration;
pub mod schedule;
pub mod storage;
