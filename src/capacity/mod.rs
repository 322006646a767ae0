//! Capacity Module
//!
//! Per-day seat totals and the rules that turn them into per-category cutoffs.
//!
//! ## Submodules
//! - **`store`**: `CapacityCache`, the write-through cache backed by `capacity.json`.
//! - **`formula`**: `CapacityTable`, effective capacity per category class.
//! - **`service`**: `CapacityAdmin`, manager updates and first-confirmation broadcasts.
//! - **`protocol`** / **`handlers`**: the HTTP surface.

pub mod formula;
pub mod handlers;
pub mod protocol;
pub mod service;
pub mod store;
