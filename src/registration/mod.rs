//! Registration Module
//!
//! The request-facing side of the gate: who is calling, what they may do right now,
//! and the HTTP surface for claims, releases and board views.
//!
//! ## Submodules
//! - **`identity`**: the caller, as forwarded by the upstream proxy.
//! - **`error`**: `GateError`, the typed business outcomes and their HTTP status codes.
//! - **`service`**: `Gatekeeper`, which chains rate limiting, window checks, the store and vacancy detection.
//! - **`protocol`**: endpoint paths and JSON bodies.
//! - **`handlers`**: axum handlers.

pub mod error;
pub mod handlers;
pub mod identity;
pub mod protocol;
pub mod service;
