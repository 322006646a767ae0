//! Request Throttling
//!
//! Per-caller sliding-window limits for the mutating endpoints (claim, release and
//! notification toggles).

pub mod limiter;
