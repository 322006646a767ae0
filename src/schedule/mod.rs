//! Weekly Schedule Module
//!
//! Everything that depends on the calendar: which categories exist, what admission
//! phase each is in right now, and when the week rolls over.
//!
//! ## Submodules
//! - **`types`**: `Category`, `Status`, `CategoryClass` and `Day`.
//! - **`clock`**: the injectable time source (`SystemClock`, `ManualClock`).
//! - **`window`**: the per-category window state machine driven by a fixed timetable.
//! - **`reset`**: the background loop that wipes the week's state at each cycle start.

pub mod clock;
pub mod reset;
pub mod types;
pub mod window;

#[cfg(test)]
mod tests;
