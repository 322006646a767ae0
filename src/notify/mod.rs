//! Notification Module
//!
//! Best-effort Web Push alerts: a member watching a category is told when a confirmed
//! seat in it frees up, and everyone is told when a day's capacity is first confirmed.
//!
//! ## Architecture Overview
//! 1. **Detection**: `VacancyDetector` runs after each release and compares the released
//!    position with the category's effective capacity.
//! 2. **Fan-out**: `Notifier` turns one event into a `PushJob` per watching subscription.
//! 3. **Dispatch**: jobs go through the bounded `PushQueue` to a single `PushWorker`, which
//!    delivers through a `PushSender` and prunes subscriptions the push service reports gone.
//!
//! ## Submodules
//! - **`types`**: subscriptions, payloads, jobs and delivery outcomes.
//! - **`subscriptions`**: durable subscription store.
//! - **`prefs`**: `WeeklyState`, per-member category preferences and confirmed-day flags.
//! - **`queue`**: `PushQueue` and `PushWorker`.
//! - **`sender`**: `PushSender` and the `web-push` backed implementation.
//! - **`vacancy`**: `VacancyDetector` and `Notifier`.
//! - **`protocol`** / **`handlers`**: the HTTP surface.

pub mod handlers;
pub mod prefs;
pub mod protocol;
pub mod queue;
pub mod sender;
pub mod subscriptions;
pub mod types;
pub mod vacancy;
