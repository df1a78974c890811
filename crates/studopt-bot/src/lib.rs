//! # StudOpt Bot
//!
//! The conversational core: prefix command dispatch over inbound text,
//! planning of daily digests and deadline reminders, and the runner that
//! glues planner output to the scheduler and the outbound sink.

pub mod commands;
pub mod dispatch;
pub mod planner;
pub mod reminders;
pub mod responses;

pub use commands::Command;
pub use dispatch::{DispatchEngine, DispatchOutcome};
pub use planner::{PlannedMessage, Planner, PrestartJob};
pub use reminders::ReminderRunner;
