//! # StudOpt Scheduler
//!
//! Named recurring jobs driven by 5-field cron expressions in the deployment
//! timezone. Each job runs in its own tokio task; a per-job overlap guard
//! drops ticks that arrive while the previous run is still going. Job names
//! and running flags survive restarts through a JSON snapshot file.

pub mod cron;
pub mod engine;
pub mod snapshot;

pub use engine::{JobCallback, JobFuture, Scheduler};
pub use snapshot::{JobSnapshot, JobState, SnapshotStore};
