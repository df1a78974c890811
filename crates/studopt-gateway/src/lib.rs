//! # StudOpt Gateway
//!
//! The HTTP surface: the bot platform's webhook lands here and is fed to the
//! dispatch engine; a small admin API manages classes, assignments, and the
//! bot kill switch.

pub mod routes;
pub mod server;

pub use server::{build_router, start, AppState};
