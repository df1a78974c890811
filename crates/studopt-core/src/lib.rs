//! # StudOpt Core
//!
//! Shared foundation for the StudOpt bot: configuration, error taxonomy,
//! domain entities, and the date helpers every other crate leans on.

pub mod config;
pub mod error;
pub mod time;
pub mod types;

pub use config::StudoptConfig;
pub use error::{Result, StudoptError};
