//! Error taxonomy shared across the workspace.

/// Workspace-wide result alias.
pub type Result<T> = std::result::Result<T, StudoptError>;

/// All failure categories the bot distinguishes.
///
/// Validation, not-found, and authorization problems inside a command turn
/// are resolved into response strings at the dispatch layer and never show
/// up here; these variants cover the infrastructure surface underneath.
#[derive(Debug, thiserror::Error)]
pub enum StudoptError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
