//! Error types for the wiki initializer core

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Collaborator errors
    #[error("Wiki registry error: {0}")]
    Registry(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Container error: {0}")]
    Container(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Invalid context or wiki found when initializing [{0}]")]
    ContextUnavailable(String),

    #[error("Initialization of [{wiki_id}] timed out after {elapsed:?}")]
    Timeout { wiki_id: String, elapsed: Duration },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single wiki's initialization.
///
/// Carries the id of the wiki that failed together with the underlying cause.
#[derive(Debug, Error)]
#[error("Failed to initialize wiki with ID [{wiki_id}]")]
pub struct InitializationError {
    /// Id of the wiki whose initialization failed
    pub wiki_id: String,

    /// Underlying cause
    #[source]
    pub source: Error,
}

impl InitializationError {
    /// Wrap a cause into an initialization error for the given wiki
    pub fn new(wiki_id: impl Into<String>, source: Error) -> Self {
        Self {
            wiki_id: wiki_id.into(),
            source,
        }
    }

    /// Id of the wiki that failed
    pub fn wiki_id(&self) -> &str {
        &self.wiki_id
    }
}
