//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Construction parameters are out of range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Empty keys cannot be stored
    #[error("Empty key is not allowed")]
    EmptyKey,

    /// The reaper task needs a tokio runtime to be spawned on
    #[error("No tokio runtime available to run the reaper task")]
    NoRuntime,
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
