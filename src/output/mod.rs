//! Durable output: asset directory layout and metadata artifacts.

pub mod catalog;
pub mod path;

pub use catalog::{CardCatalog, CardRecord};
pub use path::{asset_filename, OutputLayout};

/// Persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// Filesystem error
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Lock error
    #[error("lock error: {0}")]
    Lock(String),
}

/// Result type for output operations.
pub type OutputResult<T> = Result<T, OutputError>;
