//! CLI error types and conversions

use crate::catalog::CatalogError;
use crate::output::OutputError;
use crate::pipeline::PipelineError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Catalog error
    #[error("catalog error: {0}")]
    CatalogError(#[from] CatalogError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// Pipeline error
    #[error("pipeline error: {0}")]
    PipelineError(#[from] PipelineError),
}
