//! Pokemon card image and metadata downloader.
//!
//! Enumerates the sets exposed by pkmncards.com, downloads every card image
//! through a rate-limited worker pool with retry and backoff, and maintains
//! crash-safe metadata artifacts (card catalog, class list, run summary)
//! so interrupted runs resume where they left off.
//!
//! The crate is organized around a handful of capabilities:
//!
//! - [`catalog`]: the [`catalog::CatalogSource`] trait and the
//!   pkmncards.com implementation behind it.
//! - [`scan`]: a counting pass over the catalog before downloading.
//! - [`resume`]: rebuilding completion state from durable output alone.
//! - [`pipeline`]: the bounded work queue, fetch workers, rate limiter and
//!   the aggregator that owns the metadata catalog.
//! - [`output`]: directory layout, filenames and atomic artifact writes.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod cli;
pub mod http;
pub mod output;
pub mod pipeline;
pub mod resume;
pub mod scan;
pub mod shutdown;

pub use catalog::{CatalogError, CatalogSource, ItemDescriptor, SetDescriptor};
pub use output::{CardCatalog, CardRecord, OutputLayout};
pub use pipeline::{Pipeline, PipelineConfig, PipelineError, RetryPolicy, Summary};
pub use resume::{FsResumeIndex, ResumeIndex};
pub use scan::{ScanPlanner, ScanReport};
