//! Catalog source contracts.
//!
//! The remote catalog is exposed to the rest of the crate purely through the
//! [`CatalogSource`] trait and the [`SetDescriptor`] / [`ItemDescriptor`]
//! value types. Markup and page-structure details stay inside the concrete
//! implementation ([`pkmncards::PkmnCardsSource`]); the pipeline, planner and
//! resume logic never see them.

use async_trait::async_trait;

pub mod pkmncards;

/// Catalog enumeration errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The top-level set listing could not be retrieved at all. Fatal: no
    /// partial results are possible without it.
    #[error("catalog source unavailable: {0}")]
    SourceUnavailable(String),

    /// A single set's page could not be retrieved or parsed. Recoverable by
    /// skipping the set.
    #[error("set '{code}' unavailable: {reason}")]
    SetUnavailable {
        /// Code of the affected set.
        code: String,
        /// What went wrong.
        reason: String,
    },
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// One named, coded grouping of items (a card series/expansion).
///
/// Produced by [`CatalogSource::list_sets`]; immutable for the duration of a
/// scan pass. `item_count` is only known after the set has been fully
/// enumerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetDescriptor {
    /// Human-readable set name, e.g. "Scarlet & Violet (SVI)".
    pub name: String,
    /// Short set code, e.g. "SVI".
    pub code: String,
    /// URL of the set's listing page.
    pub url: String,
    /// Number of items, if already counted.
    pub item_count: Option<usize>,
}

/// One downloadable catalog entry (a card) with its asset URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDescriptor {
    /// Pokemon display name parsed from the card title.
    pub display_name: String,
    /// Name of the set this card belongs to.
    pub set_name: String,
    /// Code of the set this card belongs to.
    pub set_code: String,
    /// Card number within the set (kept as text: promo numbers contain
    /// letters).
    pub item_number: String,
    /// Full card title as shown on the catalog page.
    pub title: String,
    /// URL of the card image.
    pub source_asset_url: String,
    /// Set when the source page was missing fields and a deterministic
    /// fallback was applied. Flagged rather than silently discarded.
    pub incomplete: bool,
}

/// A paginated catalog of sets and items.
///
/// Network and parsing errors are this capability's concern; callers only
/// see the [`CatalogError`] taxonomy.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// List every set the catalog exposes.
    ///
    /// # Errors
    /// [`CatalogError::SourceUnavailable`] when the top-level listing cannot
    /// be retrieved.
    async fn list_sets(&self) -> CatalogResult<Vec<SetDescriptor>>;

    /// List every item in one set.
    ///
    /// # Errors
    /// [`CatalogError::SetUnavailable`] when the set page cannot be
    /// retrieved; callers recover by skipping the set.
    async fn list_items(&self, set: &SetDescriptor) -> CatalogResult<Vec<ItemDescriptor>>;
}
