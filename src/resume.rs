//! Resume-on-restart: deciding which items are already done.
//!
//! The index is rebuilt from durable state alone at startup, so a crash or
//! kill leaves nothing to repair: the next run re-derives the same decisions
//! from the files and the metadata checkpoint that actually survived.

use std::collections::HashSet;
use tracing::info;

use crate::catalog::ItemDescriptor;
use crate::output::{asset_filename, CardCatalog, OutputLayout, OutputResult};

/// Answers whether an item needs downloading at all.
///
/// Consulted during enumeration, before a task is enqueued. Pluggable so
/// pipeline tests can script completion state without touching a filesystem.
pub trait ResumeIndex: Send + Sync {
    /// Whether this item's asset is already durably present.
    fn already_done(&self, item: &ItemDescriptor) -> bool;
}

/// [`ResumeIndex`] derived from the output directory and the persisted
/// metadata checkpoint.
///
/// An item counts as done when its derived target file exists with a
/// non-zero size, or its filename appears in the prior checkpoint. A
/// zero-byte file is treated as absent and re-downloaded.
pub struct FsResumeIndex {
    layout: OutputLayout,
    known_filenames: HashSet<String>,
}

impl FsResumeIndex {
    /// Build the index from `layout`, loading any prior checkpoint.
    pub fn build(layout: OutputLayout) -> OutputResult<Self> {
        let known_filenames = match CardCatalog::load(&layout.metadata_path())? {
            Some(catalog) => catalog
                .records()
                .iter()
                .map(|record| record.filename.clone())
                .collect(),
            None => HashSet::new(),
        };
        if !known_filenames.is_empty() {
            info!(
                known = known_filenames.len(),
                "resume index loaded from prior checkpoint"
            );
        }
        Ok(Self {
            layout,
            known_filenames,
        })
    }
}

impl ResumeIndex for FsResumeIndex {
    fn already_done(&self, item: &ItemDescriptor) -> bool {
        let filename = asset_filename(item);
        let path = self.layout.target_path(item);
        let on_disk = std::fs::metadata(&path)
            .map(|meta| meta.len() > 0)
            .unwrap_or(false);
        on_disk || self.known_filenames.contains(&filename)
    }
}

/// In-memory [`ResumeIndex`] for tests.
#[derive(Debug, Default)]
pub struct MemoryResumeIndex {
    done: HashSet<String>,
}

impl MemoryResumeIndex {
    /// Empty index: nothing is done.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an item's derived filename as done.
    pub fn mark_done(&mut self, item: &ItemDescriptor) {
        self.done.insert(asset_filename(item));
    }
}

impl ResumeIndex for MemoryResumeIndex {
    fn already_done(&self, item: &ItemDescriptor) -> bool {
        self.done.contains(&asset_filename(item))
    }
}
