//! Persisted card metadata catalog.
//!
//! The catalog is the durable record of every successfully downloaded card.
//! It is owned exclusively by the progress aggregator and checkpointed with
//! atomic temp-then-replace writes, so an interruption leaves either the
//! previous complete checkpoint or a fully written new one.

use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use super::{OutputError, OutputResult};
use crate::catalog::ItemDescriptor;

/// Metadata for one downloaded card. Created on a successful download and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    /// Pokemon display name.
    pub pokemon_name: String,
    /// Full card title from the catalog page.
    pub card_title: String,
    /// Card number within the set.
    pub card_number: String,
    /// Set name.
    pub set_name: String,
    /// Set code.
    pub set_code: String,
    /// Asset path relative to the output root, e.g. "images/Deoxys_P4_2.jpg".
    pub local_path: String,
    /// Asset filename.
    pub filename: String,
}

impl CardRecord {
    /// Build a record for `item` stored under `filename`.
    pub fn from_item(item: &ItemDescriptor, filename: String) -> Self {
        Self {
            pokemon_name: item.display_name.clone(),
            card_title: item.title.clone(),
            card_number: item.item_number.clone(),
            set_name: item.set_name.clone(),
            set_code: item.set_code.clone(),
            local_path: format!("images/{filename}"),
            filename,
        }
    }
}

/// On-disk shape of the metadata artifact.
#[derive(Serialize, Deserialize)]
struct MetadataFile {
    total_cards: usize,
    cards: Vec<CardRecord>,
}

/// Append-only collection of [`CardRecord`]s with the derived class list.
///
/// The class list (unique display names, sorted) is maintained incrementally
/// so every checkpoint can render it without a full pass.
#[derive(Debug, Default)]
pub struct CardCatalog {
    records: Vec<CardRecord>,
    filenames: HashSet<String>,
    classes: BTreeSet<String>,
}

impl CardCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a previously checkpointed catalog, or `None` when no checkpoint
    /// exists yet.
    pub fn load(path: &Path) -> OutputResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            OutputError::Io(format!("failed to read {}: {e}", path.display()))
        })?;
        let file: MetadataFile = serde_json::from_str(&contents)
            .map_err(|e| OutputError::Serialization(e.to_string()))?;

        let mut catalog = Self::new();
        for record in file.cards {
            catalog.push(record);
        }
        info!(
            path = %path.display(),
            cards = catalog.len(),
            "loaded existing catalog checkpoint"
        );
        Ok(Some(catalog))
    }

    /// Append a record. Returns `false` for a duplicate filename, which
    /// leaves the catalog unchanged.
    pub fn push(&mut self, record: CardRecord) -> bool {
        if !self.filenames.insert(record.filename.clone()) {
            return false;
        }
        self.classes.insert(record.pokemon_name.clone());
        self.records.push(record);
        true
    }

    /// Whether a record with this asset filename is already present.
    pub fn contains_filename(&self, filename: &str) -> bool {
        self.filenames.contains(filename)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, in append order.
    pub fn records(&self) -> &[CardRecord] {
        &self.records
    }

    /// Unique display names in sorted order.
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    /// Record count per set name, sorted by set name.
    pub fn counts_by_set(&self) -> Vec<(String, usize)> {
        let mut counts = std::collections::BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.set_name.clone()).or_insert(0usize) += 1;
        }
        counts.into_iter().collect()
    }

    /// Checkpoint the catalog to `path` as `{"total_cards": n, "cards": [..]}`.
    ///
    /// A lock file next to the target coordinates concurrent processes; the
    /// write itself is temp-then-replace with fsync.
    pub fn save(&self, path: &Path) -> OutputResult<()> {
        debug!(path = %path.display(), cards = self.len(), "checkpointing catalog");

        let file = MetadataFile {
            total_cards: self.records.len(),
            cards: self.records.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| OutputError::Serialization(e.to_string()))?;

        let lock_path = path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| OutputError::Lock(format!("failed to create lock file: {e}")))?;
        let mut lock = RwLock::new(lock_file);
        let _guard = lock
            .write()
            .map_err(|e| OutputError::Lock(format!("failed to acquire write lock: {e}")))?;

        atomic_write(path, json.as_bytes())
    }

    /// Write the class list artifact: `"{index}: {name}"` per line, sorted
    /// names, contiguous zero-based indices.
    pub fn save_classes(&self, path: &Path) -> OutputResult<()> {
        let mut text = String::new();
        for (index, name) in self.class_names().enumerate() {
            text.push_str(&format!("{index}: {name}\n"));
        }
        atomic_write(path, text.as_bytes())
    }
}

/// Write `bytes` to `path` via a temp file in the same directory, flushed
/// and fsynced before the atomic rename. A crash at any point leaves either
/// the old file or the complete new one.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> OutputResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| OutputError::Io(format!("failed to create temp file: {e}")))?;
    temp.write_all(bytes)
        .map_err(|e| OutputError::Io(format!("failed to write temp file: {e}")))?;
    temp.flush()
        .map_err(|e| OutputError::Io(format!("failed to flush temp file: {e}")))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| OutputError::Io(format!("failed to sync temp file: {e}")))?;
    temp.persist(path)
        .map_err(|e| OutputError::Io(format!("failed to persist temp file: {e}")))?;

    // Fsync the parent directory so the rename itself is durable.
    if let Ok(dir) = std::fs::File::open(parent) {
        let _ = dir.sync_all();
    }

    Ok(())
}
