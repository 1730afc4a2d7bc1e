//! Output directory layout and canonical asset filenames.
//!
//! Layout under the configured root:
//!
//! ```text
//! <root>/images/{display_name}_{set_code}_{number}.jpg
//! <root>/metadata/cards_metadata.json
//! <root>/metadata/pokemon_classes.txt
//! <root>/metadata/download_summary.txt
//! ```
//!
//! The filename key (name, set code, number) is unique per catalog entry,
//! so no de-duplication counter is needed.

use std::path::{Path, PathBuf};

use super::{OutputError, OutputResult};
use crate::catalog::ItemDescriptor;

/// Subdirectory holding downloaded images.
const IMAGES_DIR: &str = "images";
/// Subdirectory holding metadata artifacts.
const METADATA_DIR: &str = "metadata";

/// Paths for every artifact the pipeline produces.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Create a layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The output root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding downloaded images.
    pub fn images_dir(&self) -> PathBuf {
        self.root.join(IMAGES_DIR)
    }

    /// Directory holding metadata artifacts.
    pub fn metadata_dir(&self) -> PathBuf {
        self.root.join(METADATA_DIR)
    }

    /// Path of the JSON catalog checkpoint.
    pub fn metadata_path(&self) -> PathBuf {
        self.metadata_dir().join("cards_metadata.json")
    }

    /// Path of the class list artifact.
    pub fn classes_path(&self) -> PathBuf {
        self.metadata_dir().join("pokemon_classes.txt")
    }

    /// Path of the textual summary artifact.
    pub fn summary_path(&self) -> PathBuf {
        self.metadata_dir().join("download_summary.txt")
    }

    /// Target path for one item's asset.
    pub fn target_path(&self, item: &ItemDescriptor) -> PathBuf {
        self.images_dir().join(asset_filename(item))
    }

    /// Create the images and metadata directories.
    pub fn ensure_directories(&self) -> OutputResult<()> {
        for dir in [self.images_dir(), self.metadata_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                OutputError::Io(format!("failed to create directory {}: {e}", dir.display()))
            })?;
        }
        Ok(())
    }
}

/// Canonical filename for an item: `{display_name}_{set_code}_{number}.jpg`.
///
/// Name and code are sanitized for filesystem safety; the (name, code,
/// number) key makes the result collision-free across a run.
pub fn asset_filename(item: &ItemDescriptor) -> String {
    format!(
        "{}_{}_{}.jpg",
        sanitize_name(&item.display_name),
        sanitize_code(&item.set_code),
        item.item_number
    )
}

/// Sanitize a display name: drop everything outside `[\w\s-]`, then replace
/// spaces with underscores.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || *c == ' ')
        .collect::<String>()
        .trim()
        .replace(' ', "_")
}

/// Sanitize a set code: keep only word characters and dashes.
fn sanitize_code(code: &str) -> String {
    code.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}
