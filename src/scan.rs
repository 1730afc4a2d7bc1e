//! Pre-download counting pass over the catalog.

use tracing::{info, warn};

use crate::catalog::{CatalogResult, CatalogSource};

/// Item count for one set, as observed by a scan pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCount {
    /// Set name.
    pub name: String,
    /// Set code.
    pub code: String,
    /// Items found. Zero when the set page was unavailable.
    pub items: usize,
    /// Whether the set page could not be enumerated.
    pub unavailable: bool,
}

/// Result of a scan pass: per-set counts plus derived totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// One entry per set, in catalog order.
    pub sets: Vec<SetCount>,
}

impl ScanReport {
    /// Number of sets the catalog listed.
    pub fn total_sets(&self) -> usize {
        self.sets.len()
    }

    /// Sets whose pages could not be enumerated.
    pub fn unavailable_sets(&self) -> usize {
        self.sets.iter().filter(|s| s.unavailable).count()
    }

    /// Total items across all sets.
    pub fn total_items(&self) -> u64 {
        self.sets.iter().map(|s| s.items as u64).sum()
    }

    /// Average items per successfully scanned set.
    pub fn average_items(&self) -> f64 {
        let counted = self.sets.iter().filter(|s| !s.unavailable).count();
        if counted == 0 {
            return 0.0;
        }
        self.total_items() as f64 / counted as f64
    }

    /// The up-to-ten largest sets by item count, descending.
    pub fn largest_sets(&self) -> Vec<&SetCount> {
        let mut sorted: Vec<&SetCount> = self.sets.iter().filter(|s| !s.unavailable).collect();
        sorted.sort_by(|a, b| b.items.cmp(&a.items).then_with(|| a.name.cmp(&b.name)));
        sorted.truncate(10);
        sorted
    }

    /// Render the report for terminal output.
    pub fn render(&self) -> String {
        let mut text = String::new();
        text.push_str("Scan Report\n");
        text.push_str("===========\n");
        text.push_str(&format!("Sets:              {}\n", self.total_sets()));
        if self.unavailable_sets() > 0 {
            text.push_str(&format!(
                "Unavailable sets:  {}\n",
                self.unavailable_sets()
            ));
        }
        text.push_str(&format!("Total cards:       {}\n", self.total_items()));
        text.push_str(&format!("Average per set:   {:.1}\n", self.average_items()));
        text.push_str("\nLargest sets:\n");
        for set in self.largest_sets() {
            text.push_str(&format!("  {}: {} cards\n", set.name, set.items));
        }
        text
    }
}

/// Counts the catalog ahead of a download run.
pub struct ScanPlanner;

impl ScanPlanner {
    /// Enumerate every set and count its items.
    ///
    /// A set whose page is unavailable is recorded with a zero count and
    /// flagged; only a failure of the set listing itself is fatal.
    ///
    /// # Errors
    /// [`crate::catalog::CatalogError::SourceUnavailable`] when the set
    /// listing cannot be retrieved.
    pub async fn scan(source: &dyn CatalogSource) -> CatalogResult<ScanReport> {
        let sets = source.list_sets().await?;
        info!(sets = sets.len(), "scanning catalog");

        let mut report = ScanReport::default();
        for set in sets {
            match source.list_items(&set).await {
                Ok(items) => report.sets.push(SetCount {
                    name: set.name,
                    code: set.code,
                    items: items.len(),
                    unavailable: false,
                }),
                Err(e) => {
                    warn!(set = %set.code, error = %e, "set unavailable during scan");
                    report.sets.push(SetCount {
                        name: set.name,
                        code: set.code,
                        items: 0,
                        unavailable: true,
                    });
                }
            }
        }

        info!(
            total_items = report.total_items(),
            unavailable = report.unavailable_sets(),
            "scan complete"
        );
        Ok(report)
    }
}
