//! Shared fakes for pipeline integration tests: a scriptable catalog source
//! and a scriptable asset fetcher, so no test touches the network.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use pkmn_card_downloader::catalog::{
    CatalogError, CatalogResult, CatalogSource, ItemDescriptor, SetDescriptor,
};
use pkmn_card_downloader::http::{AssetFetcher, FetchError};
use pkmn_card_downloader::pipeline::{PipelineConfig, RetryPolicy};
use std::time::Duration;

/// Build a set descriptor.
pub fn set(name: &str, code: &str) -> SetDescriptor {
    SetDescriptor {
        name: name.to_string(),
        code: code.to_string(),
        url: format!("https://catalog.test/set/{code}"),
        item_count: None,
    }
}

/// Build an item belonging to `set`.
pub fn item(name: &str, set: &SetDescriptor, number: &str) -> ItemDescriptor {
    ItemDescriptor {
        display_name: name.to_string(),
        set_name: set.name.clone(),
        set_code: set.code.clone(),
        item_number: number.to_string(),
        title: format!("{name} · {} #{number}", set.name),
        source_asset_url: format!("https://assets.test/{}/{number}.jpg", set.code),
        incomplete: false,
    }
}

/// Pipeline tunables that keep tests fast: no spacing, millisecond backoff.
pub fn fast_config(workers: usize) -> PipelineConfig {
    PipelineConfig {
        workers,
        request_spacing: Duration::ZERO,
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            multiplier: 2,
            cap: Duration::from_millis(8),
        },
        checkpoint_every: 50,
    }
}

/// In-memory catalog source with optional per-set and listing failures.
#[derive(Default)]
pub struct FakeCatalog {
    sets: Vec<SetDescriptor>,
    items: HashMap<String, Vec<ItemDescriptor>>,
    failing_sets: Vec<String>,
    fail_listing: bool,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog whose set listing itself is unreachable.
    pub fn failing_listing() -> Self {
        Self {
            fail_listing: true,
            ..Self::default()
        }
    }

    /// Add a set with its items.
    pub fn with_set(mut self, set: SetDescriptor, items: Vec<ItemDescriptor>) -> Self {
        self.items.insert(set.code.clone(), items);
        self.sets.push(set);
        self
    }

    /// Add a set whose item page is unavailable.
    pub fn with_failing_set(mut self, set: SetDescriptor) -> Self {
        self.failing_sets.push(set.code.clone());
        self.sets.push(set);
        self
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn list_sets(&self) -> CatalogResult<Vec<SetDescriptor>> {
        if self.fail_listing {
            return Err(CatalogError::SourceUnavailable(
                "connection refused".to_string(),
            ));
        }
        Ok(self.sets.clone())
    }

    async fn list_items(&self, set: &SetDescriptor) -> CatalogResult<Vec<ItemDescriptor>> {
        if self.failing_sets.contains(&set.code) {
            return Err(CatalogError::SetUnavailable {
                code: set.code.clone(),
                reason: "server returned 503".to_string(),
            });
        }
        Ok(self.items.get(&set.code).cloned().unwrap_or_default())
    }
}

/// Asset fetcher scripted per URL. Unscripted URLs succeed with placeholder
/// bytes; scripted URLs pop their queued responses in order, then succeed.
pub struct ScriptedFetcher {
    responses: Mutex<HashMap<String, VecDeque<Result<Vec<u8>, FetchError>>>>,
    calls_per_url: Mutex<HashMap<String, u32>>,
    calls: AtomicU32,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls_per_url: Mutex::new(HashMap::new()),
            calls: AtomicU32::new(0),
        }
    }

    /// Queue responses for one URL.
    pub fn script(&self, url: &str, responses: Vec<Result<Vec<u8>, FetchError>>) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), responses.into());
    }

    /// Total fetch calls across all URLs.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Fetch calls for one URL.
    pub fn calls_for(&self, url: &str) -> u32 {
        self.calls_per_url
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(0)
    }
}

impl Default for ScriptedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .calls_per_url
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;

        if let Some(queue) = self.responses.lock().unwrap().get_mut(url) {
            if let Some(response) = queue.pop_front() {
                return response;
            }
        }
        Ok(b"placeholder image bytes".to_vec())
    }
}
