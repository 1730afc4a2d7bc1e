//! pkmncards.com catalog implementation.
//!
//! Parses the sets index and individual set pages. This is the only module
//! that knows about the site's markup; everything it learns is surfaced
//! through [`SetDescriptor`] and [`ItemDescriptor`].

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use super::{CatalogError, CatalogResult, CatalogSource, ItemDescriptor, SetDescriptor};
use crate::http::PageClient;
use crate::pipeline::config::RetryPolicy;
use async_trait::async_trait;

/// Default sets index URL.
pub const DEFAULT_BASE_URL: &str = "https://pkmncards.com/sets/";

/// Prefix that distinguishes set links from navigation links on the index.
const SET_LINK_PREFIX: &str = "https://pkmncards.com/set/";

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("static selector"));
static CARD_ARTICLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article.type-pkmn_card").expect("static selector"));
static CARD_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.card-image-link").expect("static selector"));
static CARD_IMAGE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img.card-image").expect("static selector"));

/// Set code in trailing parentheses, e.g. "POP Series 4 (P4)".
static SET_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^)]+)\)$").expect("static regex"));
/// Card number after '#', e.g. "… (P4) #2".
static CARD_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#(\w+)").expect("static regex"));
/// Characters dropped from display names.
static NAME_CLEAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("static regex"));

/// Catalog source for pkmncards.com.
pub struct PkmnCardsSource {
    base_url: String,
    pages: PageClient,
}

impl PkmnCardsSource {
    /// Create a source rooted at `base_url` (the sets index page).
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            base_url: base_url.into(),
            pages: PageClient::new(retry),
        }
    }
}

#[async_trait]
impl CatalogSource for PkmnCardsSource {
    async fn list_sets(&self) -> CatalogResult<Vec<SetDescriptor>> {
        let page = self
            .pages
            .get_text(&self.base_url)
            .await
            .map_err(|e| CatalogError::SourceUnavailable(e.to_string()))?;

        let sets = parse_set_links(&page);
        info!(sets = sets.len(), "enumerated set listing");
        Ok(sets)
    }

    async fn list_items(&self, set: &SetDescriptor) -> CatalogResult<Vec<ItemDescriptor>> {
        let page =
            self.pages
                .get_text(&set.url)
                .await
                .map_err(|e| CatalogError::SetUnavailable {
                    code: set.code.clone(),
                    reason: e.to_string(),
                })?;

        let items = parse_set_page(&page, set);
        debug!(set = %set.name, items = items.len(), "enumerated set page");
        Ok(items)
    }
}

/// Extract set links from the index page.
///
/// Set anchors point under `/set/` and carry a "(CODE)" suffix in their
/// text. Duplicate URLs (the index lists some sets twice) are dropped,
/// keeping first occurrence order.
fn parse_set_links(page: &str) -> Vec<SetDescriptor> {
    let document = Html::parse_document(page);
    let mut sets = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for anchor in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let text = anchor.text().collect::<String>().trim().to_string();

        if !href.starts_with(SET_LINK_PREFIX) || text.is_empty() || !text.contains('(') {
            continue;
        }
        if !seen.insert(href.to_string()) {
            continue;
        }

        sets.push(SetDescriptor {
            code: extract_set_code(&text),
            name: text,
            url: href.to_string(),
            item_count: None,
        });
    }

    sets
}

/// Extract card items from a set page.
///
/// Entries missing the image link or image URL are unrecoverable and
/// skipped with a warning; entries missing only title fields are kept and
/// flagged incomplete.
fn parse_set_page(page: &str, set: &SetDescriptor) -> Vec<ItemDescriptor> {
    let document = Html::parse_document(page);
    let mut items = Vec::new();

    for article in document.select(&CARD_ARTICLE_SELECTOR) {
        let Some(link) = article.select(&CARD_LINK_SELECTOR).next() else {
            continue;
        };
        let Some(img) = link.select(&CARD_IMAGE_SELECTOR).next() else {
            continue;
        };
        let Some(img_url) = img.value().attr("src").filter(|s| !s.is_empty()) else {
            warn!(set = %set.name, "card entry without image URL, skipping");
            continue;
        };

        let title = link.value().attr("title").unwrap_or("").trim().to_string();
        let (display_name, item_number, incomplete) = parse_card_title(&title);

        items.push(ItemDescriptor {
            display_name,
            set_name: set.name.clone(),
            set_code: set.code.clone(),
            item_number,
            title,
            source_asset_url: img_url.to_string(),
            incomplete,
        });
    }

    items
}

/// Extract the set code from a set name like "POP Series 4 (P4)".
fn extract_set_code(set_name: &str) -> String {
    SET_CODE_RE
        .captures(set_name.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

/// Parse a card title like "Deoxys · POP Series 4 (P4) #2" into
/// (display name, card number, incomplete flag).
///
/// When the name segment is empty, fall back to the full title; when the
/// title itself is empty, to the literal "unknown". Either fallback flags
/// the descriptor incomplete.
fn parse_card_title(title: &str) -> (String, String, bool) {
    let raw_name = title.split('·').next().unwrap_or("").trim();
    let cleaned = NAME_CLEAN_RE.replace_all(raw_name, "").trim().to_string();

    let number = CARD_NUMBER_RE
        .captures(title)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "0".to_string());

    if !cleaned.is_empty() {
        (cleaned, number, false)
    } else if !title.trim().is_empty() {
        (title.trim().to_string(), number, true)
    } else {
        ("unknown".to_string(), number, true)
    }
}
