//! End-to-end pipeline runs over a fake catalog and fetcher.

use std::sync::Arc;
use tempfile::TempDir;

use pkmn_card_downloader::http::FetchError;
use pkmn_card_downloader::pipeline::{Pipeline, PipelineError};
use pkmn_card_downloader::resume::MemoryResumeIndex;
use pkmn_card_downloader::{CatalogError, OutputLayout};

use super::support::{fast_config, item, set, FakeCatalog, ScriptedFetcher};

#[tokio::test]
async fn mixed_outcomes_produce_files_metadata_and_summary() {
    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());

    let svi = set("Scarlet & Violet (SVI)", "SVI");
    let pal = set("Paldea Evolved (PAL)", "PAL");
    let pikachu = item("Pikachu", &svi, "25");
    let sprigatito = item("Sprigatito", &svi, "13");
    let missing = item("Fuecoco", &pal, "36");

    let catalog = FakeCatalog::new()
        .with_set(svi, vec![pikachu.clone(), sprigatito.clone()])
        .with_set(pal, vec![missing.clone()]);

    let fetcher = ScriptedFetcher::new();
    fetcher.script(
        &missing.source_asset_url,
        vec![Err(FetchError::Permanent("server returned 404".to_string()))],
    );

    let summary = Pipeline::new(
        Arc::new(catalog),
        Arc::new(fetcher),
        Arc::new(MemoryResumeIndex::new()),
        layout.clone(),
        fast_config(2),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(summary.expected, 3);
    assert_eq!(summary.downloaded, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.total_cards, 2);
    assert!((summary.success_rate() - 200.0 / 3.0).abs() < 0.01);

    // Both successful images land under images/ with the canonical names.
    assert!(layout.target_path(&pikachu).exists());
    assert!(layout.target_path(&sprigatito).exists());
    assert!(!layout.target_path(&missing).exists());

    let metadata: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(layout.metadata_path()).unwrap()).unwrap();
    assert_eq!(metadata["total_cards"], 2);
    assert_eq!(metadata["cards"].as_array().unwrap().len(), 2);

    let classes = std::fs::read_to_string(layout.classes_path()).unwrap();
    assert_eq!(classes, "0: Pikachu\n1: Sprigatito\n");

    let summary_text = std::fs::read_to_string(layout.summary_path()).unwrap();
    assert!(summary_text.contains("Downloaded:          2"));
    assert!(summary_text.contains("Failed:              1"));
}

#[tokio::test]
async fn unavailable_set_is_skipped_not_fatal() {
    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());

    let good = set("Jungle (JU)", "JU");
    let card = item("Snorlax", &good, "11");
    let catalog = FakeCatalog::new()
        .with_failing_set(set("Fossil (FO)", "FO"))
        .with_set(good, vec![card.clone()]);

    let summary = Pipeline::new(
        Arc::new(catalog),
        Arc::new(ScriptedFetcher::new()),
        Arc::new(MemoryResumeIndex::new()),
        layout.clone(),
        fast_config(1),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(summary.expected, 1);
    assert_eq!(summary.downloaded, 1);
    assert!(layout.target_path(&card).exists());
}

#[tokio::test]
async fn empty_set_listing_is_an_error() {
    let dir = TempDir::new().unwrap();

    let result = Pipeline::new(
        Arc::new(FakeCatalog::new()),
        Arc::new(ScriptedFetcher::new()),
        Arc::new(MemoryResumeIndex::new()),
        OutputLayout::new(dir.path()),
        fast_config(1),
    )
    .run()
    .await;

    assert!(matches!(result, Err(PipelineError::NoSets)));
}

#[tokio::test]
async fn unreachable_listing_is_fatal() {
    let dir = TempDir::new().unwrap();

    let result = Pipeline::new(
        Arc::new(FakeCatalog::failing_listing()),
        Arc::new(ScriptedFetcher::new()),
        Arc::new(MemoryResumeIndex::new()),
        OutputLayout::new(dir.path()),
        fast_config(1),
    )
    .run()
    .await;

    assert!(matches!(
        result,
        Err(PipelineError::Catalog(CatalogError::SourceUnavailable(_)))
    ));
}
