//! Resume-on-restart across pipeline runs against a real output directory.

use std::sync::Arc;
use tempfile::TempDir;

use pkmn_card_downloader::output::asset_filename;
use pkmn_card_downloader::pipeline::Pipeline;
use pkmn_card_downloader::resume::FsResumeIndex;
use pkmn_card_downloader::{CardCatalog, CardRecord, OutputLayout};

use super::support::{fast_config, item, set, FakeCatalog, ScriptedFetcher};

#[tokio::test]
async fn prior_run_state_limits_fetches_to_missing_items() {
    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());
    layout.ensure_directories().unwrap();

    let base = set("Base Set (BS)", "BS");
    let done = item("Pikachu", &base, "58");
    let missing_a = item("Squirtle", &base, "63");
    let missing_b = item("Bulbasaur", &base, "44");

    // State a crashed run would have left behind: one image on disk and a
    // checkpoint that records it.
    std::fs::write(layout.target_path(&done), b"jpeg bytes").unwrap();
    let mut prior = CardCatalog::new();
    prior.push(CardRecord::from_item(&done, asset_filename(&done)));
    prior.save(&layout.metadata_path()).unwrap();

    let catalog = FakeCatalog::new().with_set(
        base,
        vec![done.clone(), missing_a.clone(), missing_b.clone()],
    );
    let fetcher = Arc::new(ScriptedFetcher::new());
    let resume = Arc::new(FsResumeIndex::build(layout.clone()).unwrap());

    let summary = Pipeline::new(
        Arc::new(catalog),
        fetcher.clone(),
        resume,
        layout.clone(),
        fast_config(2),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(summary.expected, 3);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.downloaded, 2);
    assert_eq!(summary.total_cards, 3);
    assert_eq!(fetcher.calls(), 2);
    assert_eq!(fetcher.calls_for(&done.source_asset_url), 0);

    // The already-present image is untouched.
    assert_eq!(
        std::fs::read(layout.target_path(&done)).unwrap(),
        b"jpeg bytes"
    );
}

#[tokio::test]
async fn resumed_run_yields_the_same_catalog_as_an_uninterrupted_one() {
    let base = set("Fossil (FO)", "FO");
    let items = vec![
        item("Aerodactyl", &base, "1"),
        item("Articuno", &base, "2"),
        item("Ditto", &base, "3"),
    ];

    // Uninterrupted run.
    let clean_dir = TempDir::new().unwrap();
    let clean_layout = OutputLayout::new(clean_dir.path());
    Pipeline::new(
        Arc::new(FakeCatalog::new().with_set(base.clone(), items.clone())),
        Arc::new(ScriptedFetcher::new()),
        Arc::new(FsResumeIndex::build(clean_layout.clone()).unwrap()),
        clean_layout.clone(),
        fast_config(2),
    )
    .run()
    .await
    .unwrap();

    // Run interrupted right after the first item's checkpoint, then resumed.
    let resumed_dir = TempDir::new().unwrap();
    let resumed_layout = OutputLayout::new(resumed_dir.path());
    resumed_layout.ensure_directories().unwrap();
    std::fs::write(resumed_layout.target_path(&items[0]), b"jpeg bytes").unwrap();
    let mut partial = CardCatalog::new();
    partial.push(CardRecord::from_item(&items[0], asset_filename(&items[0])));
    partial.save(&resumed_layout.metadata_path()).unwrap();

    Pipeline::new(
        Arc::new(FakeCatalog::new().with_set(base, items)),
        Arc::new(ScriptedFetcher::new()),
        Arc::new(FsResumeIndex::build(resumed_layout.clone()).unwrap()),
        resumed_layout.clone(),
        fast_config(2),
    )
    .run()
    .await
    .unwrap();

    let filenames = |layout: &OutputLayout| -> std::collections::BTreeSet<String> {
        CardCatalog::load(&layout.metadata_path())
            .unwrap()
            .unwrap()
            .records()
            .iter()
            .map(|r| r.filename.clone())
            .collect()
    };
    assert_eq!(filenames(&clean_layout), filenames(&resumed_layout));
}

#[tokio::test]
async fn complete_rerun_downloads_nothing() {
    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());

    let base = set("Jungle (JU)", "JU");
    let items = vec![
        item("Snorlax", &base, "11"),
        item("Scyther", &base, "10"),
        item("Vaporeon", &base, "12"),
    ];

    let first_summary = Pipeline::new(
        Arc::new(FakeCatalog::new().with_set(base.clone(), items.clone())),
        Arc::new(ScriptedFetcher::new()),
        Arc::new(FsResumeIndex::build(layout.clone()).unwrap()),
        layout.clone(),
        fast_config(2),
    )
    .run()
    .await
    .unwrap();
    assert_eq!(first_summary.downloaded, 3);

    let second_fetcher = Arc::new(ScriptedFetcher::new());
    let second_summary = Pipeline::new(
        Arc::new(FakeCatalog::new().with_set(base, items)),
        second_fetcher.clone(),
        Arc::new(FsResumeIndex::build(layout.clone()).unwrap()),
        layout.clone(),
        fast_config(2),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(second_fetcher.calls(), 0);
    assert_eq!(second_summary.downloaded, 0);
    assert_eq!(second_summary.skipped, 3);
    assert_eq!(second_summary.total_cards, 3);
    assert_eq!(second_summary.success_rate(), 100.0);
}
