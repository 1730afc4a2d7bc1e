//! Scan pass over a fake catalog.

use pkmn_card_downloader::{CatalogError, ScanPlanner};

use super::support::{item, set, FakeCatalog};

#[tokio::test]
async fn scan_counts_sets_and_flags_unavailable_ones() {
    let big = set("Scarlet & Violet (SVI)", "SVI");
    let small = set("POP Series 4 (P4)", "P4");
    let big_items = (1..=5)
        .map(|n| item("Pikachu", &big, &n.to_string()))
        .collect();
    let small_items = vec![item("Deoxys", &small, "2")];

    let catalog = FakeCatalog::new()
        .with_set(big, big_items)
        .with_set(small, small_items)
        .with_failing_set(set("Fossil (FO)", "FO"));

    let report = ScanPlanner::scan(&catalog).await.unwrap();

    assert_eq!(report.total_sets(), 3);
    assert_eq!(report.total_items(), 6);
    assert_eq!(report.unavailable_sets(), 1);
    assert!((report.average_items() - 3.0).abs() < f64::EPSILON);

    let largest = report.largest_sets();
    assert_eq!(largest[0].name, "Scarlet & Violet (SVI)");
    assert_eq!(largest[0].items, 5);
    // Unavailable sets never rank among the largest.
    assert!(largest.iter().all(|s| !s.unavailable));

    let rendered = report.render();
    assert!(rendered.contains("Total cards:       6"));
    assert!(rendered.contains("Unavailable sets:  1"));
}

#[tokio::test]
async fn scan_fails_when_the_listing_is_unreachable() {
    let result = ScanPlanner::scan(&FakeCatalog::failing_listing()).await;
    assert!(matches!(result, Err(CatalogError::SourceUnavailable(_))));
}
