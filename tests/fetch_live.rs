//! Live tests against the published data. Run with: `cargo test --features online -- --nocapture`
#![cfg(feature = "online")]

use carburants::DataFetcher;
use carburants::stats::build_metrics;

#[test]
fn fetch_reference_snapshot() {
    let fetcher = DataFetcher::default();
    let points = fetcher.get_data().unwrap();
    assert!(!points.is_empty());
    assert!(points.fuel_names().len() >= 1);
    let metrics = build_metrics(&points);
    assert!(metrics.averages_global.iter().any(Option::is_some));
    assert!(
        metrics
            .averages_by_departments
            .iter()
            .flatten()
            .any(Option::is_some)
    );
}

#[test]
fn missing_file_is_a_status_error() {
    let fetcher = DataFetcher::default();
    let err = fetcher.get_file("data/does-not-exist.json", "data").unwrap_err();
    assert_eq!(err.status(), Some(404));
}
