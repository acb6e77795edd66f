// Run with: cargo test --features online
#![cfg(feature = "online")]

use gdd_rs::LoadError;
use gdd_rs::config::ColumnNames;
use gdd_rs::loader;
use gdd_rs::models::{Field, SourceKind};

#[test]
fn fetch_published_life_expectancy() {
    let url = "https://ourworldindata.org/grapher/life-expectancy.csv";
    let mut columns = ColumnNames::default();
    columns
        .life_expectancy
        .push("Period life expectancy at birth - Sex: total - Age: 0".into());
    match loader::load_dataset(url, SourceKind::LifeExpectancy, &columns) {
        Ok(ds) => {
            assert!(!ds.is_empty());
            assert!(ds.records.iter().any(|r| r.country == "Kenya"));
        }
        // the publisher renames the metric column from time to time; the fetch and
        // the country/year header still have to work
        Err(LoadError::MissingColumn { field, .. }) => assert_eq!(field, Field::LifeExpectancy),
        Err(e) => panic!("loading {url} failed: {e}"),
    }
}
