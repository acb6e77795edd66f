use gdd_rs::clean::{clean, clean_analytical, is_complete};
use gdd_rs::merge::{merge, JoinStrategy};
use gdd_rs::models::{ContinentMap, Dataset, Field, Record, SourceKind};
use gdd_rs::MergedTable;

fn life(country: &str, year: i32, v: f64) -> Record {
    Record {
        life_expectancy: Some(v),
        ..Record::new(country, year)
    }
}

fn gdp(country: &str, year: i32, v: f64) -> Record {
    Record {
        gdp_per_capita: Some(v),
        ..Record::new(country, year)
    }
}

fn poverty(country: &str, year: i32, v: f64) -> Record {
    Record {
        poverty_ratio: Some(v),
        ..Record::new(country, year)
    }
}

fn sources() -> Vec<Dataset> {
    vec![
        Dataset::new(
            "life",
            SourceKind::LifeExpectancy,
            vec![
                life("Kenya", 2015, 65.1),
                life("Chad", 2015, 52.0),
                life("Kenya", 2016, 65.9),
                life("Peru", 2016, 75.0),
            ],
        ),
        Dataset::new(
            "gdp",
            SourceKind::GdpPerCapita,
            vec![
                gdp("Kenya", 2016, 3000.0),
                gdp("Kenya", 2015, 2900.0),
                gdp("Chad", 2015, 1700.0),
                // not in the anchor: dropped
                gdp("Mali", 2015, 2000.0),
            ],
        ),
        Dataset::new(
            "poverty",
            SourceKind::Poverty,
            vec![
                poverty("Kenya", 2015, 70.0),
                poverty("Kenya", 2016, 68.0),
                poverty("Peru", 2016, 12.0),
            ],
        ),
    ]
}

#[test]
fn left_join_keeps_anchor_order_and_fills_fields() {
    let t = merge(&sources(), None, JoinStrategy::Left);
    let keys: Vec<(&str, i32)> = t.iter().map(|r| r.key()).collect();
    assert_eq!(
        keys,
        vec![("Kenya", 2015), ("Chad", 2015), ("Kenya", 2016), ("Peru", 2016)]
    );
    let k15 = t.record_for("Kenya", 2015).unwrap();
    assert_eq!(k15.gdp_per_capita, Some(2900.0));
    assert_eq!(k15.poverty_ratio, Some(70.0));
    assert_eq!(k15.life_expectancy, Some(65.1));
    // partial rows survive a left join
    assert_eq!(t.record_for("Chad", 2015).unwrap().poverty_ratio, None);
    assert!(t.record_for("Mali", 2015).is_none());
}

#[test]
fn inner_join_requires_every_source() {
    let t = merge(&sources(), None, JoinStrategy::Inner);
    let keys: Vec<(&str, i32)> = t.iter().map(|r| r.key()).collect();
    assert_eq!(keys, vec![("Kenya", 2015), ("Kenya", 2016)]);
}

#[test]
fn left_and_inner_agree_after_cleaning() {
    let left = clean_analytical(&merge(&sources(), None, JoinStrategy::Left));
    let inner = clean_analytical(&merge(&sources(), None, JoinStrategy::Inner));
    assert_eq!(left, inner);
}

#[test]
fn merge_is_deterministic() {
    let ds = sources();
    let a = merge(&ds, None, JoinStrategy::Left);
    for _ in 0..5 {
        assert_eq!(merge(&ds, None, JoinStrategy::Left), a);
    }
}

#[test]
fn duplicate_keys_collapse_first_value_wins() {
    let ds = vec![
        Dataset::new(
            "life",
            SourceKind::LifeExpectancy,
            vec![life("A", 2000, 50.0), life("A", 2000, 99.0)],
        ),
        Dataset::new(
            "gdp",
            SourceKind::GdpPerCapita,
            vec![gdp("A", 2000, 10.0), gdp("A", 2000, 20.0)],
        ),
    ];
    let t = merge(&ds, None, JoinStrategy::Left);
    assert_eq!(t.len(), 1);
    assert_eq!(t.records()[0].life_expectancy, Some(50.0));
    assert_eq!(t.records()[0].gdp_per_capita, Some(10.0));
}

#[test]
fn continents_attach_by_country() {
    let map: ContinentMap = [("Kenya", "Africa"), ("Peru", "South America")]
        .into_iter()
        .collect();
    let t = merge(&sources(), Some(&map), JoinStrategy::Left);
    assert_eq!(t.record_for("Kenya", 2016).unwrap().continent.as_deref(), Some("Africa"));
    assert_eq!(t.record_for("Chad", 2015).unwrap().continent, None);
}

#[test]
fn empty_input_gives_empty_table() {
    assert!(merge(&[], None, JoinStrategy::Left).is_empty());
}

#[test]
fn cleaner_drops_rows_with_injected_nulls() {
    let full = |c: &str, y: i32| Record {
        continent: None,
        gdp_per_capita: Some(1000.0),
        poverty_ratio: Some(10.0),
        life_expectancy: Some(70.0),
        ..Record::new(c, y)
    };
    let mut rows: Vec<Record> = (0..10).map(|i| full("X", 2000 + i)).collect();
    rows[2].gdp_per_capita = None;
    rows[5].poverty_ratio = None;
    rows[7].life_expectancy = None;
    rows.push(full("", 2000));
    let table = MergedTable::from_records(rows);

    let cleaned = clean_analytical(&table);
    assert_eq!(cleaned.len(), 7);
    assert!(cleaned.iter().all(|r| is_complete(r, &Field::ANALYTICAL)));
    let years: Vec<i32> = cleaned.iter().map(|r| r.year).collect();
    assert_eq!(years, vec![2000, 2001, 2003, 2004, 2006, 2008, 2009]);
    // input untouched
    assert_eq!(table.len(), 11);
}

#[test]
fn cleaner_is_idempotent() {
    let t = merge(&sources(), None, JoinStrategy::Left);
    let once = clean(&t, &Field::ANALYTICAL);
    let twice = clean(&once, &Field::ANALYTICAL);
    assert_eq!(once, twice);
}

#[test]
fn cleaner_honors_the_requested_fields_only() {
    let t = merge(&sources(), None, JoinStrategy::Left);
    let with_gdp = clean(&t, &[Field::GdpPerCapita]);
    assert_eq!(with_gdp.len(), 3);
    let with_continent = clean(&t, &[Field::Continent]);
    assert!(with_continent.is_empty());
}
