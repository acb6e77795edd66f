use gdd_rs::models::{DateSpec, Field, GroupKey, Record};
use gdd_rs::stats::{self, compare_country, grouped_summary, summarize, yearly_summaries};
use gdd_rs::MergedTable;

fn row(country: &str, year: i32, gdp: f64, poverty: f64, life: f64) -> Record {
    Record {
        continent: None,
        gdp_per_capita: Some(gdp),
        poverty_ratio: Some(poverty),
        life_expectancy: Some(life),
        ..Record::new(country, year)
    }
}

#[test]
fn mean_life_expectancy_of_three_rows_is_exact() {
    let t = MergedTable::from_records(vec![
        row("A", 2010, 1000.0, 30.0, 50.0),
        row("B", 2010, 2000.0, 20.0, 60.0),
        row("C", 2010, 3000.0, 10.0, 70.0),
    ]);
    let s = summarize(&t, DateSpec::Year(2010), None);
    assert_eq!(s.mean_life_expectancy, Some(60.0));
    assert_eq!(s.median_gdp_per_capita, Some(2000.0));
    assert_eq!(s.mean_poverty_ratio, Some(20.0));
    assert_eq!(s.rows, 3);
    assert_eq!(s.countries, 3);
}

#[test]
fn perfectly_linear_metrics_correlate_at_one() {
    let rows: Vec<Record> = (1..=6)
        .map(|i| {
            let i = i as f64;
            row(&format!("C{i}"), 2000, 1000.0 * i, 80.0 - 5.0 * i, 40.0 + 2.0 * i)
        })
        .collect();
    let t = MergedTable::from_records(rows);
    let s = summarize(&t, DateSpec::Year(2000), None);
    assert!((s.correlations.life_gdp.unwrap() - 1.0).abs() < 1e-9);
    assert!((s.correlations.life_poverty.unwrap() + 1.0).abs() < 1e-9);
    assert!((s.correlations.gdp_poverty.unwrap() + 1.0).abs() < 1e-9);
}

#[test]
fn empty_selection_yields_none_not_error() {
    let t = MergedTable::from_records(vec![row("A", 2010, 1.0, 1.0, 50.0)]);
    let s = summarize(&t, DateSpec::Year(1850), None);
    assert_eq!(s.rows, 0);
    assert_eq!(s.countries, 0);
    assert_eq!(s.mean_life_expectancy, None);
    assert_eq!(s.median_gdp_per_capita, None);
    assert_eq!(s.mean_poverty_ratio, None);
    assert_eq!(s.correlations.life_gdp, None);

    let json = serde_json::to_value(&s).unwrap();
    assert!(json["mean_life_expectancy"].is_null());
}

#[test]
fn single_row_or_constant_series_has_no_correlation() {
    let one = MergedTable::from_records(vec![row("A", 2010, 1.0, 1.0, 50.0)]);
    assert_eq!(summarize(&one, DateSpec::Year(2010), None).correlations.life_gdp, None);

    let flat = MergedTable::from_records(vec![
        row("A", 2010, 500.0, 1.0, 50.0),
        row("B", 2010, 500.0, 2.0, 60.0),
    ]);
    let c = summarize(&flat, DateSpec::Year(2010), None).correlations;
    assert_eq!(c.life_gdp, None);
    assert!((c.life_poverty.unwrap() - 1.0).abs() < 1e-9);
}

#[test]
fn range_and_country_filters() {
    let t = MergedTable::from_records(vec![
        row("A", 2000, 1.0, 1.0, 50.0),
        row("A", 2001, 1.0, 1.0, 52.0),
        row("A", 2002, 1.0, 1.0, 54.0),
        row("B", 2001, 1.0, 1.0, 70.0),
    ]);
    let s = summarize(&t, DateSpec::Range { start: 2000, end: 2001 }, Some("A"));
    assert_eq!(s.rows, 2);
    assert_eq!(s.countries, 1);
    assert_eq!(s.mean_life_expectancy, Some(51.0));
    assert_eq!(s.country.as_deref(), Some("A"));

    let all = summarize(&t, DateSpec::Range { start: 2002, end: 2000 }, None);
    assert_eq!(all.rows, 4);
    assert_eq!(all.countries, 2);
}

#[test]
fn yearly_summaries_are_ascending() {
    let t = MergedTable::from_records(vec![
        row("A", 2002, 1.0, 1.0, 54.0),
        row("A", 2000, 1.0, 1.0, 50.0),
        row("B", 2000, 1.0, 1.0, 70.0),
    ]);
    let ys = yearly_summaries(&t);
    assert_eq!(ys.len(), 2);
    assert_eq!(ys[0].scope, DateSpec::Year(2000));
    assert_eq!(ys[0].mean_life_expectancy, Some(60.0));
    assert_eq!(ys[1].scope, DateSpec::Year(2002));
    assert_eq!(ys[1].countries, 1);
}

#[test]
fn grouped_stats_handle_missing_and_median_even_odd() {
    let mut gap = row("BBB", 2019, 20.0, 1.0, 1.0);
    gap.gdp_per_capita = None;
    let t = MergedTable::from_records(vec![
        row("AAA", 2018, 1.0, 1.0, 1.0),
        row("AAA", 2019, 2.0, 1.0, 1.0),
        row("AAA", 2020, 3.0, 1.0, 1.0),
        row("AAA", 2021, 4.0, 1.0, 1.0),
        row("BBB", 2018, 10.0, 1.0, 1.0),
        gap,
        row("BBB", 2020, 30.0, 1.0, 1.0),
    ]);
    let got = grouped_summary(&t);
    // 2 countries × 3 metrics
    assert_eq!(got.len(), 6);

    let find = |c: &str| {
        got.iter()
            .find(|s| {
                s.key
                    == GroupKey {
                        country: c.into(),
                        metric: Field::GdpPerCapita,
                    }
            })
            .unwrap()
    };
    let a = find("AAA");
    assert_eq!(a.count, 4);
    assert_eq!(a.missing, 0);
    assert_eq!(a.min, Some(1.0));
    assert_eq!(a.max, Some(4.0));
    assert!((a.median.unwrap() - 2.5).abs() < 1e-9);

    let b = find("BBB");
    assert_eq!(b.count, 2);
    assert_eq!(b.missing, 1);
    assert_eq!(b.mean, Some(20.0));
    assert_eq!(b.median, Some(20.0));
}

#[test]
fn comparison_ranks_country_within_year() {
    let t = MergedTable::from_records(vec![
        row("A", 2016, 1000.0, 60.0, 55.0),
        row("B", 2016, 5000.0, 20.0, 70.0),
        row("C", 2016, 40000.0, 1.0, 82.0),
        row("D", 2016, 9000.0, 10.0, 75.0),
        row("B", 2015, 4800.0, 22.0, 69.5),
    ]);
    let cmp = compare_country(&t, "B", 2016).unwrap();
    assert_eq!(cmp.countries_in_year, 4);
    assert_eq!(cmp.ranks.len(), 3);
    let life = cmp.ranks.iter().find(|r| r.metric == Field::LifeExpectancy).unwrap();
    assert_eq!(life.value, 70.0);
    assert_eq!(life.percentile, 50.0);
    assert_eq!(life.world_median, Some(72.5));
    let pov = cmp.ranks.iter().find(|r| r.metric == Field::PovertyRatio).unwrap();
    assert_eq!(pov.percentile, 75.0);

    assert!(compare_country(&t, "B", 1990).is_none());
    assert!(compare_country(&t, "Z", 2016).is_none());
}

#[test]
fn helpers() {
    assert_eq!(stats::mean(&[]), None);
    assert_eq!(stats::median(&[3.0, 1.0, 2.0]), Some(2.0));
    assert_eq!(stats::median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    assert_eq!(stats::pearson(&[1.0, 2.0], &[1.0]), None);
    assert_eq!(stats::percentile_rank(&[1.0, 2.0, 3.0, 4.0], 2.0), Some(50.0));
    assert_eq!(stats::percentile_rank(&[], 2.0), None);
}

#[test]
fn repeated_decimal_series_has_no_correlation() {
    // 0.1 is not exact in binary, so the computed mean drifts off the values.
    assert_eq!(stats::pearson(&[0.1, 0.1, 0.1], &[1.0, 2.0, 3.0]), None);
    assert_eq!(stats::pearson(&[1.0, 2.0, 3.0], &[72.3, 72.3, 72.3]), None);

    let t = MergedTable::from_records(vec![
        row("A", 2016, 1000.0, 0.1, 60.0),
        row("B", 2016, 2000.0, 0.1, 65.0),
        row("C", 2016, 3000.0, 0.1, 70.0),
    ]);
    let s = summarize(&t, DateSpec::Year(2016), None);
    assert_eq!(s.correlations.life_poverty, None);
    assert_eq!(s.correlations.gdp_poverty, None);
    assert!(s.correlations.life_gdp.is_some());
}
