//! Summary statistics over the merged table.
//!
//! Nothing here fails: an empty selection (e.g. a year with no data) yields `None`
//! statistics and zero counts, which serialize as `null` / `0`.

use crate::models::{DateSpec, Field, GroupKey, Record};
use crate::table::MergedTable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Pairwise Pearson correlations between the three metrics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Correlations {
    pub life_gdp: Option<f64>,
    pub life_poverty: Option<f64>,
    pub gdp_poverty: Option<f64>,
}

/// Headline numbers for a year (or range) and optional country.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryStats {
    pub scope: DateSpec,
    pub country: Option<String>,
    pub rows: usize,
    pub countries: usize,
    pub mean_life_expectancy: Option<f64>,
    pub median_gdp_per_capita: Option<f64>,
    pub mean_poverty_ratio: Option<f64>,
    pub correlations: Correlations,
}

/// Summarize rows in `scope`, restricted to `country` when given.
pub fn summarize(table: &MergedTable, scope: DateSpec, country: Option<&str>) -> SummaryStats {
    let rows: Vec<&Record> = table
        .iter()
        .filter(|r| scope.contains(r.year))
        .filter(|r| country.is_none_or(|c| r.country == c))
        .collect();
    summarize_rows(&rows, scope, country)
}

fn summarize_rows(rows: &[&Record], scope: DateSpec, country: Option<&str>) -> SummaryStats {
    let column = |f: Field| -> Vec<f64> { rows.iter().filter_map(|r| r.metric(f)).collect() };
    let countries: BTreeSet<&str> = rows.iter().map(|r| r.country.as_str()).collect();

    SummaryStats {
        scope,
        country: country.map(str::to_string),
        rows: rows.len(),
        countries: countries.len(),
        mean_life_expectancy: mean(&column(Field::LifeExpectancy)),
        median_gdp_per_capita: median(&column(Field::GdpPerCapita)),
        mean_poverty_ratio: mean(&column(Field::PovertyRatio)),
        correlations: Correlations {
            life_gdp: paired_pearson(rows, Field::LifeExpectancy, Field::GdpPerCapita),
            life_poverty: paired_pearson(rows, Field::LifeExpectancy, Field::PovertyRatio),
            gdp_poverty: paired_pearson(rows, Field::GdpPerCapita, Field::PovertyRatio),
        },
    }
}

/// Correlation over rows where both metrics are present.
fn paired_pearson(rows: &[&Record], a: Field, b: Field) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = rows
        .iter()
        .filter_map(|r| Some((r.metric(a)?, r.metric(b)?)))
        .unzip();
    pearson(&xs, &ys)
}

/// One [`SummaryStats`] per year present in the table, ascending.
pub fn yearly_summaries(table: &MergedTable) -> Vec<SummaryStats> {
    let mut by_year: BTreeMap<i32, Vec<&Record>> = BTreeMap::new();
    for r in table {
        by_year.entry(r.year).or_default().push(r);
    }
    by_year
        .into_iter()
        .map(|(year, rows)| summarize_rows(&rows, DateSpec::Year(year), None))
        .collect()
}

/// Per (country, metric) distribution summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub key: GroupKey,
    pub count: usize,
    pub missing: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

/// Compute grouped statistics by (country, metric), sorted by key.
pub fn grouped_summary(table: &MergedTable) -> Vec<Summary> {
    let mut groups: BTreeMap<GroupKey, (Vec<f64>, usize)> = BTreeMap::new();
    for r in table {
        for metric in Field::METRICS {
            let key = GroupKey {
                country: r.country.clone(),
                metric,
            };
            let slot = groups.entry(key).or_default();
            match r.metric(metric) {
                Some(v) => slot.0.push(v),
                None => slot.1 += 1,
            }
        }
    }

    groups
        .into_iter()
        .map(|(key, (vals, missing))| Summary {
            key,
            count: vals.len(),
            missing,
            min: vals.iter().copied().reduce(f64::min),
            max: vals.iter().copied().reduce(f64::max),
            mean: mean(&vals),
            median: median(&vals),
        })
        .collect()
}

/// Where one country's value sits in a year's world distribution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricRank {
    pub metric: Field,
    pub value: f64,
    pub world_mean: Option<f64>,
    pub world_median: Option<f64>,
    /// Share of countries (in percent) whose value is at or below `value`.
    pub percentile: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comparison {
    pub country: String,
    pub year: i32,
    pub countries_in_year: usize,
    pub ranks: Vec<MetricRank>,
}

/// Rank `country` against every country reporting in `year`.
/// `None` when the country has no row for that year.
pub fn compare_country(table: &MergedTable, country: &str, year: i32) -> Option<Comparison> {
    let target = table.record_for(country, year)?;
    let peers: Vec<&Record> = table.iter().filter(|r| r.year == year).collect();

    let ranks = Field::METRICS
        .iter()
        .filter_map(|&metric| {
            let value = target.metric(metric)?;
            let world: Vec<f64> = peers.iter().filter_map(|r| r.metric(metric)).collect();
            Some(MetricRank {
                metric,
                value,
                world_mean: mean(&world),
                world_median: median(&world),
                percentile: percentile_rank(&world, value)?,
            })
        })
        .collect();

    Some(Comparison {
        country: country.to_string(),
        year,
        countries_in_year: peers.len(),
        ranks,
    })
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn median(values: &[f64]) -> Option<f64> {
    let mut vals = values.to_vec();
    vals.sort_by(f64::total_cmp);
    let n = vals.len();
    if n == 0 {
        None
    } else if n % 2 == 1 {
        Some(vals[n / 2])
    } else {
        Some((vals[n / 2 - 1] + vals[n / 2]) / 2.0)
    }
}

/// Pearson correlation of two equally long series.
///
/// `None` when the lengths differ, fewer than two pairs exist, or either series is
/// constant (the coefficient is undefined there).
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len();
    if n != ys.len() || n < 2 || is_constant(xs) || is_constant(ys) {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

// Exact comparison: the centered sum of squares of a repeated non-dyadic value
// (0.1, 0.1, ...) is not exactly zero.
fn is_constant(xs: &[f64]) -> bool {
    xs.iter().all(|x| *x == xs[0])
}

/// Percentage of `values` that are `<= value`.
pub fn percentile_rank(values: &[f64], value: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let at_or_below = values.iter().filter(|v| **v <= value).count();
    Some(100.0 * at_or_below as f64 / values.len() as f64)
}
