//! The canonical joined table and its read-only views.

use crate::models::{DateSpec, Record};
use ahash::AHashMap;
use serde::Serialize;
use std::collections::BTreeSet;

/// Joined table with at most one row per `(country, year)`.
///
/// There is no mutable access: filters return a new table and leave `self` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MergedTable {
    records: Vec<Record>,
}

impl MergedTable {
    /// Build a table from loose rows. Rows sharing a key are coalesced into the first
    /// occurrence (first non-null value per field wins); order of first appearance is kept.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut out: Vec<Record> = Vec::new();
        let mut index: AHashMap<(String, i32), usize> = AHashMap::new();
        for rec in records {
            match index.get(&(rec.country.clone(), rec.year)) {
                Some(&i) => {
                    out[i].fill_from(&rec);
                }
                None => {
                    index.insert((rec.country.clone(), rec.year), out.len());
                    out.push(rec);
                }
            }
        }
        Self { records: out }
    }

    /// Wrap rows already known to be key-unique (merge and clean output).
    pub(crate) fn from_unique(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows matching `pred`, in table order.
    pub fn filter<F>(&self, pred: F) -> MergedTable
    where
        F: Fn(&Record) -> bool,
    {
        Self::from_unique(self.records.iter().filter(|&r| pred(r)).cloned().collect())
    }

    pub fn filter_years(&self, dates: DateSpec) -> MergedTable {
        self.filter(|r| dates.contains(r.year))
    }

    pub fn filter_country(&self, country: &str) -> MergedTable {
        self.filter(|r| r.country == country)
    }

    /// Distinct countries, sorted.
    pub fn countries(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.country.as_str()).collect();
        set.into_iter().collect()
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> Vec<i32> {
        let set: BTreeSet<i32> = self.records.iter().map(|r| r.year).collect();
        set.into_iter().collect()
    }

    /// `(min, max)` year, or `None` for an empty table.
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        let min = self.records.iter().map(|r| r.year).min()?;
        let max = self.records.iter().map(|r| r.year).max()?;
        Some((min, max))
    }

    pub fn record_for(&self, country: &str, year: i32) -> Option<&Record> {
        self.records
            .iter()
            .find(|r| r.country == country && r.year == year)
    }

    /// The country's most recent row.
    pub fn latest_record(&self, country: &str) -> Option<&Record> {
        self.records
            .iter()
            .filter(|r| r.country == country)
            .max_by_key(|r| r.year)
    }
}

impl<'a> IntoIterator for &'a MergedTable {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(country: &str, year: i32, life: Option<f64>) -> Record {
        Record {
            life_expectancy: life,
            ..Record::new(country, year)
        }
    }

    #[test]
    fn from_records_coalesces_duplicate_keys() {
        let mut second = rec("A", 2000, Some(70.0));
        second.gdp_per_capita = Some(5.0);
        let t = MergedTable::from_records(vec![rec("A", 2000, None), rec("B", 2000, Some(1.0)), second]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.records()[0].country, "A");
        assert_eq!(t.records()[0].life_expectancy, Some(70.0));
        assert_eq!(t.records()[0].gdp_per_capita, Some(5.0));
    }

    #[test]
    fn filters_leave_source_untouched() {
        let t = MergedTable::from_records(vec![
            rec("A", 2000, Some(1.0)),
            rec("A", 2001, Some(2.0)),
            rec("B", 2001, Some(3.0)),
        ]);
        let y = t.filter_years(DateSpec::Year(2001));
        assert_eq!(y.len(), 2);
        assert_eq!(t.len(), 3);
        assert_eq!(t.filter_country("A").len(), 2);
        assert_eq!(t.latest_record("A").map(|r| r.year), Some(2001));
        assert_eq!(t.year_bounds(), Some((2000, 2001)));
        assert_eq!(t.countries(), vec!["A", "B"]);
    }
}
