//! Join raw datasets on `(country, year)`.
//!
//! The first dataset is the anchor. With [`JoinStrategy::Left`] every anchor key
//! survives and later datasets only fill fields that are still empty; with
//! [`JoinStrategy::Inner`] a key must appear in every dataset. Keys that only exist
//! outside the anchor are dropped silently. Output order is the order in which keys
//! first appear in the anchor, so identical inputs always give identical tables.

use crate::models::{ContinentMap, Dataset, Record};
use crate::table::MergedTable;
use ahash::{AHashMap, AHashSet};
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStrategy {
    #[default]
    Left,
    Inner,
}

/// Merge `datasets` (anchor first) and attach continents by country.
pub fn merge(
    datasets: &[Dataset],
    continents: Option<&ContinentMap>,
    strategy: JoinStrategy,
) -> MergedTable {
    let Some((anchor, rest)) = datasets.split_first() else {
        return MergedTable::default();
    };

    let mut rows: Vec<Record> = Vec::with_capacity(anchor.len());
    let mut index: AHashMap<(String, i32), usize> = AHashMap::with_capacity(anchor.len());
    for (pos, ds) in datasets.iter().enumerate() {
        let is_anchor = pos == 0;
        let mut conflicts = 0usize;
        for rec in &ds.records {
            match index.get(&(rec.country.clone(), rec.year)) {
                Some(&i) => conflicts += rows[i].fill_from(rec).len(),
                None if is_anchor => {
                    index.insert((rec.country.clone(), rec.year), rows.len());
                    rows.push(rec.clone());
                }
                None => {}
            }
        }
        if conflicts > 0 {
            warn!(
                "{}: {} values disagree with earlier sources; kept the earlier ones",
                ds.source, conflicts
            );
        }
    }

    if strategy == JoinStrategy::Inner {
        let key_sets: Vec<AHashSet<(&str, i32)>> = rest
            .iter()
            .map(|ds| ds.records.iter().map(Record::key).collect())
            .collect();
        rows.retain(|r| key_sets.iter().all(|keys| keys.contains(&r.key())));
    }

    if let Some(map) = continents {
        for r in rows.iter_mut().filter(|r| r.continent.is_none()) {
            r.continent = map.get(&r.country).map(str::to_string);
        }
    }

    MergedTable::from_unique(rows)
}
