use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Which years a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateSpec {
    /// Single year like 2016
    Year(i32),
    /// Inclusive range like 1990..=2016
    Range { start: i32, end: i32 },
}

impl DateSpec {
    /// Inclusive bounds; a reversed range is normalized.
    pub fn bounds(&self) -> (i32, i32) {
        match *self {
            DateSpec::Year(y) => (y, y),
            DateSpec::Range { start, end } => (start.min(end), start.max(end)),
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        let (lo, hi) = self.bounds();
        (lo..=hi).contains(&year)
    }
}

impl fmt::Display for DateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DateSpec::Year(y) => write!(f, "{}", y),
            DateSpec::Range { start, end } => write!(f, "{}:{}", start, end),
        }
    }
}

impl FromStr for DateSpec {
    type Err = String;

    /// Accepts `YYYY` or `YYYY:YYYY`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || format!("invalid date `{}`, expected YYYY or YYYY:YYYY", s);
        if let Some((a, b)) = s.split_once(':') {
            let start = a.trim().parse::<i32>().map_err(|_| bad())?;
            let end = b.trim().parse::<i32>().map_err(|_| bad())?;
            Ok(DateSpec::Range { start, end })
        } else {
            s.trim().parse::<i32>().map(DateSpec::Year).map_err(|_| bad())
        }
    }
}

/// Canonical columns of the merged table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Country,
    Continent,
    Year,
    GdpPerCapita,
    PovertyRatio,
    LifeExpectancy,
}

impl Field {
    /// Fields every analysis-ready row must carry.
    pub const ANALYTICAL: [Field; 5] = [
        Field::Country,
        Field::Year,
        Field::GdpPerCapita,
        Field::PovertyRatio,
        Field::LifeExpectancy,
    ];

    /// Numeric metrics, in display order.
    pub const METRICS: [Field; 3] = [
        Field::LifeExpectancy,
        Field::GdpPerCapita,
        Field::PovertyRatio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Country => "country",
            Field::Continent => "continent",
            Field::Year => "year",
            Field::GdpPerCapita => "gdp_per_capita",
            Field::PovertyRatio => "poverty_ratio",
            Field::LifeExpectancy => "life_expectancy",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "country" => Ok(Field::Country),
            "continent" => Ok(Field::Continent),
            "year" => Ok(Field::Year),
            "gdp_per_capita" | "gdp" => Ok(Field::GdpPerCapita),
            "poverty_ratio" | "poverty" => Ok(Field::PovertyRatio),
            "life_expectancy" | "life" => Ok(Field::LifeExpectancy),
            other => Err(format!("unknown field `{}`", other)),
        }
    }
}

/// One (country, year) observation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub country: String,
    pub continent: Option<String>,
    pub year: i32,
    pub gdp_per_capita: Option<f64>,
    /// Poverty headcount ratio in percent (0-100).
    pub poverty_ratio: Option<f64>,
    pub life_expectancy: Option<f64>,
}

impl Record {
    /// A record with only the key set.
    pub fn new(country: impl Into<String>, year: i32) -> Self {
        Self {
            country: country.into(),
            continent: None,
            year,
            gdp_per_capita: None,
            poverty_ratio: None,
            life_expectancy: None,
        }
    }

    pub fn key(&self) -> (&str, i32) {
        (self.country.as_str(), self.year)
    }

    /// Numeric value of a metric field; `None` for non-metric fields.
    pub fn metric(&self, field: Field) -> Option<f64> {
        match field {
            Field::GdpPerCapita => self.gdp_per_capita,
            Field::PovertyRatio => self.poverty_ratio,
            Field::LifeExpectancy => self.life_expectancy,
            Field::Year => Some(self.year as f64),
            Field::Country | Field::Continent => None,
        }
    }

    /// Whether `field` carries a value.
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::Country => !self.country.trim().is_empty(),
            Field::Continent => self.continent.is_some(),
            Field::Year => true,
            Field::GdpPerCapita => self.gdp_per_capita.is_some(),
            Field::PovertyRatio => self.poverty_ratio.is_some(),
            Field::LifeExpectancy => self.life_expectancy.is_some(),
        }
    }

    /// Fill every empty field of `self` from `other`. Existing values win.
    /// Returns the fields where both sides had differing values.
    pub fn fill_from(&mut self, other: &Record) -> Vec<Field> {
        let mut conflicts = Vec::new();
        fill(&mut self.continent, &other.continent, Field::Continent, &mut conflicts);
        fill(&mut self.gdp_per_capita, &other.gdp_per_capita, Field::GdpPerCapita, &mut conflicts);
        fill(&mut self.poverty_ratio, &other.poverty_ratio, Field::PovertyRatio, &mut conflicts);
        fill(&mut self.life_expectancy, &other.life_expectancy, Field::LifeExpectancy, &mut conflicts);
        conflicts
    }
}

fn fill<T: Clone + PartialEq>(
    slot: &mut Option<T>,
    incoming: &Option<T>,
    field: Field,
    conflicts: &mut Vec<Field>,
) {
    match (slot.as_ref(), incoming) {
        (None, Some(v)) => *slot = Some(v.clone()),
        (Some(cur), Some(v)) if cur != v => conflicts.push(field),
        _ => {}
    }
}

/// Which metric a raw source is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    LifeExpectancy,
    GdpPerCapita,
    Poverty,
}

impl SourceKind {
    pub fn metric(&self) -> Field {
        match self {
            SourceKind::LifeExpectancy => Field::LifeExpectancy,
            SourceKind::GdpPerCapita => Field::GdpPerCapita,
            SourceKind::Poverty => Field::PovertyRatio,
        }
    }
}

/// Raw rows from one source, in file order. Keys may repeat.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub source: String,
    pub kind: SourceKind,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(source: impl Into<String>, kind: SourceKind, records: Vec<Record>) -> Self {
        Self {
            source: source.into(),
            kind,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Country -> continent lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContinentMap {
    map: BTreeMap<String, String>,
}

impl ContinentMap {
    /// Keeps the first continent seen for a country.
    pub fn insert(&mut self, country: impl Into<String>, continent: impl Into<String>) {
        self.map.entry(country.into()).or_insert_with(|| continent.into());
    }

    pub fn get(&self, country: &str) -> Option<&str> {
        self.map.get(country).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<C: Into<String>, K: Into<String>> FromIterator<(C, K)> for ContinentMap {
    fn from_iter<I: IntoIterator<Item = (C, K)>>(iter: I) -> Self {
        let mut out = ContinentMap::default();
        for (country, continent) in iter {
            out.insert(country, continent);
        }
        out
    }
}

/// Grouping key used in grouped stats.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub country: String,
    pub metric: Field,
}
