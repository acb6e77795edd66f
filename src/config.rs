//! Pipeline configuration: where the sources live and how their columns are named.
//!
//! A config can be written as JSON:
//! ```json
//! {
//!   "life_expectancy": "data/life-expectancy.csv",
//!   "gdp": "data/gdp-per-capita.csv",
//!   "poverty": "https://example.org/poverty.csv",
//!   "continents": "data/continents.csv",
//!   "join": "left"
//! }
//! ```
//! Omitted `columns` fall back to the names used by the published source tables.

use crate::merge::JoinStrategy;
use crate::models::Field;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Accepted header names per canonical field. Matching is case-insensitive and ignores
/// surrounding whitespace; the first alias present in a header row wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub country: Vec<String>,
    pub continent: Vec<String>,
    pub year: Vec<String>,
    pub gdp_per_capita: Vec<String>,
    pub poverty_ratio: Vec<String>,
    pub life_expectancy: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            country: names(&["country", "Entity", "Country Name"]),
            continent: names(&["Continent"]),
            year: names(&["year"]),
            gdp_per_capita: names(&["GDP per capita", "gdp_per_capita"]),
            poverty_ratio: names(&["headcount_ratio_upper_mid_income_povline", "poverty_ratio"]),
            life_expectancy: names(&["Life Expectancy (IHME)", "life_expectancy"]),
        }
    }
}

impl ColumnNames {
    pub fn aliases(&self, field: Field) -> &[String] {
        match field {
            Field::Country => &self.country,
            Field::Continent => &self.continent,
            Field::Year => &self.year,
            Field::GdpPerCapita => &self.gdp_per_capita,
            Field::PovertyRatio => &self.poverty_ratio,
            Field::LifeExpectancy => &self.life_expectancy,
        }
    }
}

/// Everything the pipeline needs to build the merged table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub life_expectancy: String,
    pub gdp: String,
    pub poverty: String,
    #[serde(default)]
    pub continents: Option<String>,
    #[serde(default)]
    pub columns: ColumnNames,
    #[serde(default)]
    pub join: JoinStrategy,
}

impl PipelineConfig {
    pub fn new(
        life_expectancy: impl Into<String>,
        gdp: impl Into<String>,
        poverty: impl Into<String>,
    ) -> Self {
        Self {
            life_expectancy: life_expectancy.into(),
            gdp: gdp.into(),
            poverty: poverty.into(),
            continents: None,
            columns: ColumnNames::default(),
            join: JoinStrategy::default(),
        }
    }

    pub fn with_continents(mut self, source: impl Into<String>) -> Self {
        self.continents = Some(source.into());
        self
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: PipelineConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg)
    }

    /// All source locations, in load order.
    pub fn sources(&self) -> Vec<&str> {
        let mut out = vec![
            self.life_expectancy.as_str(),
            self.gdp.as_str(),
            self.poverty.as_str(),
        ];
        if let Some(c) = self.continents.as_deref() {
            out.push(c);
        }
        out
    }
}
