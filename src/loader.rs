//! Dataset loader: read a raw CSV source (local file or http/https URI) into typed rows.
//!
//! The header row is validated once, up front: every column the source kind requires
//! must resolve to one of the configured aliases, otherwise the load fails with
//! [`LoadError::MissingColumn`]. Cells are then parsed into the fixed [`Record`] schema.
//!
//! ### Cell rules
//! - empty, `NA`, `NaN`, `null` → missing value
//! - unparseable or out-of-range numbers → [`LoadError::InvalidValue`]
//! - rows with an empty country are skipped
//!
//! Typical usage:
//! ```no_run
//! # use gdd_rs::config::ColumnNames;
//! # use gdd_rs::loader;
//! # use gdd_rs::models::SourceKind;
//! let ds = loader::load_dataset("data/life.csv", SourceKind::LifeExpectancy, &ColumnNames::default())?;
//! println!("{} rows", ds.len());
//! # Ok::<(), gdd_rs::LoadError>(())
//! ```

use crate::config::ColumnNames;
use crate::error::LoadError;
use crate::models::{ContinentMap, Dataset, Field, Record, SourceKind};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

/// Whether `source` should be fetched over HTTP rather than opened as a file.
pub fn is_remote(source: &str) -> bool {
    let s = source.trim_start().to_ascii_lowercase();
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load one metric source.
pub fn load_dataset(
    source: &str,
    kind: SourceKind,
    columns: &ColumnNames,
) -> Result<Dataset, LoadError> {
    let reader = open_source(source)?;
    let ds = read_dataset(reader, source, kind, columns)?;
    info!("loaded {} rows of {:?} from {}", ds.len(), kind, source);
    Ok(ds)
}

/// Load a country → continent mapping.
pub fn load_continents(source: &str, columns: &ColumnNames) -> Result<ContinentMap, LoadError> {
    let reader = open_source(source)?;
    let map = read_continents(reader, source, columns)?;
    info!("loaded {} continent mappings from {}", map.len(), source);
    Ok(map)
}

/// Parse a metric source from any reader. `source` is only used in error messages.
pub fn read_dataset<R: Read>(
    reader: R,
    source: &str,
    kind: SourceKind,
    columns: &ColumnNames,
) -> Result<Dataset, LoadError> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = rdr.headers().map_err(|e| csv_err(source, e))?.clone();
    let layout = Layout::resolve(&headers, source, kind, columns)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in rdr.records() {
        let row = row.map_err(|e| csv_err(source, e))?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        match layout.parse_row(&row, source, line)? {
            Some(rec) => records.push(rec),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("{}: skipped {} rows without a country", source, skipped);
    }
    Ok(Dataset::new(source, kind, records))
}

/// Parse a continent mapping from any reader. Year columns, if present, are ignored.
pub fn read_continents<R: Read>(
    reader: R,
    source: &str,
    columns: &ColumnNames,
) -> Result<ContinentMap, LoadError> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = rdr.headers().map_err(|e| csv_err(source, e))?.clone();
    let country = require_column(&headers, source, Field::Country, columns)?;
    let continent = require_column(&headers, source, Field::Continent, columns)?;

    let mut map = ContinentMap::default();
    for row in rdr.records() {
        let row = row.map_err(|e| csv_err(source, e))?;
        let (Some(c), Some(k)) = (cell(&row, country), cell(&row, continent)) else {
            continue;
        };
        map.insert(c, k);
    }
    Ok(map)
}

fn csv_err(source: &str, e: csv::Error) -> LoadError {
    LoadError::Csv {
        source_name: source.to_string(),
        source: e,
    }
}

fn open_source(source: &str) -> Result<Box<dyn Read>, LoadError> {
    if is_remote(source) {
        let bytes = fetch_remote(source)?;
        return Ok(Box::new(std::io::Cursor::new(bytes)));
    }
    let path = Path::new(source);
    let file = File::open(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Box::new(BufReader::new(file)))
}

/// Single GET, no retries: a failed fetch fails the load.
fn fetch_remote(url: &str) -> Result<Vec<u8>, LoadError> {
    let http_err = |reason: String| LoadError::Http {
        url: url.to_string(),
        reason,
    };
    let http = HttpClient::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(5))
        .user_agent(concat!("gdd_rs/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| http_err(e.to_string()))?;
    let resp = http.get(url).send().map_err(|e| http_err(e.to_string()))?;
    if !resp.status().is_success() {
        return Err(http_err(format!("HTTP {}", resp.status())));
    }
    let bytes = resp.bytes().map_err(|e| http_err(e.to_string()))?;
    Ok(bytes.to_vec())
}

fn find_column(headers: &StringRecord, aliases: &[String]) -> Option<usize> {
    aliases.iter().find_map(|alias| {
        let alias = alias.trim();
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(alias))
    })
}

fn require_column(
    headers: &StringRecord,
    source: &str,
    field: Field,
    columns: &ColumnNames,
) -> Result<usize, LoadError> {
    let aliases = columns.aliases(field);
    find_column(headers, aliases).ok_or_else(|| LoadError::MissingColumn {
        source_name: source.to_string(),
        field,
        tried: aliases.join(", "),
    })
}

fn cell(row: &StringRecord, idx: usize) -> Option<&str> {
    let raw = row.get(idx)?.trim();
    let is_null = raw.is_empty()
        || raw.eq_ignore_ascii_case("na")
        || raw.eq_ignore_ascii_case("nan")
        || raw.eq_ignore_ascii_case("null");
    if is_null { None } else { Some(raw) }
}

/// Column positions resolved from a header row.
struct Layout {
    country: usize,
    year: usize,
    continent: Option<usize>,
    metrics: Vec<(Field, usize)>,
}

impl Layout {
    fn resolve(
        headers: &StringRecord,
        source: &str,
        kind: SourceKind,
        columns: &ColumnNames,
    ) -> Result<Self, LoadError> {
        let country = require_column(headers, source, Field::Country, columns)?;
        let year = require_column(headers, source, Field::Year, columns)?;
        let required = kind.metric();
        let mut metrics = vec![(required, require_column(headers, source, required, columns)?)];
        // Other metrics ride along when the source happens to carry them.
        for field in Field::METRICS {
            if field == required {
                continue;
            }
            if let Some(idx) = find_column(headers, columns.aliases(field)) {
                metrics.push((field, idx));
            }
        }
        let continent = find_column(headers, columns.aliases(Field::Continent));
        Ok(Self {
            country,
            year,
            continent,
            metrics,
        })
    }

    fn parse_row(
        &self,
        row: &StringRecord,
        source: &str,
        line: u64,
    ) -> Result<Option<Record>, LoadError> {
        let Some(country) = cell(row, self.country) else {
            return Ok(None);
        };
        let invalid = |field: Field, value: &str| LoadError::InvalidValue {
            source_name: source.to_string(),
            line,
            field,
            value: value.to_string(),
        };

        let raw_year = cell(row, self.year).ok_or_else(|| invalid(Field::Year, ""))?;
        let year = parse_year(raw_year).ok_or_else(|| invalid(Field::Year, raw_year))?;

        let mut rec = Record::new(country, year);
        rec.continent = self.continent.and_then(|i| cell(row, i)).map(str::to_string);
        for &(field, idx) in &self.metrics {
            let Some(raw) = cell(row, idx) else { continue };
            let v = raw
                .parse::<f64>()
                .ok()
                .filter(|v| in_range(field, *v))
                .ok_or_else(|| invalid(field, raw))?;
            match field {
                Field::GdpPerCapita => rec.gdp_per_capita = Some(v),
                Field::PovertyRatio => rec.poverty_ratio = Some(v),
                Field::LifeExpectancy => rec.life_expectancy = Some(v),
                _ => {}
            }
        }
        Ok(Some(rec))
    }
}

/// Years are integers; `2016.0` (as written by some exporters) is accepted.
fn parse_year(raw: &str) -> Option<i32> {
    if let Ok(y) = raw.parse::<i32>() {
        return Some(y);
    }
    let f = raw.parse::<f64>().ok()?;
    if f.fract() == 0.0 && f.abs() < i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

fn in_range(field: Field, v: f64) -> bool {
    if !v.is_finite() {
        return false;
    }
    match field {
        Field::GdpPerCapita => v >= 0.0,
        Field::PovertyRatio => (0.0..=100.0).contains(&v),
        Field::LifeExpectancy => v > 0.0,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_detection() {
        assert!(is_remote("https://example.org/x.csv"));
        assert!(is_remote("HTTP://example.org/x.csv"));
        assert!(!is_remote("data/x.csv"));
        assert!(!is_remote("/tmp/https.csv"));
    }

    #[test]
    fn year_accepts_integral_floats() {
        assert_eq!(parse_year("2016"), Some(2016));
        assert_eq!(parse_year("2016.0"), Some(2016));
        assert_eq!(parse_year("2016.5"), None);
        assert_eq!(parse_year("soon"), None);
    }

    #[test]
    fn null_markers_are_missing() {
        let row = StringRecord::from(vec!["", "NA", "nan", "NULL", "1.5"]);
        for i in 0..4 {
            assert_eq!(cell(&row, i), None);
        }
        assert_eq!(cell(&row, 4), Some("1.5"));
        assert_eq!(cell(&row, 9), None);
    }
}
