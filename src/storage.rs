use crate::models::Record;
use crate::predict::ForecastPoint;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::borrow::Cow;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 6] = [
    "country",
    "continent",
    "year",
    "gdp_per_capita",
    "poverty_ratio",
    "life_expectancy",
];

/// Spreadsheet apps evaluate cells starting with these as formulas.
fn guard_cell(s: &str) -> Cow<'_, str> {
    if s.starts_with(['=', '+', '-', '@']) {
        Cow::Owned(format!("'{s}"))
    } else {
        Cow::Borrowed(s)
    }
}

/// Write rows as CSV with header. Numbers are written at full precision; missing
/// values become empty cells.
pub fn write_csv<W: Write>(records: &[Record], writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER)?;
    for r in records {
        wtr.serialize((
            guard_cell(&r.country),
            r.continent.as_deref().map(guard_cell),
            r.year,
            r.gdp_per_capita,
            r.poverty_ratio,
            r.life_expectancy,
        ))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save rows as CSV with header.
pub fn save_csv<P: AsRef<Path>>(records: &[Record], path: P) -> Result<()> {
    let path = path.as_ref();
    let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_csv(records, f)
}

/// CSV bytes for a download.
pub fn to_csv_bytes(records: &[Record]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_csv(records, &mut buf)?;
    Ok(buf)
}

/// Save rows as pretty JSON array.
pub fn save_json<P: AsRef<Path>>(records: &[Record], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let s = serde_json::to_string_pretty(records)?;
    f.write_all(s.as_bytes())
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Save forecast points as CSV with header.
pub fn save_forecast_csv<P: AsRef<Path>>(points: &[ForecastPoint], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    wtr.write_record(["scope", "year", "life_expectancy", "residual_std_error"])?;
    for p in points {
        wtr.serialize((
            guard_cell(&p.scope),
            p.year,
            p.life_expectancy,
            p.residual_std_error,
        ))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Download file name for a full-table export or a single country's rows.
pub fn default_export_name(country: Option<&str>) -> String {
    match country {
        Some(c) => format!("{}_development_data.csv", c),
        None => "global_development_data.csv".to_string(),
    }
}
