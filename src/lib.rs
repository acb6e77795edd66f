//! gdd_rs
//!
//! A small Rust library for joining country-level poverty, life-expectancy, and
//! GDP-per-capita tables into one analysis-ready table, summarizing it, and fitting
//! life-expectancy trends. Pairs with the `gdd` CLI.
//!
//! ### Features
//! - Load CSV sources from disk or http(s), with the schema checked at load time
//! - Merge on (country, year), anchored on life expectancy; attach continents
//! - Drop incomplete rows once, so every consumer sees complete records
//! - Per-year / per-country summaries and Pearson correlations
//! - Linear or polynomial trend fits with forecasts
//! - CSV / JSON export of any view
//!
//! ### Example
//! ```no_run
//! use gdd_rs::{DateSpec, Pipeline, PipelineConfig};
//! use gdd_rs::predict::{self, TrendSpec};
//!
//! let pipeline = Pipeline::new(PipelineConfig::new(
//!     "data/life-expectancy.csv",
//!     "data/gdp-per-capita.csv",
//!     "data/poverty.csv",
//! ));
//! let table = pipeline.table()?;
//! let stats = gdd_rs::stats::summarize(&table, DateSpec::Year(2016), None);
//! println!("{:#?}", stats);
//! let model = predict::fit(&table, &TrendSpec::global())?;
//! println!("{:?}", model.forecast(2017..=2020));
//! gdd_rs::storage::save_csv(table.records(), "global_development_data.csv")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod clean;
pub mod config;
pub mod error;
pub mod loader;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod predict;
pub mod stats;
pub mod storage;
pub mod table;

pub use config::{ColumnNames, PipelineConfig};
pub use error::{LoadError, PredictError};
pub use merge::JoinStrategy;
pub use models::{DateSpec, Dataset, Field, Record, SourceKind};
pub use pipeline::Pipeline;
pub use table::MergedTable;
