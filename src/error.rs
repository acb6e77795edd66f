//! Error types for loading sources and fitting trends.

use crate::models::Field;
use std::path::PathBuf;
use thiserror::Error;

/// A source could not be turned into a typed dataset. Always fatal for the request.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot fetch {url}: {reason}")]
    Http { url: String, reason: String },

    #[error("malformed CSV in {source_name}: {source}")]
    Csv {
        source_name: String,
        #[source]
        source: csv::Error,
    },

    #[error("{source_name}: missing column for `{field}` (tried: {tried})")]
    MissingColumn {
        source_name: String,
        field: Field,
        tried: String,
    },

    #[error("{source_name}, line {line}: invalid {field} value `{value}`")]
    InvalidValue {
        source_name: String,
        line: u64,
        field: Field,
        value: String,
    },
}

/// A trend could not be fitted or evaluated.
#[derive(Debug, Error, PartialEq)]
pub enum PredictError {
    #[error(
        "not enough data to fit a trend: {rows} rows over {distinct_years} distinct years \
         (need {min_years} years and {min_rows} rows)"
    )]
    InsufficientData {
        rows: usize,
        distinct_years: usize,
        min_years: usize,
        min_rows: usize,
    },

    #[error("predictors are collinear; the least-squares system has no unique solution")]
    Singular,

    #[error("model uses `{0}` as a predictor but no value was supplied")]
    MissingPredictor(Field),

    #[error("polynomial degree must be between 1 and {}", crate::predict::MAX_DEGREE)]
    InvalidDegree,
}
