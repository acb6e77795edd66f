//! Life-expectancy trend fitting and forecasting.
//!
//! The model is ordinary least squares of life expectancy on a polynomial in the
//! (centered) year, optionally extended by GDP per capita and/or poverty ratio:
//!
//! `life = b0 + b1·t + … + bd·t^d + c1·gdp + c2·poverty`, with `t = year − mean(year)`.
//!
//! Fitting is refused with [`PredictError::InsufficientData`] before any linear algebra
//! runs when the selection cannot determine the parameters.
//!
//! ```no_run
//! # use gdd_rs::predict::{self, TrendSpec};
//! # fn demo(table: &gdd_rs::MergedTable) -> Result<(), gdd_rs::PredictError> {
//! let model = predict::fit(table, &TrendSpec::country("Kenya").with_degree(2))?;
//! for p in model.forecast(2017..=2025) {
//!     println!("{} {:.1}", p.year, p.life_expectancy);
//! }
//! # Ok(()) }
//! ```

use crate::error::PredictError;
use crate::models::{Field, Record};
use crate::table::MergedTable;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Highest polynomial degree [`fit`] accepts.
pub const MAX_DEGREE: usize = 10;

/// Which rows a trend is fitted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendScope {
    Global,
    Country(String),
}

impl TrendScope {
    pub fn label(&self) -> &str {
        match self {
            TrendScope::Global => "global",
            TrendScope::Country(c) => c,
        }
    }

    fn includes(&self, r: &Record) -> bool {
        match self {
            TrendScope::Global => true,
            TrendScope::Country(c) => &r.country == c,
        }
    }
}

/// Extra predictors besides the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Covariate {
    GdpPerCapita,
    PovertyRatio,
}

impl Covariate {
    pub fn field(&self) -> Field {
        match self {
            Covariate::GdpPerCapita => Field::GdpPerCapita,
            Covariate::PovertyRatio => Field::PovertyRatio,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSpec {
    pub scope: TrendScope,
    /// Polynomial degree in year, 1 to [`MAX_DEGREE`].
    pub degree: usize,
    pub covariates: Vec<Covariate>,
}

impl TrendSpec {
    pub fn global() -> Self {
        Self {
            scope: TrendScope::Global,
            degree: 1,
            covariates: Vec::new(),
        }
    }

    pub fn country(country: impl Into<String>) -> Self {
        Self {
            scope: TrendScope::Country(country.into()),
            ..Self::global()
        }
    }

    pub fn with_degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }

    pub fn with_covariate(mut self, c: Covariate) -> Self {
        if !self.covariates.contains(&c) {
            self.covariates.push(c);
        }
        self
    }

    /// Number of fitted coefficients, intercept included.
    pub fn parameters(&self) -> usize {
        self.degree
            .saturating_add(1)
            .saturating_add(self.covariates.len())
    }

    pub fn min_distinct_years(&self) -> usize {
        self.degree.saturating_add(1).max(2)
    }
}

/// Values to evaluate a fitted model at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictorInput {
    pub year: i32,
    pub gdp_per_capita: Option<f64>,
    pub poverty_ratio: Option<f64>,
}

impl PredictorInput {
    pub fn year(year: i32) -> Self {
        Self {
            year,
            gdp_per_capita: None,
            poverty_ratio: None,
        }
    }

    fn covariate(&self, c: Covariate) -> Option<f64> {
        match c {
            Covariate::GdpPerCapita => self.gdp_per_capita,
            Covariate::PovertyRatio => self.poverty_ratio,
        }
    }
}

/// One predicted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// `"global"` or the country name.
    pub scope: String,
    pub year: i32,
    pub life_expectancy: f64,
    pub residual_std_error: Option<f64>,
}

/// A fitted trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendModel {
    pub spec: TrendSpec,
    /// `[b0, b1..bd, c..]` in the order of [`TrendSpec::covariates`].
    pub coefficients: Vec<f64>,
    pub year_center: f64,
    pub observations: usize,
    pub first_year: i32,
    pub last_year: i32,
    pub r_squared: Option<f64>,
    pub residual_std_error: Option<f64>,
    /// Covariate values used by [`TrendModel::forecast`]: the mean over the last
    /// observed year.
    pub baselines: Vec<(Covariate, f64)>,
}

/// Fit `spec` on the rows of `table` it selects. Rows lacking life expectancy or a
/// requested covariate are ignored.
pub fn fit(table: &MergedTable, spec: &TrendSpec) -> Result<TrendModel, PredictError> {
    if spec.degree == 0 || spec.degree > MAX_DEGREE {
        return Err(PredictError::InvalidDegree);
    }

    let mut years = Vec::new();
    let mut covs = Vec::new();
    let mut targets = Vec::new();
    for r in table.iter().filter(|r| spec.scope.includes(r)) {
        let Some(life) = r.life_expectancy else { continue };
        let Some(values) = spec
            .covariates
            .iter()
            .map(|c| r.metric(c.field()))
            .collect::<Option<Vec<f64>>>()
        else {
            continue;
        };
        years.push(r.year);
        covs.push(values);
        targets.push(life);
    }

    let n = targets.len();
    let p = spec.parameters();
    let distinct: BTreeSet<i32> = years.iter().copied().collect();
    let insufficient = PredictError::InsufficientData {
        rows: n,
        distinct_years: distinct.len(),
        min_years: spec.min_distinct_years(),
        min_rows: p,
    };
    if distinct.len() < spec.min_distinct_years() || n < p {
        return Err(insufficient);
    }
    let (Some(&first_year), Some(&last_year)) = (distinct.first(), distinct.last()) else {
        return Err(insufficient);
    };

    let year_center = years.iter().map(|&y| y as f64).sum::<f64>() / n as f64;
    let x = DMatrix::from_fn(n, p, |i, j| {
        feature(spec.degree, years[i] as f64 - year_center, &covs[i], j)
    });
    let y = DVector::from_vec(targets);

    let svd = x.clone().svd(true, true);
    // Relative cutoff below which a direction counts as collinear.
    let tol = svd.singular_values.max() * 1e-10;
    if svd.rank(tol) < p {
        return Err(PredictError::Singular);
    }
    let beta = svd.solve(&y, tol).map_err(|_| PredictError::Singular)?;

    let fitted = &x * &beta;
    let ss_res: f64 = (&y - fitted).iter().map(|e| e * e).sum();
    let y_mean = y.mean();
    let ss_tot: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let r_squared = (ss_tot > 0.0).then(|| 1.0 - ss_res / ss_tot);
    let dof = n - p;
    let residual_std_error = (dof > 0).then(|| (ss_res / dof as f64).sqrt());

    let baselines = spec
        .covariates
        .iter()
        .enumerate()
        .map(|(k, &c)| {
            let last: Vec<f64> = years
                .iter()
                .zip(&covs)
                .filter(|(yr, _)| **yr == last_year)
                .map(|(_, v)| v[k])
                .collect();
            (c, last.iter().sum::<f64>() / last.len() as f64)
        })
        .collect();

    Ok(TrendModel {
        spec: spec.clone(),
        coefficients: beta.iter().copied().collect(),
        year_center,
        observations: n,
        first_year,
        last_year,
        r_squared,
        residual_std_error,
        baselines,
    })
}

/// Column `j` of a design-matrix row.
fn feature(degree: usize, t: f64, covs: &[f64], j: usize) -> f64 {
    if j <= degree {
        t.powi(j as i32)
    } else {
        covs[j - degree - 1]
    }
}

impl TrendModel {
    pub fn predict(&self, input: &PredictorInput) -> Result<f64, PredictError> {
        let covs = self
            .spec
            .covariates
            .iter()
            .map(|&c| {
                input
                    .covariate(c)
                    .ok_or(PredictError::MissingPredictor(c.field()))
            })
            .collect::<Result<Vec<f64>, _>>()?;
        Ok(self.evaluate(input.year, &covs))
    }

    /// Predict each year with covariates held at their baselines.
    pub fn forecast(&self, years: impl IntoIterator<Item = i32>) -> Vec<ForecastPoint> {
        let covs: Vec<f64> = self.baselines.iter().map(|(_, v)| *v).collect();
        years
            .into_iter()
            .map(|year| ForecastPoint {
                scope: self.spec.scope.label().to_string(),
                year,
                life_expectancy: self.evaluate(year, &covs),
                residual_std_error: self.residual_std_error,
            })
            .collect()
    }

    fn evaluate(&self, year: i32, covs: &[f64]) -> f64 {
        let t = year as f64 - self.year_center;
        self.coefficients
            .iter()
            .enumerate()
            .map(|(j, b)| b * feature(self.spec.degree, t, covs, j))
            .sum()
    }
}

/// Fit `template` once per country in the table; its scope is replaced each time.
pub fn fit_each_country(
    table: &MergedTable,
    template: &TrendSpec,
) -> BTreeMap<String, Result<TrendModel, PredictError>> {
    table
        .countries()
        .into_iter()
        .map(|c| {
            let spec = TrendSpec {
                scope: TrendScope::Country(c.to_string()),
                ..template.clone()
            };
            (c.to_string(), fit(table, &spec))
        })
        .collect()
}
