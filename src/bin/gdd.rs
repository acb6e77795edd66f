use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gdd_rs::predict::{self, Covariate, TrendSpec};
use gdd_rs::stats::{self, SummaryStats};
use gdd_rs::{DateSpec, JoinStrategy, MergedTable, Pipeline, PipelineConfig, PredictError};
use gdd_rs::{models::Field, storage};
use num_format::{Locale, ToFormattedString};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gdd",
    version,
    about = "Merge, summarize & forecast poverty, life expectancy and GDP per capita"
)]
struct Cli {
    #[command(flatten)]
    sources: SourceArgs,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// JSON config with source locations and column names.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Life expectancy source (path or http(s) URL). Anchors the merge.
    #[arg(long, global = true)]
    life_expectancy: Option<String>,
    /// GDP per capita source (path or http(s) URL).
    #[arg(long, global = true)]
    gdp: Option<String>,
    /// Poverty headcount ratio source (path or http(s) URL).
    #[arg(long, global = true)]
    poverty: Option<String>,
    /// Country → continent mapping (path or http(s) URL).
    #[arg(long, global = true)]
    continents: Option<String>,
    /// Keep only keys present in every source instead of every life-expectancy key.
    #[arg(long, global = true, default_value_t = false)]
    inner_join: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Headline statistics and correlations for a year or range.
    Summary(SummaryArgs),
    /// Latest or selected-year statistics for one country, ranked against the world.
    Country(CountryArgs),
    /// List the countries with complete records.
    Countries,
    /// Fit a life-expectancy trend and forecast future years.
    Predict(PredictArgs),
    /// Export (a view of) the merged table.
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct SummaryArgs {
    /// Year (YYYY) or range (YYYY:YYYY). Defaults to the latest year in the data.
    #[arg(short = 'd', long)]
    date: Option<DateSpec>,
    /// Restrict to one country.
    #[arg(short, long)]
    country: Option<String>,
    /// One summary per year instead of a single one.
    #[arg(long, default_value_t = false)]
    per_year: bool,
    /// Print JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct CountryArgs {
    #[arg(short, long)]
    country: String,
    /// Year to show; defaults to the country's latest year.
    #[arg(short, long)]
    year: Option<i32>,
}

#[derive(Args, Debug)]
struct PredictArgs {
    /// Fit on one country; omit for a global trend.
    #[arg(short, long)]
    country: Option<String>,
    /// Fit every country separately and print one line each.
    #[arg(long, default_value_t = false, conflicts_with_all = ["country", "until", "out"])]
    each_country: bool,
    /// Polynomial degree in year (1-10).
    #[arg(
        long,
        default_value_t = 1,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..=predict::MAX_DEGREE as u64)
    )]
    degree: usize,
    /// Use GDP per capita as an extra predictor.
    #[arg(long, default_value_t = false)]
    with_gdp: bool,
    /// Use the poverty ratio as an extra predictor.
    #[arg(long, default_value_t = false)]
    with_poverty: bool,
    /// Forecast up to this year (default: last observed year + 10).
    #[arg(long)]
    until: Option<i32>,
    /// Save the forecast as CSV.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Year (YYYY) or range (YYYY:YYYY); defaults to all years.
    #[arg(short = 'd', long)]
    date: Option<DateSpec>,
    #[arg(short, long)]
    country: Option<String>,
    /// Output file; defaults to `global_development_data.csv` or `<country>_development_data.csv`.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            // Format up to 4 decimals, then trim trailing zeros and trailing dot.
            let s = format!("{:.4}", x);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => "NA".to_string(),
    }
}

fn fmt_fixed(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{:.*}", decimals, x),
        _ => "NA".to_string(),
    }
}

/// `$12,345` style, whole dollars.
fn fmt_money(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            format!("${}", (x.round() as i64).to_formatted_string(&Locale::en))
        }
        _ => "NA".to_string(),
    }
}

fn resolve_config(args: &SourceArgs) -> Result<PipelineConfig> {
    let mut cfg = match &args.config {
        Some(path) => Some(PipelineConfig::from_json_file(path)?),
        None => None,
    };
    let pick = |flag: &Option<String>, from_cfg: Option<&String>, name: &str| -> Result<String> {
        flag.clone()
            .or_else(|| from_cfg.cloned())
            .with_context(|| format!("missing --{} (or --config)", name))
    };
    let life = pick(&args.life_expectancy, cfg.as_ref().map(|c| &c.life_expectancy), "life-expectancy")?;
    let gdp = pick(&args.gdp, cfg.as_ref().map(|c| &c.gdp), "gdp")?;
    let poverty = pick(&args.poverty, cfg.as_ref().map(|c| &c.poverty), "poverty")?;

    let mut out = match cfg.take() {
        Some(mut c) => {
            c.life_expectancy = life;
            c.gdp = gdp;
            c.poverty = poverty;
            c
        }
        None => PipelineConfig::new(life, gdp, poverty),
    };
    if let Some(c) = &args.continents {
        out.continents = Some(c.clone());
    }
    if args.inner_join {
        out.join = JoinStrategy::Inner;
    }
    Ok(out)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let pipeline = Pipeline::new(resolve_config(&cli.sources)?);
    let table = pipeline.table()?;
    match cli.cmd {
        Command::Summary(args) => cmd_summary(&table, args),
        Command::Country(args) => cmd_country(&table, args),
        Command::Countries => {
            for c in table.countries() {
                println!("{}", c);
            }
            Ok(())
        }
        Command::Predict(args) => cmd_predict(&table, args),
        Command::Export(args) => cmd_export(&table, args),
    }
}

fn print_summary(s: &SummaryStats) {
    match &s.country {
        Some(c) => println!("{} • {}  ({} rows)", s.scope, c, s.rows),
        None => println!("{} • {} countries  ({} rows)", s.scope, s.countries, s.rows),
    }
    println!(
        "  average life expectancy: {} years",
        fmt_fixed(s.mean_life_expectancy, 1)
    );
    println!(
        "  median GDP per capita:   {}",
        fmt_money(s.median_gdp_per_capita)
    );
    println!(
        "  average poverty ratio:   {}%",
        fmt_fixed(s.mean_poverty_ratio, 0)
    );
    println!(
        "  corr(life expectancy, GDP per capita) = {}",
        fmt_fixed(s.correlations.life_gdp, 2)
    );
    println!(
        "  corr(life expectancy, poverty)        = {}",
        fmt_fixed(s.correlations.life_poverty, 2)
    );
    println!(
        "  corr(GDP per capita, poverty)         = {}",
        fmt_fixed(s.correlations.gdp_poverty, 2)
    );
}

fn cmd_summary(table: &MergedTable, args: SummaryArgs) -> Result<()> {
    let summaries = if args.per_year {
        let view = match args.date {
            Some(d) => table.filter_years(d),
            None => table.clone(),
        };
        let view = match args.country.as_deref() {
            Some(c) => view.filter_country(c),
            None => view,
        };
        stats::yearly_summaries(&view)
    } else {
        let date = match args.date {
            Some(d) => d,
            None => match table.year_bounds() {
                Some((_, last)) => DateSpec::Year(last),
                None => bail!("no complete records in the merged table"),
            },
        };
        vec![stats::summarize(table, date, args.country.as_deref())]
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for s in &summaries {
            print_summary(s);
        }
    }
    Ok(())
}

fn cmd_country(table: &MergedTable, args: CountryArgs) -> Result<()> {
    let country = args.country.as_str();
    let Some(latest) = table.latest_record(country) else {
        bail!("no complete records for {}", country);
    };
    println!("Latest statistics for {} ({})", country, latest.year);
    println!("  life expectancy: {} years", fmt_fixed(latest.life_expectancy, 2));
    println!("  GDP per capita:  {}", fmt_money(latest.gdp_per_capita));
    println!("  poverty ratio:   {}%", fmt_opt(latest.poverty_ratio));

    let year = args.year.unwrap_or(latest.year);
    let Some(cmp) = stats::compare_country(table, country, year) else {
        println!("No data available for {} in year {}", country, year);
        return Ok(());
    };
    println!(
        "{} in the world distribution, {} ({} countries)",
        country, year, cmp.countries_in_year
    );
    for r in &cmp.ranks {
        let value = match r.metric {
            Field::GdpPerCapita => fmt_money(Some(r.value)),
            _ => fmt_fixed(Some(r.value), 2),
        };
        println!(
            "  {:<16} {:>12}  world median {:>12}  percentile {:>5.1}",
            r.metric.as_str(),
            value,
            fmt_opt(r.world_median),
            r.percentile
        );
    }
    Ok(())
}

fn cmd_predict(table: &MergedTable, args: PredictArgs) -> Result<()> {
    let mut spec = match &args.country {
        Some(c) => TrendSpec::country(c.clone()),
        None => TrendSpec::global(),
    }
    .with_degree(args.degree);
    if args.with_gdp {
        spec = spec.with_covariate(Covariate::GdpPerCapita);
    }
    if args.with_poverty {
        spec = spec.with_covariate(Covariate::PovertyRatio);
    }

    if args.each_country {
        for (country, res) in predict::fit_each_country(table, &spec) {
            match res {
                Ok(m) => {
                    let next = m.forecast([m.last_year + 1]);
                    println!(
                        "{}  r2={}  {} → {}",
                        country,
                        fmt_fixed(m.r_squared, 3),
                        m.last_year + 1,
                        fmt_fixed(next.first().map(|p| p.life_expectancy), 1)
                    );
                }
                Err(e) => println!("{}  no prediction available ({})", country, e),
            }
        }
        return Ok(());
    }

    let model = match predict::fit(table, &spec) {
        Ok(m) => m,
        Err(e @ PredictError::InsufficientData { .. }) => {
            eprintln!("No prediction available: {}", e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "{} trend, degree {}, fitted on {} rows ({}-{})",
        model.spec.scope.label(),
        model.spec.degree,
        model.observations,
        model.first_year,
        model.last_year
    );
    println!(
        "  r2={}  residual std error={}",
        fmt_opt(model.r_squared),
        fmt_opt(model.residual_std_error)
    );
    for (c, v) in &model.baselines {
        println!("  {} held at {}", c.field(), fmt_opt(Some(*v)));
    }

    let until = args.until.unwrap_or(model.last_year + 10);
    let points = model.forecast(model.last_year + 1..=until);
    for p in &points {
        println!("  {}  {:.2}", p.year, p.life_expectancy);
    }
    if let Some(path) = args.out.as_ref() {
        storage::save_forecast_csv(&points, path)?;
        eprintln!("Saved {} forecast rows to {}", points.len(), path.display());
    }
    Ok(())
}

fn cmd_export(table: &MergedTable, args: ExportArgs) -> Result<()> {
    let view = match args.date {
        Some(d) => table.filter_years(d),
        None => table.clone(),
    };
    let view = match args.country.as_deref() {
        Some(c) => view.filter_country(c),
        None => view,
    };

    let path = args
        .out
        .unwrap_or_else(|| PathBuf::from(storage::default_export_name(args.country.as_deref())));
    let fmt = match args.format {
        Some(OutFormat::Csv) => "csv",
        Some(OutFormat::Json) => "json",
        None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
    }
    .to_ascii_lowercase();
    match fmt.as_str() {
        "csv" => storage::save_csv(view.records(), &path)?,
        "json" => storage::save_json(view.records(), &path)?,
        other => bail!("unsupported format: {}", other),
    }
    eprintln!("Saved {} rows to {}", view.len(), path.display());
    Ok(())
}
