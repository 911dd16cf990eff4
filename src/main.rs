//! Unemployment Atlas - command line front end
//!
//! Loads the tables, answers one view request and prints it as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use unemployment_atlas::data::YearRange;
use unemployment_atlas::{AtlasConfig, Dashboard, DataLoader, ViewRequest};

#[derive(Parser)]
#[command(author, version, about = "Country unemployment statistics as dashboard views")]
struct Args {
    /// View request as JSON, e.g. '{"view":"top_countries","year":2020}'
    #[arg(default_value = r#"{"view":"options"}"#)]
    request: String,
    /// Wide unemployment CSV (overrides ATLAS_DATA_PATH)
    #[arg(short, long)]
    data: Option<PathBuf>,
    /// Long population CSV (overrides ATLAS_POPULATION_PATH)
    #[arg(short, long)]
    population: Option<PathBuf>,
    #[arg(long)]
    first_year: Option<i32>,
    #[arg(long)]
    last_year: Option<i32>,
    /// Rows in the top-N tables
    #[arg(long)]
    limit: Option<usize>,
    /// Add a country to the selection (repeatable)
    #[arg(short, long = "country")]
    countries: Vec<String>,
    /// Start from an empty selection instead of the default countries
    #[arg(long)]
    no_default_selection: bool,
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = AtlasConfig::from_env().context("invalid environment configuration")?;

    // Logs go to stderr so stdout stays valid JSON
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    fmt()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = args.data {
        config.data_path = path;
    }
    if args.population.is_some() {
        config.population_path = args.population;
    }
    if args.first_year.is_some() || args.last_year.is_some() {
        config.years = YearRange::new(
            args.first_year.unwrap_or(config.years.first()),
            args.last_year.unwrap_or(config.years.last()),
        )?;
    }
    if let Some(limit) = args.limit {
        config.set_top_limit(limit)?;
    }

    let request: ViewRequest =
        serde_json::from_str(&args.request).context("failed to parse view request")?;

    let loader = DataLoader::new(config.years);
    let table = loader
        .load_table(&config.data_path, config.population_path.as_deref())
        .with_context(|| format!("failed to load {}", config.data_path.display()))?;
    info!(
        countries = table.len(),
        continents = table.continents().len(),
        "base table ready"
    );

    let mut dashboard = Dashboard::new(Arc::new(table), config.top_limit);
    if args.no_default_selection {
        dashboard.clear_selection();
    }
    for country in &args.countries {
        dashboard.select_country(country)?;
    }

    let response = dashboard.handle(&request)?;
    let json = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{}", json);
    Ok(())
}
