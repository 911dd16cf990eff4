//! Runtime configuration from environment variables

use crate::dashboard::DEFAULT_TOP_LIMIT;
use crate::data::{TableError, YearRange, DEFAULT_FIRST_YEAR, DEFAULT_LAST_YEAR};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
    #[error(transparent)]
    YearRange(#[from] TableError),
}

/// Configuration for the atlas binary
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasConfig {
    /// Wide unemployment CSV
    pub data_path: PathBuf,

    /// Optional long population CSV
    pub population_path: Option<PathBuf>,

    /// Valid year range of the base table
    pub years: YearRange,

    /// Row count of the top-N tables
    pub top_limit: usize,

    /// tracing filter used when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("unemployment_analysis.csv"),
            population_path: None,
            years: YearRange::default(),
            top_limit: DEFAULT_TOP_LIMIT,
            log_filter: "info".to_string(),
        }
    }
}

impl AtlasConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `ATLAS_DATA_PATH` (default: unemployment_analysis.csv)
    /// - `ATLAS_POPULATION_PATH` (default: none)
    /// - `ATLAS_FIRST_YEAR` (default: 1991)
    /// - `ATLAS_LAST_YEAR` (default: 2020)
    /// - `ATLAS_TOP_LIMIT` (default: 10)
    /// - `ATLAS_LOG` (default: info)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let first = parse_var(&lookup, "ATLAS_FIRST_YEAR")?.unwrap_or(DEFAULT_FIRST_YEAR);
        let last = parse_var(&lookup, "ATLAS_LAST_YEAR")?.unwrap_or(DEFAULT_LAST_YEAR);

        let top_limit = parse_var(&lookup, "ATLAS_TOP_LIMIT")?.unwrap_or(defaults.top_limit);
        check_top_limit("ATLAS_TOP_LIMIT", top_limit)?;

        Ok(Self {
            data_path: lookup("ATLAS_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            population_path: lookup("ATLAS_POPULATION_PATH").map(PathBuf::from),
            years: YearRange::new(first, last)?,
            top_limit,
            log_filter: lookup("ATLAS_LOG").unwrap_or(defaults.log_filter),
        })
    }

    /// Override the top-N row count, e.g. from a command line flag.
    pub fn set_top_limit(&mut self, limit: usize) -> Result<(), ConfigError> {
        check_top_limit("--limit", limit)?;
        self.top_limit = limit;
        Ok(())
    }
}

fn check_top_limit(var: &'static str, limit: usize) -> Result<(), ConfigError> {
    if limit == 0 {
        return Err(ConfigError::InvalidValue {
            var,
            value: limit.to_string(),
        });
    }
    Ok(())
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(ConfigError::InvalidValue { var, value }),
        },
        None => Ok(None),
    }
}
