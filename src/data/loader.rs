//! CSV Data Loader Module
//! Loads the wide unemployment table and the long population table using Polars.

use crate::data::table::{
    PopulationTable, TableError, UnemploymentRecord, UnemploymentTable, YearRange,
};
use polars::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const COUNTRY_NAME_COL: &str = "Country Name";
pub const COUNTRY_CODE_COL: &str = "Country Code";
pub const CONTINENT_COL: &str = "Continent";
pub const NUMERIC_CODE_COL: &str = "Country Number";
pub const POPULATION_COL: &str = "Population";
pub const YEAR_COL: &str = "Year";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Row {row}: missing value in column {column}")]
    MissingField { row: usize, column: String },
    #[error("Duplicate population entry for code {code} in {year}")]
    DuplicatePopulation { code: i64, year: i32 },
    #[error("Invalid table: {0}")]
    Table(#[from] TableError),
}

/// Builds the base table from CSV files.
pub struct DataLoader {
    years: YearRange,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new(YearRange::default())
    }
}

impl DataLoader {
    pub fn new(years: YearRange) -> Self {
        Self { years }
    }

    /// Read a CSV file into a DataFrame.
    pub fn read_csv(path: impl AsRef<Path>) -> Result<DataFrame, LoaderError> {
        let df = LazyCsvReader::new(path.as_ref())
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;
        Ok(df)
    }

    /// Load both tables and build the immutable base table.
    pub fn load_table(
        &self,
        data_path: impl AsRef<Path>,
        population_path: Option<&Path>,
    ) -> Result<UnemploymentTable, LoaderError> {
        let data_path = data_path.as_ref();
        let df = Self::read_csv(data_path)?;
        info!(
            path = %data_path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded unemployment table"
        );
        let records = self.records_from_frame(&df)?;

        let populations = match population_path {
            Some(path) => {
                let pop_df = Self::read_csv(path)?;
                let populations = Self::populations_from_frame(&pop_df)?;
                info!(
                    path = %path.display(),
                    entries = populations.len(),
                    "loaded population table"
                );
                populations
            }
            None => PopulationTable::new(),
        };

        Ok(UnemploymentTable::new(records, populations, self.years)?)
    }

    /// Year columns of a wide table that fall inside the configured range, ascending.
    pub fn year_columns(&self, df: &DataFrame) -> Vec<(i32, String)> {
        let mut years: Vec<(i32, String)> = df
            .get_column_names()
            .iter()
            .filter_map(|name| {
                let name = name.to_string();
                let year = name.trim().parse::<i32>().ok()?;
                self.years.contains(year).then_some((year, name))
            })
            .collect();
        years.sort_by_key(|(year, _)| *year);
        years
    }

    /// Convert a wide unemployment DataFrame into records.
    ///
    /// `Country Number` and `Population` are optional columns; empty or
    /// unparsable rate cells become missing data points.
    pub fn records_from_frame(
        &self,
        df: &DataFrame,
    ) -> Result<Vec<UnemploymentRecord>, LoaderError> {
        let names = required_strings(df, COUNTRY_NAME_COL)?;
        let codes = required_strings(df, COUNTRY_CODE_COL)?;
        let continents = required_strings(df, CONTINENT_COL)?;
        let numeric_codes = optional_ints(df, NUMERIC_CODE_COL)?;
        let populations = optional_ints(df, POPULATION_COL)?;

        let year_columns = self.year_columns(df);
        if year_columns.is_empty() {
            warn!(
                first = self.years.first(),
                last = self.years.last(),
                "no year columns inside the configured range"
            );
        }

        let mut rate_columns: Vec<(i32, Vec<Option<f64>>)> =
            Vec::with_capacity(year_columns.len());
        for (year, name) in &year_columns {
            rate_columns.push((*year, floats(df, name)?));
        }

        let mut records = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            let Some(name) = names[row].clone() else {
                // Trailing blank lines show up as all-null rows
                debug!(row, "skipping row without a country name");
                continue;
            };
            let code = codes[row].clone().ok_or_else(|| LoaderError::MissingField {
                row,
                column: COUNTRY_CODE_COL.to_string(),
            })?;
            let continent = continents[row]
                .clone()
                .ok_or_else(|| LoaderError::MissingField {
                    row,
                    column: CONTINENT_COL.to_string(),
                })?;

            let mut record = UnemploymentRecord::new(name, code, continent);
            record.numeric_code = numeric_codes[row];
            record.population = populations[row].and_then(|p| u64::try_from(p).ok());

            for (year, values) in &rate_columns {
                if let Some(rate) = values[row] {
                    if !rate.is_nan() {
                        record.rate_by_year.insert(*year, rate);
                    }
                }
            }
            records.push(record);
        }

        debug!(records = records.len(), years = year_columns.len(), "parsed records");
        Ok(records)
    }

    /// Convert a long `Country Number, Year, Population` DataFrame into a lookup.
    ///
    /// Incomplete rows are skipped; a repeated (code, year) pair is rejected.
    pub fn populations_from_frame(df: &DataFrame) -> Result<PopulationTable, LoaderError> {
        let codes = required_ints(df, NUMERIC_CODE_COL)?;
        let years = required_ints(df, YEAR_COL)?;
        let values = required_ints(df, POPULATION_COL)?;

        let mut table = PopulationTable::new();
        let mut skipped = 0usize;
        for row in 0..df.height() {
            let (Some(code), Some(year), Some(value)) = (codes[row], years[row], values[row])
            else {
                skipped += 1;
                continue;
            };
            let (Ok(year), Ok(value)) = (i32::try_from(year), u64::try_from(value)) else {
                skipped += 1;
                continue;
            };
            if table.insert(code, year, value).is_some() {
                return Err(LoaderError::DuplicatePopulation { code, year });
            }
        }
        if skipped > 0 {
            warn!(skipped, "skipped incomplete population rows");
        }
        Ok(table)
    }
}

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, LoaderError> {
    df.column(name)
        .map_err(|_| LoaderError::MissingColumn(name.to_string()))
}

fn required_strings(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, LoaderError> {
    let casted = column(df, name)?.cast(&DataType::String)?;
    let ca = casted.str()?;
    Ok(ca
        .into_iter()
        .map(|v| {
            v.map(|s| s.trim().trim_matches('"').to_string())
                .filter(|s| !s.is_empty())
        })
        .collect())
}

fn required_ints(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>, LoaderError> {
    ints(column(df, name)?)
}

fn optional_ints(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>, LoaderError> {
    match df.column(name) {
        Ok(col) => ints(col),
        Err(_) => Ok(vec![None; df.height()]),
    }
}

fn ints(col: &Column) -> Result<Vec<Option<i64>>, LoaderError> {
    // Go through Float64 so "1.2e6"-style population cells still parse
    let casted = col.cast(&DataType::Float64)?;
    let ca = casted.f64()?;
    Ok(ca
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()).map(|x| x.round() as i64))
        .collect())
}

fn floats(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, LoaderError> {
    let casted = column(df, name)?.cast(&DataType::Float64)?;
    let ca = casted.f64()?;
    Ok(ca.into_iter().collect())
}
