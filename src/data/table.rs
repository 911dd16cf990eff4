//! Base Table Module
//! Immutable unemployment-by-country-by-year table with continent and population indexes.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::RangeInclusive;
use thiserror::Error;

/// First year covered by the source dataset
pub const DEFAULT_FIRST_YEAR: i32 = 1991;
/// Last year covered by the source dataset
pub const DEFAULT_LAST_YEAR: i32 = 2020;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Duplicate country name: {0}")]
    DuplicateCountry(String),
    #[error("Duplicate country code: {0}")]
    DuplicateCode(String),
    #[error("Country {0} has no continent")]
    MissingContinent(String),
    #[error("Invalid year range {first}..={last}")]
    InvalidYearRange { first: i32, last: i32 },
}

/// Closed range of valid years. Only constructible through `new`, so
/// `first <= last` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    first: i32,
    last: i32,
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            first: DEFAULT_FIRST_YEAR,
            last: DEFAULT_LAST_YEAR,
        }
    }
}

impl YearRange {
    pub fn new(first: i32, last: i32) -> Result<Self, TableError> {
        if first > last {
            return Err(TableError::InvalidYearRange { first, last });
        }
        Ok(Self { first, last })
    }

    pub fn first(&self) -> i32 {
        self.first
    }

    pub fn last(&self) -> i32 {
        self.last
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.first..=self.last).contains(&year)
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.first..=self.last
    }

    pub fn len(&self) -> usize {
        (self.last - self.first) as usize + 1
    }
}

/// One row of the wide-format unemployment table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnemploymentRecord {
    pub country_name: String,
    /// ISO alpha-3 code, used as the map location key
    pub country_code: String,
    pub continent: String,
    /// Join key into the population table
    pub numeric_code: Option<i64>,
    /// Static population column, used when no year-specific value exists
    pub population: Option<u64>,
    pub rate_by_year: BTreeMap<i32, f64>,
}

impl UnemploymentRecord {
    pub fn new(
        country_name: impl Into<String>,
        country_code: impl Into<String>,
        continent: impl Into<String>,
    ) -> Self {
        Self {
            country_name: country_name.into(),
            country_code: country_code.into(),
            continent: continent.into(),
            numeric_code: None,
            population: None,
            rate_by_year: BTreeMap::new(),
        }
    }

    pub fn with_numeric_code(mut self, code: i64) -> Self {
        self.numeric_code = Some(code);
        self
    }

    pub fn with_population(mut self, population: u64) -> Self {
        self.population = Some(population);
        self
    }

    pub fn with_rate(mut self, year: i32, rate: f64) -> Self {
        self.rate_by_year.insert(year, rate);
        self
    }

    /// Unemployment rate for a year, `None` when the cell is missing.
    pub fn rate(&self, year: i32) -> Option<f64> {
        self.rate_by_year.get(&year).copied()
    }
}

/// Year-specific population keyed by numeric country code.
#[derive(Debug, Clone, Default)]
pub struct PopulationTable {
    by_code_year: HashMap<(i64, i32), u64>,
}

impl PopulationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous one if the key was already present.
    pub fn insert(&mut self, numeric_code: i64, year: i32, population: u64) -> Option<u64> {
        self.by_code_year.insert((numeric_code, year), population)
    }

    pub fn get(&self, numeric_code: i64, year: i32) -> Option<u64> {
        self.by_code_year.get(&(numeric_code, year)).copied()
    }

    pub fn len(&self) -> usize {
        self.by_code_year.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code_year.is_empty()
    }
}

/// Continent name with its member countries in table order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContinentGroup {
    pub name: String,
    pub countries: Vec<String>,
}

/// The base table. Built once, read-only afterwards.
#[derive(Debug)]
pub struct UnemploymentTable {
    records: Vec<UnemploymentRecord>,
    years: YearRange,
    populations: PopulationTable,
    by_name: HashMap<String, usize>,
    continents: Vec<ContinentGroup>,
    continent_rows: Vec<Vec<usize>>,
    continent_index: HashMap<String, usize>,
}

impl UnemploymentTable {
    /// Validate records and build lookup indexes.
    ///
    /// Non-finite rates and rates outside `years` are dropped so that every
    /// stored rate is a usable data point.
    pub fn new(
        mut records: Vec<UnemploymentRecord>,
        populations: PopulationTable,
        years: YearRange,
    ) -> Result<Self, TableError> {
        let mut by_name = HashMap::with_capacity(records.len());
        let mut codes = HashSet::with_capacity(records.len());
        let mut continents: Vec<ContinentGroup> = Vec::new();
        let mut continent_rows: Vec<Vec<usize>> = Vec::new();
        let mut continent_index: HashMap<String, usize> = HashMap::new();

        for (row, record) in records.iter_mut().enumerate() {
            if record.continent.trim().is_empty() {
                return Err(TableError::MissingContinent(record.country_name.clone()));
            }
            if by_name.insert(record.country_name.clone(), row).is_some() {
                return Err(TableError::DuplicateCountry(record.country_name.clone()));
            }
            if !codes.insert(record.country_code.clone()) {
                return Err(TableError::DuplicateCode(record.country_code.clone()));
            }

            record
                .rate_by_year
                .retain(|year, rate| rate.is_finite() && years.contains(*year));

            let slot = match continent_index.get(&record.continent) {
                Some(&slot) => slot,
                None => {
                    continent_index.insert(record.continent.clone(), continents.len());
                    continents.push(ContinentGroup {
                        name: record.continent.clone(),
                        countries: Vec::new(),
                    });
                    continent_rows.push(Vec::new());
                    continents.len() - 1
                }
            };
            continents[slot].countries.push(record.country_name.clone());
            continent_rows[slot].push(row);
        }

        Ok(Self {
            records,
            years,
            populations,
            by_name,
            continents,
            continent_rows,
            continent_index,
        })
    }

    pub fn records(&self) -> &[UnemploymentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn years(&self) -> YearRange {
        self.years
    }

    /// Row index of a country.
    pub fn index_of(&self, country: &str) -> Option<usize> {
        self.by_name.get(country).copied()
    }

    pub fn record(&self, country: &str) -> Option<&UnemploymentRecord> {
        self.index_of(country).map(|row| &self.records[row])
    }

    /// Record at a row index obtained from this table.
    pub fn row(&self, row: usize) -> &UnemploymentRecord {
        &self.records[row]
    }

    /// Continents in order of first appearance.
    pub fn continents(&self) -> &[ContinentGroup] {
        &self.continents
    }

    pub fn continent(&self, name: &str) -> Option<&ContinentGroup> {
        self.continent_index
            .get(name)
            .map(|&slot| &self.continents[slot])
    }

    /// Row indexes of a continent's members in table order.
    pub fn continent_rows(&self, name: &str) -> Option<&[usize]> {
        self.continent_index
            .get(name)
            .map(|&slot| self.continent_rows[slot].as_slice())
    }

    pub fn continent_names(&self) -> Vec<String> {
        self.continents.iter().map(|c| c.name.clone()).collect()
    }

    pub fn country_names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.country_name.clone()).collect()
    }

    /// Population of a country in a year.
    ///
    /// Year-specific population wins; otherwise the record's static value.
    /// A numeric code missing from the population table is not an error.
    pub fn population(&self, record: &UnemploymentRecord, year: i32) -> Option<u64> {
        record
            .numeric_code
            .and_then(|code| self.populations.get(code, year))
            .or(record.population)
    }

    pub fn populations(&self) -> &PopulationTable {
        &self.populations
    }
}
