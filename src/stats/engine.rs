//! Aggregation Engine Module
//! Pure derived views over the immutable base table.

use crate::data::{UnemploymentTable, YearRange};
use crate::stats::calculator::{mean, round2, GroupSummary, StatsCalculator};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregationError {
    #[error("Unknown country: {0}")]
    UnknownCountry(String),
    #[error("Unknown continent: {0}")]
    UnknownContinent(String),
    #[error("Year {year} outside {first}..={last}")]
    YearOutOfRange { year: i32, first: i32, last: i32 },
    #[error("Limit must be positive")]
    InvalidLimit,
    #[error("Invalid year range {from}..={to}")]
    InvalidRange { from: i32, to: i32 },
}

/// Set of countries an aggregation runs over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    All,
    Continent(String),
    Countries(Vec<String>),
}

impl Group {
    /// `Continent(name)` when a name is given, otherwise every country.
    pub fn continent_or_all(continent: Option<&str>) -> Self {
        match continent {
            Some(name) => Group::Continent(name.to_string()),
            None => Group::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledValue {
    pub label: String,
    pub value: f64,
}

impl LabeledValue {
    fn new(label: &str, value: f64) -> Self {
        Self {
            label: label.to_string(),
            value,
        }
    }
}

/// Per-country deviation from the unweighted group mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviationView {
    pub year: i32,
    /// `None` when no member has data for the year
    pub group_mean: Option<f64>,
    pub deviations: Vec<LabeledValue>,
}

/// Per-country year-over-year change relative to the group's mean change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeDeviationView {
    pub year: i32,
    pub mean_change: Option<f64>,
    pub deviations: Vec<LabeledValue>,
}

/// Population-weighted rate of one continent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContinentRate {
    pub continent: String,
    /// `None` when no member has both a rate and a population
    pub rate: Option<f64>,
    pub population: u64,
    pub countries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub country: String,
    pub year: i32,
    pub rate: f64,
}

/// Long-form `(country, year, rate)` triples for a selection and year range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub from: i32,
    pub to: i32,
    pub countries: Vec<String>,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub country_code: String,
    pub country_name: String,
    pub rate: f64,
    pub population: Option<u64>,
}

/// Computes derived views from a shared read-only table.
#[derive(Debug, Clone)]
pub struct AggregationEngine {
    table: Arc<UnemploymentTable>,
}

impl AggregationEngine {
    pub fn new(table: Arc<UnemploymentTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &UnemploymentTable {
        &self.table
    }

    pub fn years(&self) -> YearRange {
        self.table.years()
    }

    fn check_year(&self, year: i32) -> Result<(), AggregationError> {
        let years = self.table.years();
        if years.contains(year) {
            Ok(())
        } else {
            Err(AggregationError::YearOutOfRange {
                year,
                first: years.first(),
                last: years.last(),
            })
        }
    }

    /// Row indexes of a group in table order, or the caller's order for
    /// explicit country lists (duplicates dropped).
    fn resolve(&self, group: &Group) -> Result<Vec<usize>, AggregationError> {
        match group {
            Group::All => Ok((0..self.table.len()).collect()),
            Group::Continent(name) => self
                .table
                .continent_rows(name)
                .map(<[usize]>::to_vec)
                .ok_or_else(|| AggregationError::UnknownContinent(name.clone())),
            Group::Countries(names) => {
                let mut seen = HashSet::with_capacity(names.len());
                let mut rows = Vec::with_capacity(names.len());
                for name in names {
                    let row = self
                        .table
                        .index_of(name)
                        .ok_or_else(|| AggregationError::UnknownCountry(name.clone()))?;
                    if seen.insert(row) {
                        rows.push(row);
                    }
                }
                Ok(rows)
            }
        }
    }

    /// `(name, rate)` for each member with data in `year`.
    fn rates(&self, rows: &[usize], year: i32) -> Vec<(&str, f64)> {
        rows.iter()
            .filter_map(|&row| {
                let record = self.table.row(row);
                record
                    .rate(year)
                    .map(|rate| (record.country_name.as_str(), rate))
            })
            .collect()
    }

    /// Highest rates in `scope` for `year`, descending; ties keep table order.
    pub fn top_countries(
        &self,
        scope: &Group,
        year: i32,
        limit: usize,
    ) -> Result<Vec<LabeledValue>, AggregationError> {
        if limit == 0 {
            return Err(AggregationError::InvalidLimit);
        }
        self.check_year(year)?;
        let rows = self.resolve(scope)?;

        let mut ranked = self.rates(&rows, year);
        // Vec::sort_by is stable
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(limit);

        debug!(?scope, year, limit, returned = ranked.len(), "top countries");
        Ok(ranked
            .into_iter()
            .map(|(name, rate)| LabeledValue::new(name, rate))
            .collect())
    }

    /// Deviation of each member's rate from the unweighted group mean.
    pub fn deviation_from_group_mean(
        &self,
        group: &Group,
        year: i32,
    ) -> Result<DeviationView, AggregationError> {
        self.check_year(year)?;
        let rows = self.resolve(group)?;

        let rates = self.rates(&rows, year);
        let values: Vec<f64> = rates.iter().map(|(_, rate)| *rate).collect();
        let group_mean = mean(&values);

        let deviations = match group_mean {
            Some(m) => rates
                .iter()
                .map(|(name, rate)| LabeledValue::new(name, round2(rate - m)))
                .collect(),
            None => Vec::new(),
        };

        debug!(?group, year, members = deviations.len(), "deviation from mean");
        Ok(DeviationView {
            year,
            group_mean: group_mean.map(round2),
            deviations,
        })
    }

    /// Year-over-year change of each member relative to the group's mean change.
    ///
    /// The first year of the table has no predecessor and yields an empty view.
    pub fn year_over_year_change(
        &self,
        group: &Group,
        year: i32,
    ) -> Result<ChangeDeviationView, AggregationError> {
        self.check_year(year)?;
        let rows = self.resolve(group)?;

        if year == self.table.years().first() {
            return Ok(ChangeDeviationView {
                year,
                mean_change: None,
                deviations: Vec::new(),
            });
        }

        let changes: Vec<(&str, f64)> = rows
            .iter()
            .filter_map(|&row| {
                let record = self.table.row(row);
                let current = record.rate(year)?;
                let previous = record.rate(year - 1)?;
                Some((record.country_name.as_str(), current - previous))
            })
            .collect();
        let values: Vec<f64> = changes.iter().map(|(_, change)| *change).collect();
        let mean_change = mean(&values);

        let deviations = match mean_change {
            Some(m) => changes
                .iter()
                .map(|(name, change)| LabeledValue::new(name, round2(change - m)))
                .collect(),
            None => Vec::new(),
        };

        debug!(?group, year, members = deviations.len(), "change deviation");
        Ok(ChangeDeviationView {
            year,
            mean_change: mean_change.map(round2),
            deviations,
        })
    }

    /// Population-weighted unemployment rate per continent.
    ///
    /// Only countries with both a rate and a known population contribute to
    /// either sum.
    pub fn continent_weighted_rate(
        &self,
        year: i32,
    ) -> Result<Vec<ContinentRate>, AggregationError> {
        self.check_year(year)?;
        let table = &self.table;

        let rates: Vec<ContinentRate> = table
            .continents()
            .par_iter()
            .map(|group| {
                let rows = table.continent_rows(&group.name).unwrap_or_default();
                let mut unemployed = 0.0;
                let mut population: u64 = 0;
                let mut countries = 0usize;

                for &row in rows {
                    let record = table.row(row);
                    let (Some(rate), Some(pop)) =
                        (record.rate(year), table.population(record, year))
                    else {
                        continue;
                    };
                    unemployed += rate * pop as f64 / 100.0;
                    population += pop;
                    countries += 1;
                }

                let rate = if population > 0 {
                    Some(round2(unemployed / population as f64 * 100.0))
                } else {
                    None
                };

                ContinentRate {
                    continent: group.name.clone(),
                    rate,
                    population,
                    countries,
                }
            })
            .collect();

        debug!(year, continents = rates.len(), "continent weighted rates");
        Ok(rates)
    }

    /// Reshape selected countries into long-form triples for `from..=to`.
    ///
    /// Ordered by the given country order, then year. Missing rates are dropped.
    pub fn time_series(
        &self,
        countries: &[String],
        from: i32,
        to: i32,
    ) -> Result<TimeSeries, AggregationError> {
        if from > to {
            return Err(AggregationError::InvalidRange { from, to });
        }
        self.check_year(from)?;
        self.check_year(to)?;
        let rows = self.resolve(&Group::Countries(countries.to_vec()))?;

        let mut names = Vec::with_capacity(rows.len());
        let mut points = Vec::new();
        for row in rows {
            let record = self.table.row(row);
            names.push(record.country_name.clone());
            points.extend(
                record
                    .rate_by_year
                    .range(from..=to)
                    .map(|(&year, &rate)| SeriesPoint {
                        country: record.country_name.clone(),
                        year,
                        rate,
                    }),
            );
        }

        debug!(from, to, countries = names.len(), points = points.len(), "time series");
        Ok(TimeSeries {
            from,
            to,
            countries: names,
            points,
        })
    }

    /// Descriptive statistics of member rates for a year.
    pub fn group_summary(
        &self,
        group: &Group,
        year: i32,
    ) -> Result<Option<GroupSummary>, AggregationError> {
        self.check_year(year)?;
        let rows = self.resolve(group)?;
        let values: Vec<f64> = self.rates(&rows, year).into_iter().map(|(_, r)| r).collect();
        Ok(StatsCalculator::describe(&values))
    }

    /// Choropleth points for every country with data in `year`.
    pub fn map_points(&self, year: i32) -> Result<Vec<MapPoint>, AggregationError> {
        self.check_year(year)?;
        Ok(self
            .table
            .records()
            .iter()
            .filter_map(|record| {
                Some(MapPoint {
                    country_code: record.country_code.clone(),
                    country_name: record.country_name.clone(),
                    rate: record.rate(year)?,
                    population: self.table.population(record, year),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{PopulationTable, UnemploymentRecord};

    fn create_test_engine() -> AggregationEngine {
        let records = vec![
            UnemploymentRecord::new("Spain", "ESP", "Europe")
                .with_numeric_code(724)
                .with_population(900)
                .with_rate(1991, 16.0)
                .with_rate(1992, 18.0)
                .with_rate(1993, 20.0),
            UnemploymentRecord::new("Poland", "POL", "Europe")
                .with_numeric_code(616)
                .with_population(100)
                .with_rate(1991, 10.0)
                .with_rate(1992, 11.0)
                .with_rate(1993, 10.0),
            UnemploymentRecord::new("Greece", "GRC", "Europe")
                .with_rate(1991, 8.0)
                .with_rate(1993, 9.5),
            UnemploymentRecord::new("Japan", "JPN", "Asia")
                .with_numeric_code(392)
                .with_rate(1991, 2.0)
                .with_rate(1992, 2.2)
                .with_rate(1993, 2.5),
            UnemploymentRecord::new("Nepal", "NPL", "Asia")
                .with_rate(1991, 10.0)
                .with_rate(1992, 10.0)
                .with_rate(1993, 11.0),
            UnemploymentRecord::new("Chad", "TCD", "Africa"),
        ];
        let mut populations = PopulationTable::new();
        populations.insert(392, 1991, 120);
        populations.insert(392, 1993, 0);

        let years = YearRange::new(1991, 1993).unwrap();
        let table = UnemploymentTable::new(records, populations, years).unwrap();
        AggregationEngine::new(Arc::new(table))
    }

    fn labels(values: &[LabeledValue]) -> Vec<&str> {
        values.iter().map(|v| v.label.as_str()).collect()
    }

    #[test]
    fn test_top_countries_descending_and_limited() {
        let engine = create_test_engine();

        let top = engine.top_countries(&Group::All, 1991, 3).unwrap();
        assert_eq!(labels(&top), vec!["Spain", "Poland", "Nepal"]);
        assert!(top.windows(2).all(|w| w[0].value >= w[1].value));

        let europe = engine
            .top_countries(&Group::Continent("Europe".into()), 1993, 10)
            .unwrap();
        assert_eq!(labels(&europe), vec!["Spain", "Poland", "Greece"]);
    }

    #[test]
    fn test_top_countries_ties_keep_table_order() {
        let engine = create_test_engine();
        // Poland and Nepal both have 10.0 in 1991
        let top = engine.top_countries(&Group::All, 1991, 10).unwrap();
        let poland = top.iter().position(|v| v.label == "Poland").unwrap();
        let nepal = top.iter().position(|v| v.label == "Nepal").unwrap();
        assert!(poland < nepal);
    }

    #[test]
    fn test_top_countries_returns_available_rows_only() {
        let engine = create_test_engine();
        // Greece has no 1992 rate and Chad has none at all
        let top = engine.top_countries(&Group::All, 1992, 10).unwrap();
        assert_eq!(top.len(), 4);
        assert!(!labels(&top).contains(&"Greece"));
    }

    #[test]
    fn test_top_countries_input_errors() {
        let engine = create_test_engine();
        assert_eq!(
            engine.top_countries(&Group::All, 1991, 0),
            Err(AggregationError::InvalidLimit)
        );
        assert_eq!(
            engine.top_countries(&Group::All, 1990, 5),
            Err(AggregationError::YearOutOfRange {
                year: 1990,
                first: 1991,
                last: 1993
            })
        );
        assert_eq!(
            engine.top_countries(&Group::Continent("Oceania".into()), 1991, 5),
            Err(AggregationError::UnknownContinent("Oceania".into()))
        );
    }

    #[test]
    fn test_deviation_sums_to_zero() {
        let engine = create_test_engine();
        let view = engine
            .deviation_from_group_mean(&Group::Continent("Europe".into()), 1991)
            .unwrap();

        // mean of 16, 10, 8
        assert_eq!(view.group_mean, Some(11.33));
        assert_eq!(labels(&view.deviations), vec!["Spain", "Poland", "Greece"]);
        assert_eq!(view.deviations[0].value, 4.67);
        let total: f64 = view.deviations.iter().map(|d| d.value).sum();
        assert!(total.abs() <= 0.01 * view.deviations.len() as f64);
    }

    #[test]
    fn test_deviation_omits_missing_rates() {
        let engine = create_test_engine();
        let view = engine
            .deviation_from_group_mean(&Group::Continent("Europe".into()), 1992)
            .unwrap();

        assert_eq!(view.group_mean, Some(14.5));
        assert_eq!(labels(&view.deviations), vec!["Spain", "Poland"]);
        assert_eq!(view.deviations[0].value, 3.5);
        assert_eq!(view.deviations[1].value, -3.5);
    }

    #[test]
    fn test_deviation_of_group_without_data_is_empty() {
        let engine = create_test_engine();
        let view = engine
            .deviation_from_group_mean(&Group::Continent("Africa".into()), 1991)
            .unwrap();
        assert_eq!(view.group_mean, None);
        assert!(view.deviations.is_empty());
    }

    #[test]
    fn test_year_over_year_first_year_is_empty() {
        let engine = create_test_engine();
        for group in [
            Group::All,
            Group::Continent("Europe".into()),
            Group::Continent("Asia".into()),
            Group::Continent("Africa".into()),
        ] {
            let view = engine.year_over_year_change(&group, 1991).unwrap();
            assert!(view.deviations.is_empty());
            assert_eq!(view.mean_change, None);
        }
    }

    #[test]
    fn test_year_over_year_change_deviation() {
        let engine = create_test_engine();
        let view = engine
            .year_over_year_change(&Group::Continent("Europe".into()), 1993)
            .unwrap();

        // Spain +2.0, Poland -1.0; Greece has no 1992 rate
        assert_eq!(view.mean_change, Some(0.5));
        assert_eq!(labels(&view.deviations), vec!["Spain", "Poland"]);
        assert_eq!(view.deviations[0].value, 1.5);
        assert_eq!(view.deviations[1].value, -1.5);
    }

    #[test]
    fn test_weighted_rate_differs_from_unweighted_mean() {
        let records = vec![
            UnemploymentRecord::new("A", "AAA", "Synthetic")
                .with_population(100)
                .with_rate(2000, 10.0),
            UnemploymentRecord::new("B", "BBB", "Synthetic")
                .with_population(900)
                .with_rate(2000, 20.0),
        ];
        let table = UnemploymentTable::new(
            records,
            PopulationTable::new(),
            YearRange::new(2000, 2000).unwrap(),
        )
        .unwrap();
        let engine = AggregationEngine::new(Arc::new(table));

        let rates = engine.continent_weighted_rate(2000).unwrap();
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].rate, Some(19.0));
        assert_eq!(rates[0].population, 1000);

        let unweighted = engine
            .deviation_from_group_mean(&Group::Continent("Synthetic".into()), 2000)
            .unwrap();
        assert_eq!(unweighted.group_mean, Some(15.0));
    }

    #[test]
    fn test_weighted_rate_without_population_is_none() {
        let engine = create_test_engine();
        let rates = engine.continent_weighted_rate(1993).unwrap();
        assert_eq!(
            rates.iter().map(|r| r.continent.as_str()).collect::<Vec<_>>(),
            vec!["Europe", "Asia", "Africa"]
        );

        // Spain 20% of 900 and Poland 10% of 100; Greece has no population
        assert_eq!(rates[0].rate, Some(19.0));
        assert_eq!(rates[0].countries, 2);
        // Japan's 1993 population is zero, Nepal's unknown
        assert_eq!(rates[1].rate, None);
        assert_eq!(rates[2].rate, None);
        assert_eq!(rates[2].population, 0);
    }

    #[test]
    fn test_weighted_rate_uses_year_specific_population() {
        let engine = create_test_engine();
        let rates = engine.continent_weighted_rate(1991).unwrap();
        // Only Japan has a 1991 population in Asia
        assert_eq!(rates[1].rate, Some(2.0));
        assert_eq!(rates[1].population, 120);
    }

    #[test]
    fn test_time_series_filters_range_and_drops_missing() {
        let engine = create_test_engine();
        let series = engine
            .time_series(&["Greece".to_string(), "Japan".to_string()], 1992, 1993)
            .unwrap();

        let triples: Vec<(&str, i32)> = series
            .points
            .iter()
            .map(|p| (p.country.as_str(), p.year))
            .collect();
        assert_eq!(
            triples,
            vec![("Greece", 1993), ("Japan", 1992), ("Japan", 1993)]
        );
        assert!(series.points.iter().all(|p| (1992..=1993).contains(&p.year)));
        assert_eq!(series.countries, vec!["Greece", "Japan"]);
    }

    #[test]
    fn test_time_series_input_errors() {
        let engine = create_test_engine();
        assert_eq!(
            engine.time_series(&["Spain".to_string()], 1993, 1992),
            Err(AggregationError::InvalidRange { from: 1993, to: 1992 })
        );
        assert_eq!(
            engine.time_series(&["Narnia".to_string()], 1991, 1992),
            Err(AggregationError::UnknownCountry("Narnia".into()))
        );
        assert!(engine.time_series(&["Spain".to_string()], 1991, 1999).is_err());
    }

    #[test]
    fn test_group_summary() {
        let engine = create_test_engine();
        let summary = engine
            .group_summary(&Group::Continent("Europe".into()), 1991)
            .unwrap()
            .unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.median, 10.0);
        assert_eq!(summary.max, 16.0);

        let empty = engine
            .group_summary(&Group::Continent("Africa".into()), 1991)
            .unwrap();
        assert!(empty.is_none());
    }

    #[test]
    fn test_map_points_skip_missing_rates() {
        let engine = create_test_engine();
        let points = engine.map_points(1992).unwrap();
        let codes: Vec<&str> = points.iter().map(|p| p.country_code.as_str()).collect();
        assert_eq!(codes, vec!["ESP", "POL", "JPN", "NPL"]);
        assert_eq!(points[0].population, Some(900));
        assert_eq!(points[2].population, None);
    }

    #[test]
    fn test_aggregations_are_idempotent() {
        let engine = create_test_engine();
        let group = Group::Continent("Europe".into());

        assert_eq!(
            engine.top_countries(&group, 1993, 10),
            engine.top_countries(&group, 1993, 10)
        );
        assert_eq!(
            engine.deviation_from_group_mean(&group, 1993),
            engine.deviation_from_group_mean(&group, 1993)
        );
        assert_eq!(
            engine.continent_weighted_rate(1992),
            engine.continent_weighted_rate(1992)
        );
    }
}
