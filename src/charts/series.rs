//! Chart Series Module
//! Line chart, heatmap and year-over-year bars projected from one long-form series.

use crate::stats::{round2, TimeSeries};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// One country's line in the line chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub country: String,
    /// `(year, rate)` ascending by year
    pub points: Vec<(i32, f64)>,
}

/// Country × year grid. Cells without data are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub years: Vec<i32>,
    pub countries: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeBar {
    pub year: i32,
    pub change: f64,
}

/// One country's bars in the grouped year-over-year chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeSeries {
    pub country: String,
    pub bars: Vec<ChangeBar>,
}

/// The three per-country charts for one selection and year range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBundle {
    pub from: i32,
    pub to: i32,
    pub line: Vec<LineSeries>,
    pub heatmap: Heatmap,
    pub change_bars: Vec<ChangeSeries>,
}

impl ChartBundle {
    /// Build all three charts from the same series so they always agree.
    ///
    /// Every selected country gets a row, including one without any data
    /// point in the range (empty line, all-`None` heatmap row, no bars).
    pub fn from_series(series: &TimeSeries) -> Self {
        let slot_of: HashMap<&str, usize> = series
            .countries
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();

        let mut by_country: Vec<BTreeMap<i32, f64>> =
            vec![BTreeMap::new(); series.countries.len()];
        for point in &series.points {
            if let Some(&slot) = slot_of.get(point.country.as_str()) {
                by_country[slot].insert(point.year, point.rate);
            }
        }

        let rows: Vec<(&String, &BTreeMap<i32, f64>)> =
            series.countries.iter().zip(by_country.iter()).collect();

        let line = rows
            .iter()
            .map(|(country, rates)| LineSeries {
                country: (*country).clone(),
                points: rates.iter().map(|(&y, &r)| (y, r)).collect(),
            })
            .collect();

        let years: Vec<i32> = (series.from..=series.to).collect();
        let heatmap = Heatmap {
            countries: rows.iter().map(|(c, _)| (*c).clone()).collect(),
            cells: rows
                .iter()
                .map(|(_, rates)| years.iter().map(|y| rates.get(y).copied()).collect())
                .collect(),
            years,
        };

        let change_bars = rows
            .iter()
            .map(|(country, rates)| ChangeSeries {
                country: (*country).clone(),
                bars: rates
                    .iter()
                    .filter_map(|(&year, &rate)| {
                        let previous = rates.get(&(year - 1))?;
                        Some(ChangeBar {
                            year,
                            change: round2(rate - previous),
                        })
                    })
                    .collect(),
            })
            .collect();

        Self {
            from: series.from,
            to: series.to,
            line,
            heatmap,
            change_bars,
        }
    }
}
