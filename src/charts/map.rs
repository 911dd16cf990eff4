//! World Map Module
//! Choropleth data: one location per country plus the color scale bounds.

use crate::stats::MapPoint;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldMap {
    pub year: i32,
    pub points: Vec<MapPoint>,
    pub min_rate: Option<f64>,
    pub max_rate: Option<f64>,
}

impl WorldMap {
    pub fn new(year: i32, points: Vec<MapPoint>) -> Self {
        let (min_rate, max_rate) = points.iter().fold((None, None), |(lo, hi), p| {
            (
                Some(lo.map_or(p.rate, |v: f64| v.min(p.rate))),
                Some(hi.map_or(p.rate, |v: f64| v.max(p.rate))),
            )
        });
        Self {
            year,
            points,
            min_rate,
            max_rate,
        }
    }
}
