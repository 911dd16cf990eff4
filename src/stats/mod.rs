//! Stats module - Aggregation engine and descriptive statistics

mod calculator;
mod engine;

pub use calculator::{round2, GroupSummary, StatsCalculator};
pub use engine::{
    AggregationEngine, AggregationError, ChangeDeviationView, ContinentRate, DeviationView, Group,
    LabeledValue, MapPoint, SeriesPoint, TimeSeries,
};
