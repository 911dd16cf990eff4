//! Unemployment Atlas - Country unemployment statistics for dashboards
//!
//! Loads the country-by-year unemployment table once, then answers view
//! requests (rankings, deviations, weighted rates, time series) with
//! serializable, chart-ready data.

pub mod charts;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod stats;

pub use config::AtlasConfig;
pub use dashboard::{Dashboard, ViewRequest, ViewResponse};
pub use data::{DataLoader, UnemploymentTable};
pub use stats::{AggregationEngine, AggregationError, Group};
