//! Charts module - Chart-ready projections of aggregation results

mod map;
mod series;

pub use map::WorldMap;
pub use series::{ChangeBar, ChangeSeries, ChartBundle, Heatmap, LineSeries};
