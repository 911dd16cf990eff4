//! Dashboard module - Selection state and view routing for the presentation layer

mod app;
mod selection;
mod view;

pub use app::{Dashboard, DEFAULT_TOP_LIMIT};
pub use selection::{Selection, DEFAULT_COUNTRIES};
pub use view::{ContinentPage, DashboardOptions, ViewRequest, ViewResponse};
