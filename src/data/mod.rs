//! Data module - CSV loading and the immutable base table

mod loader;
mod table;

pub use loader::{DataLoader, LoaderError};
pub use table::{
    ContinentGroup, PopulationTable, TableError, UnemploymentRecord, UnemploymentTable,
    YearRange, DEFAULT_FIRST_YEAR, DEFAULT_LAST_YEAR,
};
