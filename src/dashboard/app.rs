//! Dashboard Application
//! Owns the engine handle and the country selection, and routes view requests.

use crate::charts::{ChartBundle, WorldMap};
use crate::dashboard::selection::{Selection, DEFAULT_COUNTRIES};
use crate::dashboard::view::{ContinentPage, DashboardOptions, ViewRequest, ViewResponse};
use crate::data::UnemploymentTable;
use crate::stats::{AggregationEngine, AggregationError, Group};
use std::sync::Arc;
use tracing::{debug, info};

/// Default row count of the top-N tables
pub const DEFAULT_TOP_LIMIT: usize = 10;

pub struct Dashboard {
    engine: AggregationEngine,
    selection: Selection,
    top_limit: usize,
}

impl Dashboard {
    /// Create a dashboard with the default countries that exist in `table` selected.
    ///
    /// `top_limit` is used as is; zero makes every default top-N view fail
    /// with `InvalidLimit`.
    pub fn new(table: Arc<UnemploymentTable>, top_limit: usize) -> Self {
        let selection = DEFAULT_COUNTRIES
            .iter()
            .copied()
            .filter(|name| table.index_of(name).is_some())
            .collect();
        Self {
            engine: AggregationEngine::new(table),
            selection,
            top_limit,
        }
    }

    pub fn engine(&self) -> &AggregationEngine {
        &self.engine
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Add a country chip. Returns false when it was already selected.
    pub fn select_country(&mut self, name: &str) -> Result<bool, AggregationError> {
        if self.engine.table().index_of(name).is_none() {
            return Err(AggregationError::UnknownCountry(name.to_string()));
        }
        let added = self.selection.add(name);
        debug!(country = name, added, "select country");
        Ok(added)
    }

    pub fn deselect_country(&mut self, name: &str) -> bool {
        self.selection.remove(name)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn options(&self) -> DashboardOptions {
        let table = self.engine.table();
        DashboardOptions {
            continents: table.continent_names(),
            countries: table.country_names(),
            years: table.years().years().collect(),
            selected: self.selection.as_slice().to_vec(),
        }
    }

    pub fn world_map(&self, year: i32) -> Result<WorldMap, AggregationError> {
        Ok(WorldMap::new(year, self.engine.map_points(year)?))
    }

    pub fn continent_page(
        &self,
        continent: &str,
        year: i32,
    ) -> Result<ContinentPage, AggregationError> {
        let group = Group::Continent(continent.to_string());
        Ok(ContinentPage {
            continent: continent.to_string(),
            year,
            top_global: self.engine.top_countries(&Group::All, year, self.top_limit)?,
            top_continent: self.engine.top_countries(&group, year, self.top_limit)?,
            deviation: self.engine.deviation_from_group_mean(&group, year)?,
            change_deviation: self.engine.year_over_year_change(&group, year)?,
        })
    }

    /// Line chart, heatmap and change bars for explicit countries.
    pub fn country_charts(
        &self,
        countries: &[String],
        from: i32,
        to: i32,
    ) -> Result<ChartBundle, AggregationError> {
        let series = self.engine.time_series(countries, from, to)?;
        Ok(ChartBundle::from_series(&series))
    }

    /// Charts for the current selection.
    pub fn selected_charts(&self, from: i32, to: i32) -> Result<ChartBundle, AggregationError> {
        self.country_charts(self.selection.as_slice(), from, to)
    }

    pub fn handle(&self, request: &ViewRequest) -> Result<ViewResponse, AggregationError> {
        info!(?request, "handling view request");
        let engine = &self.engine;
        let response = match request {
            ViewRequest::Options => ViewResponse::Options(self.options()),
            ViewRequest::WorldMap { year } => ViewResponse::WorldMap(self.world_map(*year)?),
            ViewRequest::TopCountries {
                continent,
                year,
                limit,
            } => ViewResponse::TopCountries(engine.top_countries(
                &Group::continent_or_all(continent.as_deref()),
                *year,
                limit.unwrap_or(self.top_limit),
            )?),
            ViewRequest::Deviation { continent, year } => ViewResponse::Deviation(
                engine.deviation_from_group_mean(
                    &Group::continent_or_all(continent.as_deref()),
                    *year,
                )?,
            ),
            ViewRequest::ChangeDeviation { continent, year } => ViewResponse::ChangeDeviation(
                engine.year_over_year_change(
                    &Group::continent_or_all(continent.as_deref()),
                    *year,
                )?,
            ),
            ViewRequest::WeightedRates { year } => {
                ViewResponse::WeightedRates(engine.continent_weighted_rate(*year)?)
            }
            ViewRequest::Summary { continent, year } => ViewResponse::Summary(
                engine.group_summary(&Group::continent_or_all(continent.as_deref()), *year)?,
            ),
            ViewRequest::ContinentPage { continent, year } => {
                ViewResponse::ContinentPage(self.continent_page(continent, *year)?)
            }
            ViewRequest::TimeSeries {
                countries,
                from,
                to,
            } => ViewResponse::TimeSeries(engine.time_series(countries, *from, *to)?),
            ViewRequest::Charts {
                countries,
                from,
                to,
            } => ViewResponse::Charts(match countries {
                Some(countries) => self.country_charts(countries, *from, *to)?,
                None => self.selected_charts(*from, *to)?,
            }),
        };
        Ok(response)
    }
}
