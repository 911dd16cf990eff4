//! View Requests
//! Serializable requests from the presentation layer and the matching responses.

use crate::charts::{ChartBundle, WorldMap};
use crate::stats::{
    ChangeDeviationView, ContinentRate, DeviationView, GroupSummary, LabeledValue, TimeSeries,
};
use serde::{Deserialize, Serialize};

/// One user interaction's worth of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewRequest {
    /// Continents, countries and years for the dropdowns
    Options,
    WorldMap {
        year: i32,
    },
    TopCountries {
        #[serde(default)]
        continent: Option<String>,
        year: i32,
        #[serde(default)]
        limit: Option<usize>,
    },
    Deviation {
        #[serde(default)]
        continent: Option<String>,
        year: i32,
    },
    ChangeDeviation {
        #[serde(default)]
        continent: Option<String>,
        year: i32,
    },
    WeightedRates {
        year: i32,
    },
    Summary {
        #[serde(default)]
        continent: Option<String>,
        year: i32,
    },
    ContinentPage {
        continent: String,
        year: i32,
    },
    TimeSeries {
        countries: Vec<String>,
        from: i32,
        to: i32,
    },
    /// Line chart, heatmap and change bars; the current selection when
    /// `countries` is omitted
    Charts {
        #[serde(default)]
        countries: Option<Vec<String>>,
        from: i32,
        to: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOptions {
    pub continents: Vec<String>,
    pub countries: Vec<String>,
    pub years: Vec<i32>,
    pub selected: Vec<String>,
}

/// Top-N tables and deviation bars for one continent and year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContinentPage {
    pub continent: String,
    pub year: i32,
    pub top_global: Vec<LabeledValue>,
    pub top_continent: Vec<LabeledValue>,
    pub deviation: DeviationView,
    pub change_deviation: ChangeDeviationView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", content = "data", rename_all = "snake_case")]
pub enum ViewResponse {
    Options(DashboardOptions),
    WorldMap(WorldMap),
    TopCountries(Vec<LabeledValue>),
    Deviation(DeviationView),
    ChangeDeviation(ChangeDeviationView),
    WeightedRates(Vec<ContinentRate>),
    Summary(Option<GroupSummary>),
    ContinentPage(ContinentPage),
    TimeSeries(TimeSeries),
    Charts(ChartBundle),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parsing() {
        let request: ViewRequest =
            serde_json::from_str(r#"{"view":"top_countries","year":2020}"#).unwrap();
        assert_eq!(
            request,
            ViewRequest::TopCountries {
                continent: None,
                year: 2020,
                limit: None
            }
        );

        let request: ViewRequest = serde_json::from_str(
            r#"{"view":"charts","countries":["Poland"],"from":1991,"to":2000}"#,
        )
        .unwrap();
        assert_eq!(
            request,
            ViewRequest::Charts {
                countries: Some(vec!["Poland".to_string()]),
                from: 1991,
                to: 2000
            }
        );

        let request: ViewRequest = serde_json::from_str(r#"{"view":"options"}"#).unwrap();
        assert_eq!(request, ViewRequest::Options);
    }

    #[test]
    fn test_unknown_view_rejected() {
        assert!(serde_json::from_str::<ViewRequest>(r#"{"view":"pie_chart"}"#).is_err());
    }

    #[test]
    fn test_response_is_tagged() {
        let response = ViewResponse::TopCountries(vec![LabeledValue {
            label: "Spain".to_string(),
            value: 14.8,
        }]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["view"], "top_countries");
        assert_eq!(json["data"][0]["label"], "Spain");
    }
}
