//! Query-string forms of the dashboard request, for `GET` callers that cannot send a body.

use bazar_core::domain::Dimension;
use bazar_core::pipeline::daily::TrendSource;
use bazar_core::pipeline::Filters;
use bazar_core::report::DashboardRequest;
use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct OptionsQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl OptionsQuery {
    pub fn into_filters(self) -> Filters {
        Filters {
            start: self.start,
            end: self.end,
            ..Default::default()
        }
    }
}

/// Dimension values are comma separated. A parameter present but empty (`?channel=`)
/// deselects every value; an absent one selects every value.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub trend: Option<TrendSource>,
    pub channel: Option<String>,
    pub category: Option<String>,
    pub province: Option<String>,
    pub status: Option<String>,
}

impl DashboardQuery {
    pub fn into_request(self) -> DashboardRequest {
        let mut filters = Filters {
            start: self.start,
            end: self.end,
            ..Default::default()
        };
        let lists = [
            (Dimension::Channel, self.channel),
            (Dimension::Category, self.category),
            (Dimension::Province, self.province),
            (Dimension::Status, self.status),
        ];
        for (dimension, list) in lists {
            if let Some(list) = list {
                filters = filters.with_dimension(dimension, split_list(&list));
            }
        }

        DashboardRequest {
            filters,
            trend: self.trend.unwrap_or_default(),
        }
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
