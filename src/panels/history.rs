use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::metrics::MetricKind;
use crate::panels::Tables;
use crate::series::{hourly_series, HourlySeries};
use crate::upstream::models::CityRecord;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CityHistory {
    pub city_en: String,
    pub metric: MetricKind,
    pub label: String,
    pub hours: u32,
    /// Number of hours backed by a record
    pub filled: usize,
    #[serde(flatten)]
    pub series: HourlySeries,
}

/// Gap-filled hourly history of one metric, ending at the hour of `end`.
#[must_use]
pub fn build_history(
    city_en: &str,
    metric: MetricKind,
    records: &[CityRecord],
    end: DateTime<Utc>,
    hours: u32,
    tables: &Tables,
) -> CityHistory {
    let points = records
        .iter()
        .map(|r| (r.update_dtm, tables.plotted_value(&r.fields, metric)));
    let series = hourly_series(end, hours, points);

    CityHistory {
        city_en: city_en.to_string(),
        metric,
        label: metric.label().to_string(),
        hours,
        filled: series.filled(),
        series,
    }
}
