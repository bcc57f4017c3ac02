//! Station scatter map: per-metric station values over the city's geography.
//!
//! The geography document and the latest station records come from two
//! independent sources. Both are fetched concurrently and joined through a
//! [`JoinBarrier`] before the model is built.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use utoipa::ToSchema;

use crate::barrier::JoinBarrier;
use crate::error::{AppError, AppResult};
use crate::metrics::{non_nan, MetricKind};
use crate::panels::Tables;
use crate::upstream::models::StationRecord;
use crate::upstream::{AirQualityClient, DocumentStore};

/// Metrics drawn on the map, one series each.
pub const MAP_METRICS: [MetricKind; 8] = [
    MetricKind::Aqi,
    MetricKind::Co,
    MetricKind::No2,
    MetricKind::O3,
    MetricKind::O3Hour8,
    MetricKind::Pm10,
    MetricKind::Pm25,
    MetricKind::So2,
];

pub const MIN_SYMBOL_SIZE: f64 = 20.0;
pub const MAX_SYMBOL_SIZE: f64 = 100.0;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StationMap {
    pub city_en: String,
    /// GeoJSON shape of the city
    #[schema(value_type = Object)]
    pub geo: serde_json::Value,
    pub updated_at: Option<DateTime<Utc>>,
    pub series: Vec<MapSeries>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MapSeries {
    pub metric: MetricKind,
    pub label: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub points: Vec<MapPoint>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MapPoint {
    pub station: String,
    pub longitude: f64,
    pub latitude: f64,
    pub value: Option<f64>,
    pub symbol_size: f64,
}

/// Linear scale of `value` from `[min, max]` onto the symbol size range.
/// Degenerate ranges and missing values get the minimum size.
#[must_use]
pub fn symbol_size(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() || !(max > min) {
        return MIN_SYMBOL_SIZE;
    }
    let ratio = (max - min) / (MAX_SYMBOL_SIZE - MIN_SYMBOL_SIZE);
    (value - min) / ratio + MIN_SYMBOL_SIZE
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Build the map model. Stations without coordinates are left out.
#[must_use]
pub fn build_station_map(
    city_en: &str,
    geo: serde_json::Value,
    records: &[StationRecord],
    tables: &Tables,
) -> StationMap {
    let located: Vec<(&StationRecord, (f64, f64))> = records
        .iter()
        .filter_map(|r| match r.station.coordinates() {
            Some(c) => Some((r, c)),
            None => {
                tracing::debug!(station = %r.station.name_cn, "Station has no coordinates");
                None
            }
        })
        .collect();

    let series = MAP_METRICS
        .into_iter()
        .map(|kind| {
            let values: Vec<f64> = located
                .iter()
                .map(|(r, _)| tables.plotted_value(&r.fields, kind))
                .collect();
            let range = min_max(&values);
            let (lo, hi) = range.unwrap_or((f64::NAN, f64::NAN));

            let points = located
                .iter()
                .zip(&values)
                .map(|((r, (lon, lat)), &v)| MapPoint {
                    station: r.station.name_cn.clone(),
                    longitude: *lon,
                    latitude: *lat,
                    value: non_nan(v),
                    symbol_size: symbol_size(v, lo, hi),
                })
                .collect();

            MapSeries {
                metric: kind,
                label: kind.label().to_string(),
                min: range.map(|r| r.0),
                max: range.map(|r| r.1),
                points,
            }
        })
        .collect();

    StationMap {
        city_en: city_en.to_string(),
        geo,
        updated_at: records.iter().map(|r| r.update_dtm).max(),
        series,
    }
}

type Slot<T> = Arc<Mutex<Option<AppResult<T>>>>;

fn take_slot<T>(slot: &Slot<T>, what: &str) -> AppResult<T> {
    slot.lock()
        .map_err(|_| AppError::Internal(format!("{what} slot poisoned")))?
        .take()
        .ok_or_else(|| AppError::Internal(format!("{what} never completed")))?
}

/// Fetch geography and station records concurrently, join them, and build
/// the map. A source that fails still signals the barrier so the error is
/// reported instead of waiting out the timeout.
///
/// # Errors
///
/// Propagates either source's error; `ServiceUnavailable` if both sources
/// have not completed within `timeout`.
pub async fn load_station_map(
    client: Arc<AirQualityClient>,
    documents: DocumentStore,
    city_en: String,
    tables: &Tables,
    timeout: Duration,
) -> AppResult<StationMap> {
    let barrier = Arc::new(JoinBarrier::new(2));
    let geo_slot: Slot<serde_json::Value> = Arc::new(Mutex::new(None));
    let records_slot: Slot<Vec<StationRecord>> = Arc::new(Mutex::new(None));

    {
        let city = city_en.clone();
        barrier.on_complete(move || tracing::debug!(city = %city, "Map sources joined"));
    }

    let geo_task = {
        let barrier = barrier.clone();
        let slot = geo_slot.clone();
        let city = city_en.clone();
        tokio::spawn(async move {
            let result = documents.geo(&city).await;
            if let Ok(mut guard) = slot.lock() {
                *guard = Some(result);
            }
            barrier.signal();
        })
    };

    let records_task = {
        let barrier = barrier.clone();
        let slot = records_slot.clone();
        let city = city_en.clone();
        tokio::spawn(async move {
            let result = client.latest_station_records(&city).await;
            if let Ok(mut guard) = slot.lock() {
                *guard = Some(result);
            }
            barrier.signal();
        })
    };

    if let Err(e) = barrier.wait_timeout(timeout).await {
        geo_task.abort();
        records_task.abort();
        tracing::warn!(city = %city_en, error = %e, "Map sources did not complete");
        return Err(e.into());
    }

    let geo = take_slot(&geo_slot, "geography")?;
    let records = take_slot(&records_slot, "station records")?;
    tracing::debug!(city = %city_en, stations = records.len(), "Building station map");

    Ok(build_station_map(&city_en, geo, &records, tables))
}
