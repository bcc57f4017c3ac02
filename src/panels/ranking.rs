//! Cross-city ranking of one metric, best (lowest) first.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::cmp::Ordering;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::metrics::{format_value, non_nan, MetricKind};
use crate::panels::Tables;
use crate::upstream::models::CityRecord;
use crate::upstream::AirQualityClient;

/// Concurrent upstream requests while collecting latest records.
const FETCH_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Ranking {
    pub metric: MetricKind,
    pub label: String,
    pub entries: Vec<RankingEntry>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RankingEntry {
    /// 1-based rank; null for cities without a value
    pub rank: Option<usize>,
    pub city_en: String,
    pub city_cn: String,
    pub value: Option<f64>,
    pub text: String,
    pub updated_at: DateTime<Utc>,
}

/// Rank cities by `metric`, ascending. Missing values sort last, ties by
/// Chinese name.
#[must_use]
pub fn build_ranking(metric: MetricKind, records: &[CityRecord], tables: &Tables) -> Ranking {
    let mut rows: Vec<(f64, &CityRecord)> = records
        .iter()
        .map(|r| (tables.plotted_value(&r.fields, metric), r))
        .collect();

    rows.sort_by(|(a, ra), (b, rb)| {
        let by_value = match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.total_cmp(b),
        };
        by_value.then_with(|| ra.city.name_cn.cmp(&rb.city.name_cn))
    });

    let entries = rows
        .into_iter()
        .enumerate()
        .map(|(i, (value, r))| RankingEntry {
            rank: (!value.is_nan()).then_some(i + 1),
            city_en: r.city.name_en.clone(),
            city_cn: r.city.name_cn.clone(),
            value: non_nan(value),
            text: format_value(value),
            updated_at: r.update_dtm,
        })
        .collect();

    Ranking {
        metric,
        label: metric.label().to_string(),
        entries,
    }
}

/// Latest record of each city. Cities the API has no record for are
/// skipped; any other failure aborts.
///
/// # Errors
///
/// Returns the first non-`NotFound` upstream error.
pub async fn fetch_latest_records(
    client: &AirQualityClient,
    cities: &[String],
) -> AppResult<Vec<CityRecord>> {
    let results: Vec<AppResult<CityRecord>> = stream::iter(cities.to_vec())
        .map(|city| async move { client.latest_city_record(&city).await })
        .buffered(FETCH_CONCURRENCY)
        .collect()
        .await;

    let mut records = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(record) => records.push(record),
            Err(AppError::NotFound(msg)) => tracing::debug!(reason = %msg, "Skipping city in ranking"),
            Err(e) => return Err(e),
        }
    }
    Ok(records)
}
