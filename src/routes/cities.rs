use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use utoipa::{IntoParams, ToSchema};

use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::metrics::MetricKind;
use crate::panels::{air, history, map, weather};
use crate::routes::cache;
use crate::series::{hour_floor, window_start, DEFAULT_HOURS, MAX_HOURS};
use crate::upstream::documents::validate_city_name;

fn city_key(city: &str, model: &str, extra: &[&str]) -> String {
    let mut components = vec![city, model];
    components.extend_from_slice(extra);
    cache::cache_key("city", &components)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CitySummary {
    pub name_en: String,
    pub name_cn: String,
    pub primary: bool,
}

/// List the dashboard's cities, primary city first
#[utoipa::path(
    get,
    path = "/api/cities",
    responses(
        (status = 200, description = "Cities retrieved successfully", body = Vec<CitySummary>),
        (status = 502, description = "Air quality API unavailable"),
    ),
    tag = "cities"
)]
pub async fn list_cities(State(state): State<AppState>) -> AppResult<Json<Vec<CitySummary>>> {
    let known: HashMap<String, String> = state
        .client
        .cities(false)
        .await?
        .into_iter()
        .map(|c| (c.name_en.to_lowercase(), c.name_cn))
        .collect();

    let response = state
        .config
        .ordered_cities()
        .into_iter()
        .filter_map(|name_en| match known.get(&name_en) {
            Some(name_cn) => Some(CitySummary {
                primary: name_en == state.config.primary_city,
                name_cn: name_cn.clone(),
                name_en,
            }),
            None => {
                tracing::warn!(city = %name_en, "Configured city unknown to air quality API");
                None
            }
        })
        .collect();

    Ok(Json(response))
}

/// Air-condition card of a city's latest record
#[utoipa::path(
    get,
    path = "/api/cities/{city}/air",
    params(
        ("city" = String, Path, description = "City English name, e.g. beijing"),
    ),
    responses(
        (status = 200, description = "Card built successfully", body = air::AirConditionCard),
        (status = 404, description = "No record for the city"),
        (status = 502, description = "Air quality API unavailable"),
    ),
    tag = "cities"
)]
pub async fn get_city_air(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> AppResult<Response> {
    let city = validate_city_name(&city)?;
    let key = city_key(&city, "air", &[]);
    if let Some(cached) = cache::get_cached(&state, &key).await {
        return cache::json_response((*cached).clone(), true);
    }

    let record = state.client.latest_city_record(&city).await?;
    let card = air::build_air_card(&record, &state.tables, Utc::now());

    cache::cache_and_respond(&state, key, &card).await
}

/// Weather card of a city
#[utoipa::path(
    get,
    path = "/api/cities/{city}/weather",
    params(
        ("city" = String, Path, description = "City English name"),
    ),
    responses(
        (status = 200, description = "Card built successfully", body = weather::WeatherCard),
        (status = 404, description = "No weather document for the city"),
    ),
    tag = "cities"
)]
pub async fn get_city_weather(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> AppResult<Json<weather::WeatherCard>> {
    let city = validate_city_name(&city)?;
    let report = state.documents.weather(&city).await?;
    Ok(Json(weather::build_weather_card(&city, &report, Utc::now())?))
}

/// Station scatter map of a city
#[utoipa::path(
    get,
    path = "/api/cities/{city}/map",
    params(
        ("city" = String, Path, description = "City English name"),
    ),
    responses(
        (status = 200, description = "Map built successfully", body = map::StationMap),
        (status = 404, description = "No geography document for the city"),
        (status = 503, description = "Sources did not complete in time"),
    ),
    tag = "cities"
)]
pub async fn get_city_map(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> AppResult<Response> {
    let city = validate_city_name(&city)?;
    let key = city_key(&city, "map", &[]);
    if let Some(cached) = cache::get_cached(&state, &key).await {
        return cache::json_response((*cached).clone(), true);
    }

    let station_map = map::load_station_map(
        state.client.clone(),
        state.documents.clone(),
        city,
        &state.tables,
        Duration::from_secs(state.config.upstream_timeout_seconds),
    )
    .await?;

    cache::cache_and_respond(&state, key, &station_map).await
}

fn default_metric() -> String {
    "aqi".to_string()
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Metric name (aqi, aqhi, co, no2, o3, o3_8h, pm10, pm2_5, so2). Default: aqi
    #[serde(default = "default_metric")]
    pub metric: String,
    /// Window length in hours, 1 to 168. Default: 24
    pub hours: Option<u32>,
}

/// Parse and bound the history window.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an unknown metric or out-of-range hours.
pub fn parse_history_query(query: &HistoryQuery) -> AppResult<(MetricKind, u32)> {
    let metric: MetricKind = query.metric.trim().to_lowercase().parse()?;
    let hours = query.hours.unwrap_or(DEFAULT_HOURS);
    if hours == 0 || hours > MAX_HOURS {
        return Err(AppError::BadRequest(format!(
            "hours must be between 1 and {MAX_HOURS}, got {hours}"
        )));
    }
    Ok((metric, hours))
}

/// Hourly history of one metric for a city, gap-filled
#[utoipa::path(
    get,
    path = "/api/cities/{city}/history",
    params(
        ("city" = String, Path, description = "City English name"),
        HistoryQuery,
    ),
    responses(
        (status = 200, description = "History built successfully", body = history::CityHistory),
        (status = 400, description = "Invalid metric or window"),
        (status = 502, description = "Air quality API unavailable"),
    ),
    tag = "cities"
)]
pub async fn get_city_history(
    State(state): State<AppState>,
    Path(city): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Response> {
    let city = validate_city_name(&city)?;
    let (metric, hours) = parse_history_query(&query)?;

    let now = Utc::now();
    let end_hour = hour_floor(now).to_rfc3339();
    let hours_str = hours.to_string();
    let key = city_key(&city, "history", &[metric.name(), &hours_str, &end_hour]);
    if let Some(cached) = cache::get_cached(&state, &key).await {
        return cache::json_response((*cached).clone(), true);
    }

    let records = state
        .client
        .city_records_between(&city, window_start(now, hours), now)
        .await?;
    tracing::debug!(city = %city, metric = %metric, hours, records = records.len(), "Building history");

    let response = history::build_history(&city, metric, &records, now, hours, &state.tables);
    cache::cache_and_respond(&state, key, &response).await
}

/// Drop every cached model of a city
#[utoipa::path(
    post,
    path = "/api/cities/{city}/refresh",
    params(
        ("city" = String, Path, description = "City English name"),
    ),
    responses(
        (status = 204, description = "Cache entries dropped"),
    ),
    tag = "cities"
)]
pub async fn refresh_city(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> AppResult<StatusCode> {
    let city = validate_city_name(&city)?;
    cache::invalidate_prefix(&state, &cache::cache_key("city", &[&city, ""]));
    Ok(StatusCode::NO_CONTENT)
}
