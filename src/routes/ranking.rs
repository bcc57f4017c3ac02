use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::metrics::MetricKind;
use crate::panels::ranking;
use crate::routes::cache;

fn default_metric() -> String {
    "aqi".to_string()
}

fn default_scope() -> String {
    "all".to_string()
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RankingQuery {
    /// Metric to rank by. Default: aqi
    #[serde(default = "default_metric")]
    pub metric: String,
    /// `all` cities known to the API, or only the `principal` ones. Default: all
    #[serde(default = "default_scope")]
    pub scope: String,
}

/// Rank cities by their latest value of one metric, lowest first
#[utoipa::path(
    get,
    path = "/api/ranking",
    params(RankingQuery),
    responses(
        (status = 200, description = "Ranking built successfully", body = ranking::Ranking),
        (status = 400, description = "Invalid metric or scope"),
        (status = 502, description = "Air quality API unavailable"),
    ),
    tag = "ranking"
)]
pub async fn get_ranking(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> AppResult<Response> {
    let metric: MetricKind = query.metric.trim().to_lowercase().parse()?;
    let scope = query.scope.trim().to_lowercase();

    let key = cache::cache_key("ranking", &[metric.name(), &scope]);
    if let Some(cached) = cache::get_cached(&state, &key).await {
        return cache::json_response((*cached).clone(), true);
    }

    let cities: Vec<String> = match scope.as_str() {
        "principal" => state.config.ordered_cities(),
        "all" => state
            .client
            .cities(false)
            .await?
            .into_iter()
            .map(|c| c.name_en.to_lowercase())
            .collect(),
        other => {
            return Err(AppError::BadRequest(format!(
                "scope must be 'all' or 'principal', got '{other}'"
            )));
        }
    };

    let records = ranking::fetch_latest_records(&state.client, &cities).await?;
    tracing::debug!(metric = %metric, cities = cities.len(), records = records.len(), "Building ranking");

    let response = ranking::build_ranking(metric, &records, &state.tables);
    cache::cache_and_respond(&state, key, &response).await
}
