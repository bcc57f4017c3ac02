pub mod cache;
pub mod cities;
pub mod health;
pub mod ranking;
pub mod rate_limit;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

use rate_limit::ClientIpKeyExtractor;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        cities::list_cities,
        cities::get_city_air,
        cities::get_city_weather,
        cities::get_city_map,
        cities::get_city_history,
        cities::refresh_city,
        ranking::get_ranking,
    ),
    components(
        schemas(
            cities::CitySummary,
            crate::panels::air::AirConditionCard,
            crate::panels::weather::WeatherCard,
            crate::panels::map::StationMap,
            crate::panels::history::CityHistory,
            crate::panels::ranking::Ranking,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "cities", description = "Per-city dashboard models"),
        (name = "ranking", description = "Cross-city ranking"),
    ),
    info(
        title = "AQHI Board API",
        description = "Air-quality and weather dashboard models for Chinese cities",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    if config.disable_rate_limiting {
        tracing::warn!("Rate limiting DISABLED");
    } else {
        tracing::info!(
            metadata_rate = %format!("{}/s burst {}", config.rate_limit_metadata_per_second, config.rate_limit_metadata_burst),
            data_rate = %format!("{}/s burst {}", config.rate_limit_data_per_second, config.rate_limit_data_burst),
            "Rate limiting configured"
        );
    }

    // Base routes without rate limiting
    let metadata_routes_base = Router::new()
        .route("/cities", get(cities::list_cities))
        .route("/cities/{city}/refresh", post(cities::refresh_city));

    let data_routes_base = Router::new()
        .route("/cities/{city}/air", get(cities::get_city_air))
        .route("/cities/{city}/weather", get(cities::get_city_weather))
        .route("/cities/{city}/map", get(cities::get_city_map))
        .route("/cities/{city}/history", get(cities::get_city_history))
        .route("/ranking", get(ranking::get_ranking));

    // Combine API routes, conditionally applying rate limiting
    let api_routes = if config.disable_rate_limiting {
        Router::new()
            .merge(metadata_routes_base)
            .merge(data_routes_base)
    } else {
        // Builder only fails for zero period or burst
        let metadata_limiter = GovernorConfigBuilder::default()
            .key_extractor(ClientIpKeyExtractor)
            .per_second(config.rate_limit_metadata_per_second.max(1))
            .burst_size(config.rate_limit_metadata_burst.max(1))
            .finish()
            .expect("metadata rate limiter config is non-zero");

        let data_limiter = GovernorConfigBuilder::default()
            .key_extractor(ClientIpKeyExtractor)
            .per_second(config.rate_limit_data_per_second.max(1))
            .burst_size(config.rate_limit_data_burst.max(1))
            .finish()
            .expect("data rate limiter config is non-zero");

        Router::new()
            .merge(metadata_routes_base.layer(GovernorLayer {
                config: Arc::new(metadata_limiter),
            }))
            .merge(data_routes_base.layer(GovernorLayer {
                config: Arc::new(data_limiter),
            }))
    }
    .layer(RequestBodyLimitLayer::new(64 * 1024));

    // Health check routes (NO rate limiting)
    let health_routes = Router::new().route("/healthz", get(health::healthz));

    // OpenAPI documentation
    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
