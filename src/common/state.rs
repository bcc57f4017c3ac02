use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::levels::BreakpointTable;
use crate::metrics::MetricRules;
use crate::panels::Tables;
use crate::upstream::{AirQualityClient, DocumentStore};

/// Serialized response body kept in the response cache
#[derive(Clone)]
pub struct CachedResponse {
    pub data: Arc<Vec<u8>>,
}

/// Cache for dashboard responses. Key is route + params, value is the
/// serialized JSON. Weighted by byte size to enforce memory limit.
pub type ResponseCache = Cache<String, CachedResponse>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: Arc<AirQualityClient>,
    pub documents: DocumentStore,
    pub tables: Arc<Tables>,
    pub response_cache: ResponseCache,
}

impl AppState {
    pub fn new(config: Config, client: AirQualityClient) -> Self {
        // Cache weighted by byte size, not entry count
        let cache: ResponseCache = Cache::builder()
            .weigher(|_key: &String, value: &CachedResponse| -> u32 {
                value.data.len().try_into().unwrap_or(u32::MAX)
            })
            .max_capacity(config.cache_max_bytes)
            .time_to_live(Duration::from_secs(config.cache_ttl_seconds))
            .support_invalidation_closures()
            .build();

        let tables = Tables {
            rules: MetricRules::with_fixed_point(config.fixed_point_metrics.clone()),
            aqhi: BreakpointTable::aqhi(),
        };

        Self {
            documents: DocumentStore::from_config(&config),
            config: Arc::new(config),
            client: Arc::new(client),
            tables: Arc::new(tables),
            response_cache: cache,
        }
    }
}
