//! Response caching for dashboard endpoints.
//!
//! Every model endpoint serializes its response once and stores the bytes in
//! the shared moka cache, keyed by route and parameters. Entries expire via
//! TTL only; time-dependent keys (such as the history window) include the
//! hour they were computed for, so a new hour produces a new key.
//!
//! ```text
//! let key = cache::cache_key("air", &[&city]);
//! if let Some(cached) = cache::get_cached(&state, &key).await {
//!     return cache::json_response((*cached).clone(), true);
//! }
//! // ... build model ...
//! cache::cache_and_respond(&state, key, &model).await
//! ```

use axum::{
    http::{header, HeaderValue},
    response::Response,
};
use serde::Serialize;
use std::sync::Arc;

use crate::common::{AppState, CachedResponse};
use crate::error::{AppError, AppResult};

/// Build a cache key from a prefix and components.
///
/// Components are joined with `:` separator. Empty components are included
/// to ensure different queries produce different keys.
#[must_use]
pub fn cache_key(prefix: &str, components: &[&str]) -> String {
    let mut key = prefix.to_string();
    for c in components {
        key.push(':');
        key.push_str(c);
    }
    key
}

pub async fn get_cached(state: &AppState, cache_key: &str) -> Option<Arc<Vec<u8>>> {
    let cached = state.response_cache.get(cache_key).await?;
    tracing::debug!(cache_key = %cache_key, "cache_hit");
    Some(cached.data)
}

pub async fn store_cached(state: &AppState, cache_key: String, data: Vec<u8>) {
    let size = data.len();
    state
        .response_cache
        .insert(
            cache_key.clone(),
            CachedResponse {
                data: Arc::new(data),
            },
        )
        .await;

    tracing::debug!(cache_key = %cache_key, size_bytes = size, "cache_stored");
}

/// JSON response with an `X-Cache: HIT|MISS` header.
///
/// # Errors
///
/// Returns `AppError::Internal` if the response cannot be assembled.
pub fn json_response(data: Vec<u8>, cache_hit: bool) -> AppResult<Response> {
    let cache_header = if cache_hit { "HIT" } else { "MISS" };
    Response::builder()
        .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .header("X-Cache", HeaderValue::from_static(cache_header))
        .body(axum::body::Body::from(data))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Serialize a response, store in cache, and return it with `X-Cache: MISS`.
///
/// # Errors
///
/// Returns `AppError::Internal` if serialization fails.
pub async fn cache_and_respond<T: Serialize>(
    state: &AppState,
    cache_key: String,
    response: &T,
) -> AppResult<Response> {
    let json_bytes =
        serde_json::to_vec(response).map_err(|e| AppError::Internal(e.to_string()))?;

    store_cached(state, cache_key, json_bytes.clone()).await;

    json_response(json_bytes, false)
}

/// Drop every entry whose key starts with `prefix`, e.g. all models of a city.
pub fn invalidate_prefix(state: &AppState, prefix: &str) {
    let prefix_owned = prefix.to_string();
    if let Err(e) = state
        .response_cache
        .invalidate_entries_if(move |key, _| key.starts_with(&prefix_owned))
    {
        tracing::warn!(prefix = %prefix, error = %e, "cache_prefix_invalidation_failed");
        return;
    }
    tracing::debug!(prefix = %prefix, "cache_prefix_invalidated");
}
