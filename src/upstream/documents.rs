//! Static per-city documents served from disk: weather reports and the
//! geography (GeoJSON) used by the station map.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::upstream::models::{WeatherEnvelope, WeatherReport, WEATHER_DOCUMENT_KEY};

/// City names are used as file stems, so only allow plain identifiers.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for empty names or names containing
/// anything other than ASCII letters, digits, `_` or `-`.
pub fn validate_city_name(city: &str) -> AppResult<String> {
    let city = city.trim().to_lowercase();
    let valid = !city.is_empty()
        && city.len() <= 30
        && city
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(city)
    } else {
        Err(AppError::BadRequest(format!("Invalid city name '{city}'")))
    }
}

#[derive(Debug, Clone)]
pub struct DocumentStore {
    weather_dir: PathBuf,
    geo_dir: PathBuf,
}

impl DocumentStore {
    #[must_use]
    pub fn new(weather_dir: impl Into<PathBuf>, geo_dir: impl Into<PathBuf>) -> Self {
        Self {
            weather_dir: weather_dir.into(),
            geo_dir: geo_dir.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.weather_dir, &config.geo_dir)
    }

    async fn read(dir: &Path, city: &str, kind: &str) -> AppResult<String> {
        let city = validate_city_name(city)?;
        let path = dir.join(format!("{city}.json"));
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound(
                format!("No {kind} document for '{city}'"),
            )),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to read document");
                Err(AppError::Internal(format!("Failed to read {kind} document: {e}")))
            }
        }
    }

    /// Latest weather report for `city`.
    ///
    /// # Errors
    ///
    /// `NotFound` when no document exists, `Upstream` when it does not parse
    /// or holds no report.
    pub async fn weather(&self, city: &str) -> AppResult<WeatherReport> {
        let text = Self::read(&self.weather_dir, city, "weather").await?;
        let envelope: WeatherEnvelope = serde_json::from_str(&text)
            .map_err(|e| AppError::Upstream(format!("Malformed weather document: {e}")))?;
        envelope.reports.into_iter().next().ok_or_else(|| {
            AppError::Upstream(format!("Weather document has no '{WEATHER_DOCUMENT_KEY}' report"))
        })
    }

    /// GeoJSON shape of `city`, passed through untouched.
    ///
    /// # Errors
    ///
    /// `NotFound` when no document exists, `Upstream` when it is not JSON.
    pub async fn geo(&self, city: &str) -> AppResult<serde_json::Value> {
        let text = Self::read(&self.geo_dir, city, "geography").await?;
        serde_json::from_str(&text)
            .map_err(|e| AppError::Upstream(format!("Malformed geography document: {e}")))
    }
}
