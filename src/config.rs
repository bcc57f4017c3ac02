use std::env;
use std::path::PathBuf;

use crate::metrics::MetricKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Air quality API
    pub airquality_api_url: String,
    pub upstream_timeout_seconds: u64,

    // Local documents
    pub weather_dir: PathBuf,
    pub geo_dir: PathBuf,

    // Cities
    pub primary_city: String,
    pub principal_cities: Vec<String>,

    // Metrics rounded to fixed decimals; all others are truncated to integers
    pub fixed_point_metrics: Vec<MetricKind>,

    // API settings
    pub api_host: String,
    pub api_port: u16,

    // Rate limiting
    pub disable_rate_limiting: bool,
    pub rate_limit_metadata_per_second: u64,
    pub rate_limit_metadata_burst: u32,
    pub rate_limit_data_per_second: u64,
    pub rate_limit_data_burst: u32,

    // Caching
    pub cache_ttl_seconds: u64,
    pub cache_max_bytes: u64,

    // Application metadata
    pub deployment: Deployment,
}

fn var_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Split a comma-separated list, lower-casing and dropping empty items.
#[must_use]
pub fn parse_city_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Parse a comma-separated list of metric names.
///
/// # Errors
///
/// Returns `ConfigError::UnknownMetric` for a name that is not a metric kind.
pub fn parse_metric_list(raw: &str) -> Result<Vec<MetricKind>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| {
            m.to_lowercase()
                .parse()
                .map_err(|_| ConfigError::UnknownMetric(m.to_string()))
        })
        .collect()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if required environment variables are not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let primary_city = env::var("PRIMARY_CITY")
            .map(|c| c.trim().to_lowercase())
            .unwrap_or_else(|_| "beijing".to_string());
        let principal_cities = parse_city_list(
            &env::var("PRINCIPAL_CITIES")
                .unwrap_or_else(|_| "beijing,shanghai,guangzhou".to_string()),
        );

        let config = Self {
            // Air quality API
            airquality_api_url: env::var("AIRQUALITY_API_URL")
                .map_err(|_| ConfigError::Missing("AIRQUALITY_API_URL"))?
                .trim_end_matches('/')
                .to_string(),
            upstream_timeout_seconds: var_or("UPSTREAM_TIMEOUT_SECONDS", 30),

            // Local documents
            weather_dir: PathBuf::from(
                env::var("WEATHER_DIR").unwrap_or_else(|_| "static/weather".to_string()),
            ),
            geo_dir: PathBuf::from(
                env::var("GEO_DIR").unwrap_or_else(|_| "static/geo".to_string()),
            ),

            // Cities
            primary_city,
            principal_cities,

            fixed_point_metrics: parse_metric_list(
                &env::var("FIXED_POINT_METRICS").unwrap_or_else(|_| "aqhi,aqi".to_string()),
            )?,

            // API settings
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: var_or("API_PORT", 3000),

            // Rate limiting
            disable_rate_limiting: var_or("DISABLE_RATE_LIMITING", false),
            rate_limit_metadata_per_second: var_or("RATE_LIMIT_METADATA_PER_SECOND", 1),
            rate_limit_metadata_burst: var_or("RATE_LIMIT_METADATA_BURST", 60),
            rate_limit_data_per_second: var_or("RATE_LIMIT_DATA_PER_SECOND", 10),
            rate_limit_data_burst: var_or("RATE_LIMIT_DATA_BURST", 60),

            // Caching
            cache_ttl_seconds: var_or("CACHE_TTL_SECONDS", 300), // 5 minutes
            cache_max_bytes: var_or("CACHE_MAX_BYTES", 52_428_800), // 50MB

            // Application metadata
            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.principal_cities.is_empty() {
            return Err(ConfigError::Invalid("PRINCIPAL_CITIES is empty"));
        }
        if self.upstream_timeout_seconds == 0 {
            return Err(ConfigError::Invalid("UPSTREAM_TIMEOUT_SECONDS must be positive"));
        }
        Ok(())
    }

    /// Principal cities with the primary city first and no duplicates.
    #[must_use]
    pub fn ordered_cities(&self) -> Vec<String> {
        let mut cities = vec![self.primary_city.clone()];
        for city in &self.principal_cities {
            if !cities.contains(city) {
                cities.push(city.clone());
            }
        }
        cities
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),

    #[error("Unknown metric in FIXED_POINT_METRICS: {0}")]
    UnknownMetric(String),
}
