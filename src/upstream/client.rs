use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::upstream::models::{City, CityRecord, Page, StationRecord};

/// Stop following `next` links after this many pages.
const MAX_PAGES: usize = 20;

pub struct AirQualityClient {
    http_client: Client,
    base_url: String,
}

impl AirQualityClient {
    /// Build a client for the API rooted at `config.airquality_api_url`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.airquality_api_url.clone(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> AppResult<T> {
        let response = self
            .http_client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::Upstream("Rate limited (429)".to_string()));
        }

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to get response text: {e}")))?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                url = %url,
                body_preview = %text.chars().take(500).collect::<String>(),
                "Failed to parse air quality response"
            );
            AppError::Upstream(format!("Failed to parse response: {e}"))
        })
    }

    /// Fetch a paged list, following `next` links up to `MAX_PAGES`.
    async fn get_all<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> AppResult<Vec<T>> {
        let first_url = format!("{}/{path}", self.base_url);
        let mut page: Page<T> = self.get_json(&first_url, query).await?;
        let mut items = std::mem::take(&mut page.results);
        let mut pages = 1;

        while let Some(next) = page.next.take() {
            if pages >= MAX_PAGES {
                tracing::warn!(path = %path, pages, total = page.count, "Stopped following pagination");
                break;
            }
            // `next` already carries the query string
            page = self.get_json(&next, &[]).await?;
            items.append(&mut page.results);
            pages += 1;
        }

        Ok(items)
    }

    /// Most recent city record for `city` (English name).
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the API has no record for the city,
    /// `AppError::Upstream` if the request fails.
    pub async fn latest_city_record(&self, city: &str) -> AppResult<CityRecord> {
        let url = format!("{}/airquality/city_record/", self.base_url);
        let page: Page<CityRecord> = self
            .get_json(
                &url,
                &[
                    ("city", city.to_string()),
                    ("latest", "True".to_string()),
                    ("ordering", "-update_dtm".to_string()),
                ],
            )
            .await?;

        page.results
            .into_iter()
            .max_by_key(|r| r.update_dtm)
            .ok_or_else(|| AppError::NotFound(format!("No air quality record for '{city}'")))
    }

    /// City records with `start <= update_dtm <= end`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Upstream` if any page request fails.
    pub async fn city_records_between(
        &self,
        city: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<CityRecord>> {
        let mut records: Vec<CityRecord> = self
            .get_all(
                "airquality/city_record/",
                &[
                    ("city", city.to_string()),
                    ("start_dtm", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
                    ("end_dtm", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
                    ("ordering", "update_dtm".to_string()),
                ],
            )
            .await?;
        records.sort_by_key(|r| r.update_dtm);
        Ok(records)
    }

    /// Station records of the latest city record for `city`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Upstream` if the request fails.
    pub async fn latest_station_records(&self, city: &str) -> AppResult<Vec<StationRecord>> {
        let records: Vec<StationRecord> = self
            .get_all(
                "airquality/station_record/",
                &[
                    ("city", city.to_string()),
                    ("latest", "True".to_string()),
                    ("ordering", "-update_dtm".to_string()),
                ],
            )
            .await?;

        // Keep only the newest batch in case the API ignores `latest`
        let newest = records.iter().map(|r| r.update_dtm).max();
        Ok(records
            .into_iter()
            .filter(|r| Some(r.update_dtm) == newest)
            .collect())
    }

    /// All cities, or only the principal ones.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Upstream` if the request fails.
    pub async fn cities(&self, principal: bool) -> AppResult<Vec<City>> {
        let mut query = vec![("ordering", "name_cn".to_string())];
        if principal {
            query.push(("principal", "True".to_string()));
        }
        self.get_all("airquality/city/", &query).await
    }
}
