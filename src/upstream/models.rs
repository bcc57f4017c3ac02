use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::metrics::MetricKind;

/// Paged list wrapper returned by the air-quality API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub name_en: String,
    pub name_cn: String,
    /// Decimal degrees as a string, null when unknown
    #[serde(default)]
    pub longitude: Option<String>,
    #[serde(default)]
    pub latitude: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: i64,
    pub name_cn: String,
    #[serde(default)]
    pub longitude: Option<String>,
    #[serde(default)]
    pub latitude: Option<String>,
}

impl Station {
    /// `(longitude, latitude)` when both parse.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lon = self.longitude.as_deref()?.trim().parse().ok()?;
        let lat = self.latitude.as_deref()?.trim().parse().ok()?;
        Some((lon, lat))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryPollutant {
    pub pollutant: String,
}

/// Measurement fields shared by city and station records. Values are
/// decimal strings with four places, or null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricFields {
    #[serde(default)]
    pub aqi: Option<String>,
    #[serde(default)]
    pub aqhi: Option<String>,
    #[serde(default)]
    pub co: Option<String>,
    #[serde(default)]
    pub no2: Option<String>,
    #[serde(default)]
    pub o3: Option<String>,
    #[serde(default)]
    pub o3_8h: Option<String>,
    #[serde(default)]
    pub pm10: Option<String>,
    #[serde(default)]
    pub pm2_5: Option<String>,
    #[serde(default)]
    pub so2: Option<String>,
    /// Quality grade code (`E`, `G`, `LP`, ...); blank when not graded
    #[serde(default)]
    pub quality: String,
}

impl MetricFields {
    #[must_use]
    pub fn raw(&self, kind: MetricKind) -> Option<&str> {
        let field = match kind {
            MetricKind::Aqi => &self.aqi,
            MetricKind::Aqhi => &self.aqhi,
            MetricKind::Co => &self.co,
            MetricKind::No2 => &self.no2,
            MetricKind::O3 => &self.o3,
            MetricKind::O3Hour8 => &self.o3_8h,
            MetricKind::Pm10 => &self.pm10,
            MetricKind::Pm25 => &self.pm2_5,
            MetricKind::So2 => &self.so2,
        };
        field.as_deref()
    }
}

/// Response item from `/airquality/city_record/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityRecord {
    pub id: i64,
    pub update_dtm: DateTime<Utc>,
    pub city: City,
    #[serde(default)]
    pub primary_pollutants: Vec<PrimaryPollutant>,
    #[serde(flatten)]
    pub fields: MetricFields,
}

/// Response item from `/airquality/station_record/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationRecord {
    pub id: i64,
    pub station: Station,
    pub update_dtm: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: MetricFields,
}

// -------------------------------------------------------------------
// Weather document (HeWeather data service 3.0)
// -------------------------------------------------------------------

pub const WEATHER_DOCUMENT_KEY: &str = "HeWeather data service 3.0";

/// Accept `"25"` as well as `25` for numeric-looking weather fields.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

/// `YYYY-MM-DD HH:MM` as written by the weather service.
fn weather_datetime<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M").map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherEnvelope {
    #[serde(rename = "HeWeather data service 3.0")]
    pub reports: Vec<WeatherReport>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherReport {
    pub basic: WeatherBasic,
    pub now: WeatherNow,
    #[serde(default)]
    pub daily_forecast: Vec<DailyForecast>,
    #[serde(default)]
    pub hourly_forecast: Vec<HourlyForecast>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherBasic {
    pub update: UpdateTimes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTimes {
    #[serde(deserialize_with = "weather_datetime")]
    pub loc: NaiveDateTime,
    #[serde(deserialize_with = "weather_datetime")]
    pub utc: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherNow {
    #[serde(deserialize_with = "string_or_number")]
    pub tmp: String,
    pub cond: NowCondition,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NowCondition {
    #[serde(deserialize_with = "string_or_number")]
    pub code: String,
    pub txt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub astro: Astro,
    pub cond: DailyCondition,
    pub tmp: TempRange,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Astro {
    /// Sunrise, `HH:MM` local time
    pub sr: String,
    /// Sunset, `HH:MM` local time
    pub ss: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyCondition {
    #[serde(deserialize_with = "string_or_number")]
    pub code_d: String,
    #[serde(deserialize_with = "string_or_number")]
    pub code_n: String,
    pub txt_d: String,
    pub txt_n: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TempRange {
    #[serde(deserialize_with = "string_or_number")]
    pub max: String,
    #[serde(deserialize_with = "string_or_number")]
    pub min: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HourlyForecast {
    #[serde(deserialize_with = "weather_datetime")]
    pub date: NaiveDateTime,
    #[serde(deserialize_with = "string_or_number")]
    pub tmp: String,
}
