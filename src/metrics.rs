//! Metric kinds and normalization of the raw decimal strings the
//! air-quality API returns.
//!
//! Two parsing rules exist:
//!
//! - **fixed-point**: parse as float, round half away from zero to a number of
//!   decimal places, drop trailing zeros (`"0.2134"` -> `0.21`)
//! - **integer**: parse the leading integer and drop any fraction
//!   (`"3.456"` -> `3`)
//!
//! Malformed input never fails; it yields `NaN`, which display code renders
//! as [`PLACEHOLDER`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Shown in place of a missing or unparseable value.
pub const PLACEHOLDER: &str = "——";

pub const DEFAULT_DECIMAL_PLACES: u32 = 2;

const MAX_DECIMAL_PLACES: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum MetricKind {
    #[serde(rename = "aqi")]
    Aqi,
    #[serde(rename = "aqhi")]
    Aqhi,
    #[serde(rename = "co")]
    Co,
    #[serde(rename = "no2")]
    No2,
    #[serde(rename = "o3")]
    O3,
    #[serde(rename = "o3_8h")]
    O3Hour8,
    #[serde(rename = "pm10")]
    Pm10,
    #[serde(rename = "pm2_5")]
    Pm25,
    #[serde(rename = "so2")]
    So2,
}

impl MetricKind {
    pub const ALL: [Self; 9] = [
        Self::Aqi,
        Self::Aqhi,
        Self::Co,
        Self::No2,
        Self::O3,
        Self::O3Hour8,
        Self::Pm10,
        Self::Pm25,
        Self::So2,
    ];

    /// The seven pollutants that can be reported as primary.
    pub const POLLUTANTS: [Self; 7] = [
        Self::Co,
        Self::So2,
        Self::O3,
        Self::O3Hour8,
        Self::Pm10,
        Self::Pm25,
        Self::No2,
    ];

    /// Field name used by the upstream API.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Aqi => "aqi",
            Self::Aqhi => "aqhi",
            Self::Co => "co",
            Self::No2 => "no2",
            Self::O3 => "o3",
            Self::O3Hour8 => "o3_8h",
            Self::Pm10 => "pm10",
            Self::Pm25 => "pm2_5",
            Self::So2 => "so2",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Aqi => "AQI",
            Self::Aqhi => "AQHI",
            Self::Co => "CO",
            Self::No2 => "NO2",
            Self::O3 => "O3",
            Self::O3Hour8 => "O3/8h",
            Self::Pm10 => "PM10",
            Self::Pm25 => "PM2.5",
            Self::So2 => "SO2",
        }
    }

    #[must_use]
    pub fn css_class(self) -> String {
        format!("pol-{}", self.name())
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("Unknown metric: {0}")]
pub struct UnknownMetric(pub String);

impl FromStr for MetricKind {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseRule {
    FixedPoint,
    Integer,
}

/// Which metric kinds round to fixed decimals. Built once, then shared.
#[derive(Debug, Clone)]
pub struct MetricRules {
    fixed_point: Vec<MetricKind>,
}

impl Default for MetricRules {
    fn default() -> Self {
        Self {
            fixed_point: vec![MetricKind::Aqhi, MetricKind::Aqi],
        }
    }
}

impl MetricRules {
    #[must_use]
    pub fn with_fixed_point(fixed_point: Vec<MetricKind>) -> Self {
        Self { fixed_point }
    }

    #[must_use]
    pub fn rule(&self, kind: MetricKind) -> ParseRule {
        if self.fixed_point.contains(&kind) {
            ParseRule::FixedPoint
        } else {
            ParseRule::Integer
        }
    }

    /// Normalize a raw value for `kind`. `decimal_places` only applies to
    /// fixed-point kinds and defaults to two.
    #[must_use]
    pub fn normalize(&self, kind: MetricKind, raw: &str, decimal_places: Option<u32>) -> f64 {
        match self.rule(kind) {
            ParseRule::FixedPoint => {
                round_fixed(parse_float_prefix(raw), decimal_places.unwrap_or(DEFAULT_DECIMAL_PLACES))
            }
            ParseRule::Integer => parse_int_prefix(raw),
        }
    }

    /// Same as [`normalize`](Self::normalize) for a nullable upstream field.
    #[must_use]
    pub fn normalize_opt(&self, kind: MetricKind, raw: Option<&str>) -> f64 {
        raw.map_or(f64::NAN, |r| self.normalize(kind, r, None))
    }
}

/// Normalize with the default rule set.
#[must_use]
pub fn normalize(kind: MetricKind, raw: &str, decimal_places: Option<u32>) -> f64 {
    MetricRules::default().normalize(kind, raw, decimal_places)
}

/// Round half away from zero, then re-parse the fixed string so the result is
/// the float nearest to the decimal text.
fn round_fixed(value: f64, decimal_places: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let places = decimal_places.min(MAX_DECIMAL_PLACES);
    let factor = 10f64.powi(places as i32);
    let scaled = value * factor;
    // Too large to carry any fractional digits anyway.
    if !scaled.is_finite() {
        return value;
    }
    let rounded = scaled.round() / factor;
    format!("{:.*}", places as usize, rounded)
        .parse()
        .unwrap_or(f64::NAN)
}

/// Longest leading float literal of `raw` (after leading whitespace), or NaN.
#[must_use]
pub fn parse_float_prefix(raw: &str) -> f64 {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }
    if digits == 0 {
        return f64::NAN;
    }

    // Exponent only counts when it has at least one digit.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().unwrap_or(f64::NAN)
}

/// Leading integer of `raw` (after leading whitespace), fraction discarded.
#[must_use]
pub fn parse_int_prefix(raw: &str) -> f64 {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return f64::NAN;
    }
    s[..end].parse().unwrap_or(f64::NAN)
}

/// Render a normalized value, using [`PLACEHOLDER`] for NaN.
#[must_use]
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        PLACEHOLDER.to_string()
    } else {
        value.to_string()
    }
}

/// `None` for NaN, for JSON output where missing values are null.
#[must_use]
pub fn non_nan(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

/// AQHI from PM10 and NO2 concentrations.
#[must_use]
pub fn calculate_aqhi(pm10: f64, no2: f64) -> f64 {
    10.0 / 16.4 * 100.0 * ((0.00019 * pm10).exp() - 1.0 + (0.00061 * no2).exp() - 1.0)
}
