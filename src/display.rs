//! Localized display tables: quality grades, pollutant labels, weather icon
//! classes, weekday names and relative times.

use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc, Weekday};
use serde::Serialize;
use utoipa::ToSchema;

use crate::metrics::MetricKind;

/// A CSS class paired with its display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LabelItem {
    pub css_class: String,
    pub text: String,
}

impl LabelItem {
    fn new(css_class: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            css_class: css_class.into(),
            text: text.into(),
        }
    }
}

/// Air quality grade as reported upstream (`E`, `G`, `LP`, `MP`, `HP`, `SP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    Excellent,
    Good,
    LightlyPolluted,
    ModeratelyPolluted,
    HeavilyPolluted,
    SeverelyPolluted,
}

impl QualityGrade {
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "E" => Some(Self::Excellent),
            "G" => Some(Self::Good),
            "LP" => Some(Self::LightlyPolluted),
            "MP" => Some(Self::ModeratelyPolluted),
            "HP" => Some(Self::HeavilyPolluted),
            "SP" => Some(Self::SeverelyPolluted),
            _ => None,
        }
    }

    #[must_use]
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Excellent => "qlty-excellent",
            Self::Good => "qlty-good",
            Self::LightlyPolluted => "qlty-lightly",
            Self::ModeratelyPolluted => "qlty-moderately",
            Self::HeavilyPolluted => "qlty-heavily",
            Self::SeverelyPolluted => "qlty-severely",
        }
    }

    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            Self::Excellent => "优",
            Self::Good => "良",
            Self::LightlyPolluted => "轻度污染",
            Self::ModeratelyPolluted => "中度污染",
            Self::HeavilyPolluted => "重度污染",
            Self::SeverelyPolluted => "严重污染",
        }
    }

    #[must_use]
    pub fn label(self) -> LabelItem {
        LabelItem::new(self.css_class(), self.text())
    }
}

/// Labels for a record's primary pollutants. An empty list becomes a single
/// "none" item; unknown pollutant names are skipped.
#[must_use]
pub fn primary_pollutant_items<S: AsRef<str>>(names: &[S]) -> Vec<LabelItem> {
    let items: Vec<LabelItem> = names
        .iter()
        .filter_map(|name| match name.as_ref().parse::<MetricKind>() {
            Ok(kind) if MetricKind::POLLUTANTS.contains(&kind) => {
                Some(LabelItem::new(kind.css_class(), kind.label()))
            }
            _ => {
                tracing::warn!(pollutant = %name.as_ref(), "Unknown primary pollutant");
                None
            }
        })
        .collect();

    if items.is_empty() {
        vec![LabelItem::new("", "无")]
    } else {
        items
    }
}

/// Weather-icons class for a HeWeather condition code.
#[must_use]
pub fn weather_icon_class(code: u16, is_day: bool) -> &'static str {
    let (day, night) = match code {
        100 => ("wi-day-sunny", "wi-night-clear"),
        101 => ("wi-cloudy", "wi-cloudy"),
        102 => ("wi-cloud", "wi-cloud"),
        103 => ("wi-day-cloudy", "wi-night-cloudy"),
        104 => ("wi-day-sunny-overcast", "wi-night-partly-cloudy"),
        200 | 202..=204 => ("wi-day-windy", "wi-windy"),
        205..=208 => ("wi-strong-wind", "wi-strong-wind"),
        209 | 210 | 303 | 310..=312 => ("wi-day-thunderstorm", "wi-night-thunderstorm"),
        211 | 213 => ("wi-hurricane", "wi-hurricane"),
        212 => ("wi-tornado", "wi-tornado"),
        300 | 305..=308 => ("wi-day-rain", "wi-night-rain"),
        301 => ("wi-day-showers", "wi-night-showers"),
        302 => ("wi-day-storm-showers", "wi-night-storm-showers"),
        304 => ("wi-day-hail", "wi-night-hail"),
        309 => ("wi-day-sprinkle", "wi-night-sprinkle"),
        313 => ("wi-day-rain-mix", "wi-night-rain-mix"),
        400..=403 | 407 => ("wi-day-snow", "wi-night-snow"),
        404..=406 => ("wi-day-sleet", "wi-night-sleet"),
        500 | 501 => ("wi-day-fog", "wi-night-fog"),
        502 => ("wi-day-haze", "wi-dust"),
        503 | 504 => ("wi-dust", "wi-dust"),
        506 => ("wi-volcano", "wi-volcano"),
        507 | 508 => ("wi-sandstorm", "wi-sandstorm"),
        900 => ("wi-thermometer", "wi-thermometer"),
        901 => ("wi-thermometer-exterior", "wi-thermometer-exterior"),
        _ => ("wi-na", "wi-na"),
    };
    if is_day { day } else { night }
}

/// Parse a condition code that arrives as a string; unknown maps to 999.
#[must_use]
pub fn condition_code(raw: &str) -> u16 {
    raw.trim().parse().unwrap_or(999)
}

/// `周一` .. `周日`
#[must_use]
pub fn weekday_text(day: Weekday) -> String {
    let zh = match day {
        Weekday::Mon => "一",
        Weekday::Tue => "二",
        Weekday::Wed => "三",
        Weekday::Thu => "四",
        Weekday::Fri => "五",
        Weekday::Sat => "六",
        Weekday::Sun => "日",
    };
    format!("周{zh}")
}

#[must_use]
pub fn weekday_of<T: Datelike>(date: &T) -> String {
    weekday_text(date.weekday())
}

/// Humanized distance between `then` and `now` in Chinese ("3 小时前").
///
/// Uses moment.js's default rounding thresholds (45 s, 45 min, 22 h, 26 d,
/// 11 months).
#[must_use]
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta_ms = (now - then).num_milliseconds();
    let past = delta_ms >= 0;
    let ms = delta_ms.unsigned_abs() as f64;

    let seconds = (ms / 1000.0).round();
    let minutes = (seconds / 60.0).round();
    let hours = (minutes / 60.0).round();
    let days = (hours / 24.0).round();
    let months = (days / 30.4).round();
    let years = (days / 365.0).round();

    let text = if seconds < 45.0 {
        "几秒".to_string()
    } else if minutes <= 1.0 {
        "1 分钟".to_string()
    } else if minutes < 45.0 {
        format!("{minutes} 分钟")
    } else if hours <= 1.0 {
        "1 小时".to_string()
    } else if hours < 22.0 {
        format!("{hours} 小时")
    } else if days <= 1.0 {
        "1 天".to_string()
    } else if days < 26.0 {
        format!("{days} 天")
    } else if months <= 1.0 {
        "1 个月".to_string()
    } else if months < 11.0 {
        format!("{months} 个月")
    } else if years <= 1.0 {
        "1 年".to_string()
    } else {
        format!("{years} 年")
    };

    if past {
        format!("{text}前")
    } else {
        format!("{text}后")
    }
}

/// Parse `HH:MM` into minutes since midnight.
#[must_use]
pub fn minutes_of_day(hhmm: &str) -> Option<u32> {
    let t = NaiveTime::parse_from_str(hhmm.trim(), "%H:%M").ok()?;
    Some(t.hour() * 60 + t.minute())
}

/// Whether `local` falls between sunrise and sunset, bounds included.
/// Unparseable astronomy times count as daytime.
#[must_use]
pub fn is_daytime(local: NaiveTime, sunrise: &str, sunset: &str) -> bool {
    let now = local.hour() * 60 + local.minute();
    match (minutes_of_day(sunrise), minutes_of_day(sunset)) {
        (Some(sr), Some(ss)) => now >= sr && now <= ss,
        _ => true,
    }
}
