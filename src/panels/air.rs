use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::display::{primary_pollutant_items, relative_time, LabelItem, QualityGrade};
use crate::levels::AqhiLevel;
use crate::metrics::{format_value, non_nan, parse_float_prefix, parse_int_prefix, MetricKind};
use crate::panels::Tables;
use crate::upstream::models::CityRecord;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AirConditionCard {
    pub city_en: String,
    pub city_cn: String,
    /// Integer AQI (null if missing)
    pub aqi: Option<i64>,
    pub quality: Option<LabelItem>,
    pub updated_at: DateTime<Utc>,
    /// Relative update time, e.g. `3 小时前`
    pub updated_text: String,
    pub primary_pollutants: Vec<LabelItem>,
    pub pollutants: Vec<PollutantValue>,
    pub aqhi: Option<AqhiSummary>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PollutantValue {
    pub metric: MetricKind,
    pub label: String,
    pub css_class: String,
    pub value: Option<f64>,
    /// Display text; a placeholder when the value is missing
    pub text: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AqhiSummary {
    pub value: f64,
    pub level: AqhiLevel,
    pub index: usize,
    pub text: String,
    pub css_class: String,
    pub advisory: String,
}

/// Build the air-condition card for a city's latest record.
#[must_use]
pub fn build_air_card(record: &CityRecord, tables: &Tables, now: DateTime<Utc>) -> AirConditionCard {
    let fields = &record.fields;

    let aqi = fields
        .aqi
        .as_deref()
        .map(parse_int_prefix)
        .and_then(non_nan)
        .map(|v| v as i64);

    let names: Vec<&str> = record
        .primary_pollutants
        .iter()
        .map(|p| p.pollutant.as_str())
        .collect();

    // The card shows the stored decimal as-is, only trailing zeros dropped.
    let pollutants = MetricKind::POLLUTANTS
        .into_iter()
        .map(|kind| {
            let value = fields.raw(kind).map_or(f64::NAN, parse_float_prefix);
            PollutantValue {
                metric: kind,
                label: kind.label().to_string(),
                css_class: kind.css_class(),
                value: non_nan(value),
                text: format_value(value),
            }
        })
        .collect();

    let aqhi_value = tables.value(fields, MetricKind::Aqhi);
    let aqhi = AqhiLevel::from_value(aqhi_value, &tables.aqhi).map(|level| AqhiSummary {
        value: aqhi_value,
        level,
        index: level.index(),
        text: level.text().to_string(),
        css_class: level.css_class().to_string(),
        advisory: level.advisory().to_string(),
    });

    AirConditionCard {
        city_en: record.city.name_en.clone(),
        city_cn: record.city.name_cn.clone(),
        aqi,
        quality: QualityGrade::from_code(&fields.quality).map(QualityGrade::label),
        updated_at: record.update_dtm,
        updated_text: relative_time(record.update_dtm, now),
        primary_pollutants: primary_pollutant_items(&names),
        pollutants,
        aqhi,
    }
}
