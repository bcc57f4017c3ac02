//! Ready-to-render dashboard models built from upstream records.
//!
//! Builders here are pure: they take records, the shared lookup tables and a
//! reference time, and return serializable models. Fetching lives in
//! `upstream` and the handlers in `routes`.

pub mod air;
pub mod history;
pub mod map;
pub mod ranking;
pub mod weather;

use crate::levels::BreakpointTable;
use crate::metrics::{calculate_aqhi, parse_float_prefix, MetricKind, MetricRules};
use crate::upstream::models::MetricFields;

/// Lookup tables shared by every builder. Constructed once at startup.
#[derive(Debug, Clone)]
pub struct Tables {
    pub rules: MetricRules,
    pub aqhi: BreakpointTable,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            rules: MetricRules::default(),
            aqhi: BreakpointTable::aqhi(),
        }
    }
}

impl Tables {
    /// Normalized value of `kind` in `fields`, NaN when missing.
    ///
    /// AQHI falls back to a value computed from PM10 and NO2 when the API did
    /// not provide one.
    #[must_use]
    pub fn value(&self, fields: &MetricFields, kind: MetricKind) -> f64 {
        let value = self.rules.normalize_opt(kind, fields.raw(kind));
        if kind == MetricKind::Aqhi && value.is_nan() {
            let derived = derived_aqhi(fields);
            if !derived.is_nan() {
                return self.rules.normalize(kind, &derived.to_string(), None);
            }
        }
        value
    }

    /// Value used for charts and comparisons (map, ranking, history).
    ///
    /// CO keeps its stored decimals; its parse rule would truncate sub-1
    /// mg/m³ readings to zero.
    #[must_use]
    pub fn plotted_value(&self, fields: &MetricFields, kind: MetricKind) -> f64 {
        if kind == MetricKind::Co {
            return fields.co.as_deref().map_or(f64::NAN, parse_float_prefix);
        }
        self.value(fields, kind)
    }
}

/// AQHI from the record's PM10 and NO2, NaN if either is missing.
#[must_use]
pub fn derived_aqhi(fields: &MetricFields) -> f64 {
    let pm10 = fields.pm10.as_deref().map_or(f64::NAN, parse_float_prefix);
    let no2 = fields.no2.as_deref().map_or(f64::NAN, parse_float_prefix);
    if pm10.is_nan() || no2.is_nan() {
        return f64::NAN;
    }
    calculate_aqhi(pm10, no2)
}
