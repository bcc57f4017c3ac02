//! Threshold classification of continuous index values into ordinal levels.
//!
//! A breakpoint table is an ascending list of thresholds. The level of a value
//! is the number of thresholds it has reached, so a table of `n` breakpoints
//! yields levels `0..=n`.

use serde::Serialize;
use utoipa::ToSchema;

use crate::metrics::parse_float_prefix;

/// AQHI health-risk breakpoints (low / moderate / high / very high / serious).
pub const AQHI_BREAKPOINTS: [f64; 4] = [4.0, 7.0, 8.0, 11.0];

/// Classify `value` against ascending `breakpoints`.
///
/// Returns the count of breakpoints `<= value`, stopping at the first
/// breakpoint that exceeds it. NaN compares false against every breakpoint
/// and therefore lands on level 0.
#[must_use]
pub fn classify(value: f64, breakpoints: &[f64]) -> usize {
    let mut level = 0;
    for &bp in breakpoints {
        if value >= bp {
            level += 1;
        } else {
            break;
        }
    }
    level
}

/// Parse a raw string leniently, then classify it.
#[must_use]
pub fn classify_str(raw: &str, breakpoints: &[f64]) -> usize {
    classify(parse_float_prefix(raw), breakpoints)
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TableError {
    #[error("Breakpoint table is empty")]
    Empty,

    #[error("Breakpoint at index {0} is not a finite number")]
    NotFinite(usize),

    #[error("Breakpoint at index {0} is lower than its predecessor")]
    Unsorted(usize),
}

/// A validated, non-decreasing breakpoint table.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakpointTable {
    thresholds: Vec<f64>,
}

impl BreakpointTable {
    /// Build a table, rejecting empty, non-finite or unsorted input.
    ///
    /// # Errors
    ///
    /// Returns a `TableError` describing the first offending breakpoint.
    pub fn new(thresholds: Vec<f64>) -> Result<Self, TableError> {
        if thresholds.is_empty() {
            return Err(TableError::Empty);
        }
        if let Some(i) = thresholds.iter().position(|t| !t.is_finite()) {
            return Err(TableError::NotFinite(i));
        }
        if let Some(i) = thresholds.windows(2).position(|w| w[1] < w[0]) {
            return Err(TableError::Unsorted(i + 1));
        }
        Ok(Self { thresholds })
    }

    #[must_use]
    pub fn aqhi() -> Self {
        Self {
            thresholds: AQHI_BREAKPOINTS.to_vec(),
        }
    }

    #[must_use]
    pub fn classify(&self, value: f64) -> usize {
        classify(value, &self.thresholds)
    }

    /// Highest level this table can produce.
    #[must_use]
    pub fn max_level(&self) -> usize {
        self.thresholds.len()
    }

    #[must_use]
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }
}

/// AQHI health-risk category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AqhiLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
    Serious,
}

impl AqhiLevel {
    const ALL: [Self; 5] = [
        Self::Low,
        Self::Moderate,
        Self::High,
        Self::VeryHigh,
        Self::Serious,
    ];

    /// Map an AQHI value to its category. `None` for NaN, so callers can show
    /// a placeholder instead of the level-0 fallthrough.
    #[must_use]
    pub fn from_value(value: f64, table: &BreakpointTable) -> Option<Self> {
        if value.is_nan() {
            return None;
        }
        let level = table.classify(value).min(Self::ALL.len() - 1);
        Some(Self::ALL[level])
    }

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            Self::Low => "低",
            Self::Moderate => "中",
            Self::High => "高",
            Self::VeryHigh => "甚高",
            Self::Serious => "严重",
        }
    }

    #[must_use]
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Low => "aqhi-low",
            Self::Moderate => "aqhi-moderate",
            Self::High => "aqhi-high",
            Self::VeryHigh => "aqhi-very-high",
            Self::Serious => "aqhi-serious",
        }
    }

    /// Health advice for the general public.
    #[must_use]
    pub fn advisory(self) -> &'static str {
        match self {
            Self::Low | Self::Moderate => "可如常活动",
            Self::High => "心脏病或呼吸系统疾病患者应减少体力消耗及户外活动",
            Self::VeryHigh => "儿童、长者及患病人士应尽量减少户外活动",
            Self::Serious => "公众应尽量减少户外活动，避免在交通繁忙地方逗留",
        }
    }
}
