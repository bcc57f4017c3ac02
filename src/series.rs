//! Hour-aligned time series with gap filling.
//!
//! The air-quality API only has rows for hours it actually scraped, so a
//! 24-hour chart has to be reconciled against whatever came back: every
//! requested hour gets a slot, and slots without a record stay `None`.

use chrono::{DateTime, Duration, DurationRound, TimeDelta, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Upper bound on the length of a requested series (one week).
pub const MAX_HOURS: u32 = 168;

pub const DEFAULT_HOURS: u32 = 24;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HourlySeries {
    /// Slot start times, oldest first
    pub times: Vec<DateTime<Utc>>,
    /// Values aligned with `times` (null where no record exists)
    pub values: Vec<Option<f64>>,
}

impl HourlySeries {
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of slots that were filled from a record.
    #[must_use]
    pub fn filled(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Truncate a timestamp to the start of its hour.
#[must_use]
pub fn hour_floor(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_trunc(TimeDelta::hours(1)).unwrap_or(t)
}

/// First slot of an `hours`-long window ending at `end`.
#[must_use]
pub fn window_start(end: DateTime<Utc>, hours: u32) -> DateTime<Utc> {
    hour_floor(end) - Duration::hours(i64::from(hours.saturating_sub(1)))
}

/// Build `hours` consecutive hourly slots ending at the hour containing `end`
/// and fill them from `points`.
///
/// Points outside the window are ignored. When two points fall in the same
/// hour the later one in `points` wins. NaN values count as missing.
#[must_use]
pub fn hourly_series<I>(end: DateTime<Utc>, hours: u32, points: I) -> HourlySeries
where
    I: IntoIterator<Item = (DateTime<Utc>, f64)>,
{
    if hours == 0 {
        return HourlySeries {
            times: Vec::new(),
            values: Vec::new(),
        };
    }

    let start = window_start(end, hours);
    let len = hours as usize;
    let times: Vec<DateTime<Utc>> = (0..len)
        .map(|i| start + Duration::hours(i as i64))
        .collect();
    let mut values = vec![None; len];

    for (t, v) in points {
        if v.is_nan() {
            continue;
        }
        let offset = (hour_floor(t) - start).num_hours();
        if let Ok(idx) = usize::try_from(offset)
            && idx < len
        {
            values[idx] = Some(v);
        }
    }

    HourlySeries { times, values }
}
