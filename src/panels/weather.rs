use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::display::{condition_code, is_daytime, relative_time, weather_icon_class, weekday_of};
use crate::error::{AppError, AppResult};
use crate::upstream::models::WeatherReport;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WeatherCard {
    pub city_en: String,
    pub updated_at: DateTime<Utc>,
    pub updated_text: String,
    /// Weekday of the local update time, e.g. `周三`
    pub weekday: String,
    pub is_day: bool,
    pub today_max: String,
    pub today_min: String,
    pub current: CurrentWeather,
    /// The next two half-day outlooks
    pub outlook: Vec<HalfDayOutlook>,
    pub hourly: Vec<HourlyItem>,
    pub daily: Vec<DailyItem>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CurrentWeather {
    pub temp: String,
    pub text: String,
    pub icon_class: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HalfDayOutlook {
    pub header: String,
    pub text: String,
    pub icon_class: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HourlyItem {
    pub time: String,
    pub temp: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DailyItem {
    pub weekday: String,
    pub text: String,
    pub icon_class: String,
    pub max: String,
    pub min: String,
}

fn icon(code: &str, is_day: bool) -> String {
    format!("wi {}", weather_icon_class(condition_code(code), is_day))
}

/// Build the weather card from a report.
///
/// # Errors
///
/// Returns `AppError::Upstream` when the report has no daily forecast for today.
pub fn build_weather_card(
    city_en: &str,
    report: &WeatherReport,
    now: DateTime<Utc>,
) -> AppResult<WeatherCard> {
    let today = report
        .daily_forecast
        .first()
        .ok_or_else(|| AppError::Upstream("Weather report has no daily forecast".to_string()))?;
    let tomorrow = report.daily_forecast.get(1);

    let local = report.basic.update.loc;
    let updated_at = report.basic.update.utc.and_utc();
    let is_day = is_daytime(local.time(), &today.astro.sr, &today.astro.ss);

    let mut outlook = Vec::with_capacity(2);
    if is_day {
        outlook.push(HalfDayOutlook {
            header: "今天白天".to_string(),
            text: today.cond.txt_d.clone(),
            icon_class: icon(&today.cond.code_d, true),
        });
        outlook.push(HalfDayOutlook {
            header: "今天夜间".to_string(),
            text: today.cond.txt_n.clone(),
            icon_class: icon(&today.cond.code_n, false),
        });
    } else {
        outlook.push(HalfDayOutlook {
            header: "今天夜间".to_string(),
            text: today.cond.txt_n.clone(),
            icon_class: icon(&today.cond.code_n, false),
        });
        if let Some(tomorrow) = tomorrow {
            outlook.push(HalfDayOutlook {
                header: "明天白天".to_string(),
                text: tomorrow.cond.txt_d.clone(),
                icon_class: icon(&tomorrow.cond.code_d, true),
            });
        }
    }

    let mut hourly = vec![HourlyItem {
        time: "现在".to_string(),
        temp: report.now.tmp.clone(),
    }];
    hourly.extend(report.hourly_forecast.iter().map(|f| HourlyItem {
        time: f.date.format("%H:%M").to_string(),
        temp: f.tmp.clone(),
    }));

    let daily = report
        .daily_forecast
        .iter()
        .skip(1)
        .map(|f| DailyItem {
            weekday: weekday_of(&f.date),
            text: f.cond.txt_d.clone(),
            icon_class: icon(&f.cond.code_d, true),
            max: f.tmp.max.clone(),
            min: f.tmp.min.clone(),
        })
        .collect();

    Ok(WeatherCard {
        city_en: city_en.to_string(),
        updated_at,
        updated_text: relative_time(updated_at, now),
        weekday: weekday_of(&local),
        is_day,
        today_max: today.tmp.max.clone(),
        today_min: today.tmp.min.clone(),
        current: CurrentWeather {
            temp: report.now.tmp.clone(),
            text: report.now.cond.txt.clone(),
            icon_class: icon(&report.now.cond.code, is_day),
        },
        outlook,
        hourly,
        daily,
    })
}
