//! Tests for localized display tables.
//!
//! Run with: cargo test --test display_test

use aqhi_board::display::{
    condition_code, is_daytime, minutes_of_day, primary_pollutant_items, relative_time,
    weather_icon_class, weekday_text, QualityGrade,
};
use chrono::{Duration, NaiveTime, TimeZone, Utc, Weekday};

#[test]
fn quality_grades() {
    let grade = QualityGrade::from_code("LP").expect("known grade");
    assert_eq!(grade.css_class(), "qlty-lightly");
    assert_eq!(grade.text(), "轻度污染");
    assert_eq!(QualityGrade::from_code("E").map(QualityGrade::text), Some("优"));
    assert_eq!(QualityGrade::from_code(""), None);
    assert_eq!(QualityGrade::from_code("X"), None);
}

#[test]
fn primary_pollutants_with_special_labels() {
    let items = primary_pollutant_items(&["pm2_5", "o3_8h"]);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].css_class, "pol-pm2_5");
    assert_eq!(items[0].text, "PM2.5");
    assert_eq!(items[1].text, "O3/8h");
}

#[test]
fn empty_primary_pollutants_show_none() {
    let items = primary_pollutant_items::<&str>(&[]);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].css_class, "");
    assert_eq!(items[0].text, "无");

    // aqi is a metric but never a primary pollutant
    let items = primary_pollutant_items(&["aqi", "bogus"]);
    assert_eq!(items[0].text, "无");
}

#[test]
fn weather_icons_day_and_night() {
    assert_eq!(weather_icon_class(100, true), "wi-day-sunny");
    assert_eq!(weather_icon_class(100, false), "wi-night-clear");
    assert_eq!(weather_icon_class(502, false), "wi-dust");
    assert_eq!(weather_icon_class(206, true), "wi-strong-wind");
    assert_eq!(weather_icon_class(311, false), "wi-night-thunderstorm");
    assert_eq!(weather_icon_class(505, true), "wi-na");
    assert_eq!(condition_code("305"), 305);
    assert_eq!(condition_code("n/a"), 999);
}

#[test]
fn weekday_names() {
    assert_eq!(weekday_text(Weekday::Mon), "周一");
    assert_eq!(weekday_text(Weekday::Sun), "周日");
}

#[test]
fn relative_times_follow_moment_thresholds() {
    let now = Utc.with_ymd_and_hms(2016, 5, 11, 12, 0, 0).unwrap();
    let ago = |d: Duration| relative_time(now - d, now);

    assert_eq!(ago(Duration::seconds(10)), "几秒前");
    assert_eq!(ago(Duration::seconds(50)), "1 分钟前");
    assert_eq!(ago(Duration::minutes(5)), "5 分钟前");
    assert_eq!(ago(Duration::minutes(50)), "1 小时前");
    assert_eq!(ago(Duration::hours(3)), "3 小时前");
    assert_eq!(ago(Duration::hours(23)), "1 天前");
    assert_eq!(ago(Duration::days(4)), "4 天前");
    assert_eq!(ago(Duration::days(40)), "1 个月前");
    assert_eq!(ago(Duration::days(800)), "2 年前");
    assert_eq!(relative_time(now + Duration::hours(2), now), "2 小时后");
}

#[test]
fn daytime_window_is_inclusive() {
    let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
    assert!(is_daytime(t(5, 4), "05:04", "19:17"));
    assert!(is_daytime(t(19, 17), "05:04", "19:17"));
    assert!(!is_daytime(t(19, 18), "05:04", "19:17"));
    assert!(!is_daytime(t(2, 0), "05:04", "19:17"));
    assert!(is_daytime(t(2, 0), "bad", "19:17"));
    assert_eq!(minutes_of_day("06:30"), Some(390));
}
