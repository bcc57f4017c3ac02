//! Tests for dashboard model builders.
//!
//! Run with: cargo test --test panels_test

use aqhi_board::levels::AqhiLevel;
use aqhi_board::metrics::{MetricKind, PLACEHOLDER};
use aqhi_board::panels::air::build_air_card;
use aqhi_board::panels::history::build_history;
use aqhi_board::panels::map::{build_station_map, symbol_size, MAX_SYMBOL_SIZE, MIN_SYMBOL_SIZE};
use aqhi_board::panels::ranking::build_ranking;
use aqhi_board::panels::weather::build_weather_card;
use aqhi_board::panels::{derived_aqhi, Tables};
use aqhi_board::upstream::models::{CityRecord, Page, StationRecord, WeatherEnvelope};
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;

fn city_record(name_en: &str, name_cn: &str, hour: u32, fields: serde_json::Value) -> CityRecord {
    let mut value = json!({
        "url": "http://api/airquality/city_record/1/",
        "id": 1,
        "update_dtm": format!("2016-05-11T{hour:02}:00:00Z"),
        "city": {
            "url": "http://api/airquality/city/x/",
            "name_en": name_en,
            "name_cn": name_cn,
            "longitude": "116.4074",
            "latitude": "39.9042"
        },
        "primary_pollutants": [],
        "quality": ""
    });
    if let (Some(obj), Some(extra)) = (value.as_object_mut(), fields.as_object()) {
        for (k, v) in extra {
            obj.insert(k.clone(), v.clone());
        }
    }
    serde_json::from_value(value).expect("valid city record")
}

fn station_record(name: &str, lon: Option<&str>, fields: serde_json::Value) -> StationRecord {
    let mut value = json!({
        "id": 7,
        "station": { "id": 3, "name_cn": name, "longitude": lon, "latitude": "39.9" },
        "city_record": "http://api/airquality/city_record/1/",
        "update_dtm": "2016-05-11T06:00:00+08:00"
    });
    if let (Some(obj), Some(extra)) = (value.as_object_mut(), fields.as_object()) {
        for (k, v) in extra {
            obj.insert(k.clone(), v.clone());
        }
    }
    serde_json::from_value(value).expect("valid station record")
}

#[test]
fn page_of_records_deserializes() {
    let page: Page<CityRecord> = serde_json::from_value(json!({
        "count": 1,
        "next": null,
        "previous": null,
        "results": [{
            "id": 9,
            "update_dtm": "2016-05-11T14:00:00+08:00",
            "city": { "name_en": "beijing", "name_cn": "北京", "longitude": null, "latitude": null },
            "primary_pollutants": [{ "pollutant": "pm10" }],
            "aqi": "85.0000", "aqhi": null, "co": "0.8000", "no2": "40.0000",
            "o3": "120.0000", "o3_8h": "100.0000", "pm10": "110.0000",
            "pm2_5": "60.0000", "so2": "5.0000", "quality": "G"
        }]
    }))
    .expect("page");

    let record = &page.results[0];
    assert_eq!(record.update_dtm, Utc.with_ymd_and_hms(2016, 5, 11, 6, 0, 0).unwrap());
    assert_eq!(record.fields.raw(MetricKind::Co), Some("0.8000"));
    assert_eq!(record.fields.raw(MetricKind::Aqhi), None);
}

#[test]
fn air_card_formats_values_and_levels() {
    let mut record = city_record(
        "beijing",
        "北京",
        6,
        json!({
            "aqi": "85.0000", "aqhi": "4.2134", "co": "0.8000", "no2": "",
            "pm2_5": "60.0000", "quality": "G"
        }),
    );
    record.primary_pollutants = serde_json::from_value(json!([{ "pollutant": "pm2_5" }])).unwrap();
    let now = record.update_dtm + Duration::hours(3);

    let card = build_air_card(&record, &Tables::default(), now);

    assert_eq!(card.aqi, Some(85));
    assert_eq!(card.quality.as_ref().map(|q| q.text.as_str()), Some("良"));
    assert_eq!(card.updated_text, "3 小时前");
    assert_eq!(card.primary_pollutants[0].text, "PM2.5");

    let co = card.pollutants.iter().find(|p| p.metric == MetricKind::Co).unwrap();
    assert_eq!(co.text, "0.8");
    let no2 = card.pollutants.iter().find(|p| p.metric == MetricKind::No2).unwrap();
    assert_eq!(no2.value, None);
    assert_eq!(no2.text, PLACEHOLDER);
    let so2 = card.pollutants.iter().find(|p| p.metric == MetricKind::So2).unwrap();
    assert_eq!(so2.text, PLACEHOLDER);

    let aqhi = card.aqhi.expect("aqhi summary");
    assert_eq!(aqhi.value, 4.21);
    assert_eq!(aqhi.level, AqhiLevel::Moderate);
    assert_eq!(aqhi.text, "中");
}

#[test]
fn missing_aqhi_is_derived_from_pm10_and_no2() {
    let record = city_record("x", "某地", 1, json!({ "pm10": "100.0000", "no2": "50.0000" }));
    assert!((derived_aqhi(&record.fields) - 3.058).abs() < 1e-3);
    assert_eq!(Tables::default().value(&record.fields, MetricKind::Aqhi), 3.06);

    let card = build_air_card(&record, &Tables::default(), record.update_dtm);
    assert_eq!(card.aqhi.map(|a| a.level), Some(AqhiLevel::Low));
    assert_eq!(card.primary_pollutants[0].text, "无");
    assert_eq!(card.aqi, None);
    assert!(card.quality.is_none());
}

#[test]
fn history_is_gap_filled() {
    let records = vec![
        city_record("beijing", "北京", 20, json!({ "aqi": "80.0000" })),
        city_record("beijing", "北京", 22, json!({ "aqi": "95.5000" })),
        city_record("beijing", "北京", 23, json!({ "aqi": null })),
    ];
    let end = Utc.with_ymd_and_hms(2016, 5, 11, 23, 30, 0).unwrap();

    let history = build_history("beijing", MetricKind::Aqi, &records, end, 24, &Tables::default());

    assert_eq!(history.series.len(), 24);
    assert_eq!(history.filled, 2);
    assert_eq!(history.series.values[20], Some(80.0));
    assert_eq!(history.series.values[21], None);
    assert_eq!(history.series.values[22], Some(95.5));
    assert_eq!(history.series.values[23], None);
    assert_eq!(history.label, "AQI");
}

#[test]
fn ranking_sorts_ascending_with_missing_last() {
    let records = vec![
        city_record("shanghai", "上海", 6, json!({ "pm2_5": "45.0000" })),
        city_record("harbin", "哈尔滨", 6, json!({ "pm2_5": null })),
        city_record("beijing", "北京", 6, json!({ "pm2_5": "120.0000" })),
        city_record("guangzhou", "广州", 6, json!({ "pm2_5": "30.9000" })),
    ];

    let ranking = build_ranking(MetricKind::Pm25, &records, &Tables::default());
    let order: Vec<&str> = ranking.entries.iter().map(|e| e.city_en.as_str()).collect();

    assert_eq!(order, vec!["guangzhou", "shanghai", "beijing", "harbin"]);
    assert_eq!(ranking.entries[0].rank, Some(1));
    assert_eq!(ranking.entries[0].value, Some(30.0));
    assert_eq!(ranking.entries[3].rank, None);
    assert_eq!(ranking.entries[3].text, PLACEHOLDER);
    assert_eq!(ranking.label, "PM2.5");
}

#[test]
fn symbol_sizes_scale_between_bounds() {
    assert_eq!(symbol_size(10.0, 10.0, 50.0), MIN_SYMBOL_SIZE);
    assert_eq!(symbol_size(50.0, 10.0, 50.0), MAX_SYMBOL_SIZE);
    assert_eq!(symbol_size(30.0, 10.0, 50.0), 60.0);
    assert_eq!(symbol_size(30.0, 30.0, 30.0), MIN_SYMBOL_SIZE);
    assert_eq!(symbol_size(f64::NAN, 10.0, 50.0), MIN_SYMBOL_SIZE);
}

#[test]
fn station_map_builds_one_series_per_metric() {
    let records = vec![
        station_record("万寿西宫", Some("116.366"), json!({ "aqi": "50.0000", "co": "0.6000" })),
        station_record("定陵", Some("116.17"), json!({ "aqi": "150.0000", "co": "1.2000" })),
        station_record("无坐标", None, json!({ "aqi": "90.0000" })),
    ];
    let geo = json!({ "type": "FeatureCollection", "features": [] });

    let map = build_station_map("beijing", geo.clone(), &records, &Tables::default());

    assert_eq!(map.geo, geo);
    assert_eq!(map.series.len(), 8);
    assert_eq!(
        map.updated_at,
        Some(Utc.with_ymd_and_hms(2016, 5, 10, 22, 0, 0).unwrap())
    );

    let aqi = &map.series[0];
    assert_eq!(aqi.metric, MetricKind::Aqi);
    assert_eq!(aqi.points.len(), 2);
    assert_eq!((aqi.min, aqi.max), (Some(50.0), Some(150.0)));
    assert_eq!(aqi.points[0].symbol_size, MIN_SYMBOL_SIZE);
    assert_eq!(aqi.points[1].symbol_size, MAX_SYMBOL_SIZE);
    assert_eq!(aqi.points[1].station, "定陵");

    let so2 = map.series.iter().find(|s| s.metric == MetricKind::So2).unwrap();
    assert_eq!(so2.min, None);
    assert!(so2.points.iter().all(|p| p.value.is_none()));
}

#[test]
fn carbon_monoxide_keeps_decimals_on_map_and_ranking() {
    let stations = vec![
        station_record("古城", Some("116.18"), json!({ "co": "0.4000" })),
        station_record("天坛", Some("116.41"), json!({ "co": "0.9000" })),
        station_record("奥体中心", Some("116.39"), json!({ "co": "1.7000" })),
    ];
    let map = build_station_map("beijing", json!({}), &stations, &Tables::default());
    let co = map.series.iter().find(|s| s.metric == MetricKind::Co).unwrap();

    let values: Vec<Option<f64>> = co.points.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![Some(0.4), Some(0.9), Some(1.7)]);
    assert_eq!((co.min, co.max), (Some(0.4), Some(1.7)));
    assert!((co.points[0].symbol_size - MIN_SYMBOL_SIZE).abs() < 1e-9);
    assert!((co.points[1].symbol_size - 50.769).abs() < 1e-2);
    assert!((co.points[2].symbol_size - MAX_SYMBOL_SIZE).abs() < 1e-9);

    let cities = vec![
        city_record("beijing", "北京", 6, json!({ "co": "0.8000" })),
        city_record("shanghai", "上海", 6, json!({ "co": "0.4000" })),
        city_record("taiyuan", "太原", 6, json!({ "co": "1.2000" })),
    ];
    let ranking = build_ranking(MetricKind::Co, &cities, &Tables::default());
    let order: Vec<(&str, Option<f64>)> = ranking
        .entries
        .iter()
        .map(|e| (e.city_en.as_str(), e.value))
        .collect();
    assert_eq!(
        order,
        vec![("shanghai", Some(0.4)), ("beijing", Some(0.8)), ("taiyuan", Some(1.2))]
    );
    assert_eq!(ranking.entries[0].text, "0.4");

    // The parse rule itself still truncates.
    assert_eq!(Tables::default().value(&cities[0].fields, MetricKind::Co), 0.0);
}

#[test]
fn carbon_monoxide_history_keeps_decimals() {
    let records = vec![city_record("beijing", "北京", 22, json!({ "co": "0.6000" }))];
    let end = Utc.with_ymd_and_hms(2016, 5, 11, 23, 0, 0).unwrap();
    let history = build_history("beijing", MetricKind::Co, &records, end, 2, &Tables::default());
    assert_eq!(history.series.values, vec![Some(0.6), None]);
}

fn weather_report() -> aqhi_board::upstream::models::WeatherReport {
    let text = include_str!("fixtures/weather_beijing.json");
    let envelope: WeatherEnvelope = serde_json::from_str(text).expect("weather fixture");
    envelope.reports.into_iter().next().expect("one report")
}

#[test]
fn weather_card_in_daytime() {
    let report = weather_report();
    let now = Utc.with_ymd_and_hms(2016, 5, 11, 7, 52, 0).unwrap();

    let card = build_weather_card("beijing", &report, now).expect("card");

    assert!(card.is_day);
    assert_eq!(card.updated_text, "1 小时前");
    assert_eq!(card.weekday, "周三");
    assert_eq!((card.today_max.as_str(), card.today_min.as_str()), ("29", "16"));
    assert_eq!(card.current.icon_class, "wi wi-cloudy");
    assert_eq!(card.outlook[0].header, "今天白天");
    assert_eq!(card.outlook[0].icon_class, "wi wi-day-sunny");
    assert_eq!(card.outlook[1].header, "今天夜间");
    assert_eq!(card.outlook[1].icon_class, "wi wi-night-partly-cloudy");

    let times: Vec<&str> = card.hourly.iter().map(|h| h.time.as_str()).collect();
    assert_eq!(times, vec!["现在", "16:00", "19:00"]);
    assert_eq!(card.hourly[2].temp, "25");

    assert_eq!(card.daily.len(), 2);
    assert_eq!(card.daily[0].weekday, "周四");
    assert_eq!(card.daily[0].icon_class, "wi wi-day-rain");
    assert_eq!(card.daily[0].max, "24");
    assert_eq!(card.daily[1].icon_class, "wi wi-na");
}

#[test]
fn weather_card_at_night_looks_at_tomorrow() {
    let mut report = weather_report();
    report.basic.update.loc = chrono::NaiveDate::from_ymd_opt(2016, 5, 11)
        .unwrap()
        .and_hms_opt(21, 0, 0)
        .unwrap();

    let card = build_weather_card("beijing", &report, Utc::now()).expect("card");

    assert!(!card.is_day);
    assert_eq!(card.current.icon_class, "wi wi-cloudy");
    assert_eq!(card.outlook[0].header, "今天夜间");
    assert_eq!(card.outlook[1].header, "明天白天");
    assert_eq!(card.outlook[1].text, "小雨");
}

#[test]
fn weekday_follows_local_update_time() {
    let mut report = weather_report();
    let day = chrono::NaiveDate::from_ymd_opt(2016, 5, 12).unwrap();
    report.basic.update.loc = day.and_hms_opt(6, 30, 0).unwrap();
    report.basic.update.utc = chrono::NaiveDate::from_ymd_opt(2016, 5, 11)
        .unwrap()
        .and_hms_opt(22, 30, 0)
        .unwrap();

    let card = build_weather_card("beijing", &report, Utc::now()).expect("card");

    assert_eq!(card.weekday, "周四");
    assert_eq!(card.updated_at, Utc.with_ymd_and_hms(2016, 5, 11, 22, 30, 0).unwrap());
}

#[test]
fn weather_card_requires_a_daily_forecast() {
    let mut report = weather_report();
    report.daily_forecast.clear();
    assert!(build_weather_card("beijing", &report, Utc::now()).is_err());
}
