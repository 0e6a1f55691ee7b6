//! Integration tests: fetch from a mock provider, then normalize.

use chrono::NaiveDate;
use skycast_weather::{
    DataSource, ForecastView, LocationQuery, RetryConfig, WeatherClient, WeatherError,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn entry(dt_txt: &str, temp: f64, icon: &str) -> serde_json::Value {
    serde_json::json!({
        "dt_txt": dt_txt,
        "main": {"temp": temp, "humidity": 60},
        "weather": [{"main": "Clear", "description": "clear sky", "icon": icon}],
        "wind": {"speed": 2.5, "deg": 90}
    })
}

fn client_for(server: &MockServer) -> WeatherClient {
    WeatherClient::new("test_key")
        .unwrap()
        .with_base_url(&server.uri())
        .with_retry(RetryConfig::none())
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

#[tokio::test]
async fn test_forecast_to_view() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("q", "Tunis"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": [
                entry("2025-06-01 09:00:00", 20.0, "01d"),
                entry("2025-06-01 12:00:00", 26.0, "01d"),
                entry("2025-06-01 15:00:00", 24.0, "02d"),
                entry("2025-06-02 12:00:00", 18.0, "10d"),
                {"dt_txt": "2025-06-02 15:00:00"}
            ],
            "city": {"name": "Tunis", "country": "TN", "coord": {"lat": 36.8, "lon": 10.18}, "timezone": 3600}
        })))
        .mount(&mock_server)
        .await;

    let fetch = client_for(&mock_server)
        .forecast(&LocationQuery::City("Tunis".to_string()))
        .await
        .unwrap();
    assert_eq!(fetch.source, DataSource::Live);
    assert_eq!(fetch.samples.len(), 4);

    let view = ForecastView::build(&fetch, today(), None);
    assert_eq!(view.days.len(), 7);
    assert_eq!(view.selected_day, "2025-06-01");

    let first = &view.days[0];
    assert!(first.is_today);
    assert_eq!(first.average_temperature, Some(23));
    assert_eq!(first.dominant_icon_code.as_deref(), Some("01d"));

    assert_eq!(view.days[1].average_temperature, Some(18));
    assert!(!view.days[2].has_data);

    assert_eq!(view.hourly.len(), 24);
    assert_eq!(view.hourly[0].temperature_c, 20);
    assert_eq!(view.hourly[12].temperature_c, 26);
    assert_eq!(view.hourly[15].temperature_c, 24);
    // Late hours bracket into the next day's noon sample: 24 + (18 - 24) * 8/21
    assert_eq!(view.hourly[23].temperature_c, 22);
    // 2.5 m/s
    assert_eq!(view.hourly[12].wind_speed_kmh, 9);

    let tomorrow = view.select_day(&fetch, "2025-06-02");
    assert_eq!(tomorrow.hourly.len(), 24);
    assert_eq!(tomorrow.hourly[0].temperature_c, 21);
    assert!(tomorrow.hourly[12..].iter().all(|p| p.temperature_c == 18));
    assert_eq!(tomorrow.hourly[12].icon_code, "10d");
    assert_eq!(tomorrow.days, view.days);
}

#[tokio::test]
async fn test_unavailable_provider_falls_back_to_sample_forecast() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let fetch = client_for(&mock_server)
        .forecast_or_fallback(&LocationQuery::City("Tunis".to_string()), today())
        .await
        .unwrap();
    assert_eq!(fetch.source, DataSource::Sample);

    let view = ForecastView::build(&fetch, today(), None);
    assert!(view.has_hourly());
    assert_eq!(view.days.iter().filter(|d| d.has_data).count(), 5);
}

#[tokio::test]
async fn test_unknown_city_is_not_masked_by_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404",
            "message": "city not found"
        })))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server)
        .forecast_or_fallback(&LocationQuery::City("Atlantis".to_string()), today())
        .await;
    assert!(matches!(result, Err(WeatherError::LocationNotFound(_))));
}

#[tokio::test]
async fn test_empty_forecast_yields_empty_view() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"list": []})))
        .mount(&mock_server)
        .await;

    let fetch = client_for(&mock_server)
        .forecast(&LocationQuery::City("Tunis".to_string()))
        .await
        .unwrap();
    let view = ForecastView::build(&fetch, today(), None);

    assert!(!view.has_hourly());
    assert!(view.days.iter().all(|d| !d.has_data && d.average_temperature.is_none()));
}
