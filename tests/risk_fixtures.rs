use citysense::risk::{RiskColor, SnowRisk, ThermalStatus, WeatherRisk};
use citysense::weather::open_meteo::parse_forecast;
use citysense::{CitySenseError, ForecastDocument, classify};
use rstest::rstest;

fn fixture(name: &str) -> &'static str {
    match name {
        "new_york_calm" => include_str!("fixtures/new_york_calm.json"),
        "arctic_wind" => include_str!("fixtures/arctic_wind.json"),
        "alpine_snow" => include_str!("fixtures/alpine_snow.json"),
        "coastal_fog" => include_str!("fixtures/coastal_fog.json"),
        "north_atlantic_storm" => include_str!("fixtures/north_atlantic_storm.json"),
        other => panic!("unknown fixture {other}"),
    }
}

fn forecast(name: &str, lat: f64, lon: f64) -> ForecastDocument {
    parse_forecast(fixture(name), lat, lon).unwrap()
}

#[test]
fn test_calm_new_york_forecast() {
    let report = classify(&forecast("new_york_calm", 40.7128, -74.0060)).unwrap();

    assert_eq!(report.location.latitude, 40.7128);
    assert_eq!(report.location.longitude, -74.0060);
    assert_eq!(report.location.timezone.as_deref(), Some("America/New_York"));

    assert_eq!(report.statistics.avg_max_temperature_14d, 20.79);
    assert_eq!(report.statistics.min_temperature_14d, 9.0);
    assert_eq!(report.statistics.max_temperature_14d, 22.0);

    assert_eq!(report.human_feeling_index.status, ThermalStatus::Comfortable);
    assert_eq!(report.human_feeling_index.status_color, RiskColor::Green);
    assert_eq!(report.snow_analysis.risk_level, SnowRisk::Low);
    assert_eq!(report.snow_analysis.risk_color, RiskColor::Green);
    assert_eq!(report.weather_risk.risk_level, WeatherRisk::Normal);
    assert_eq!(report.weather_risk.risk_color, RiskColor::Green);
}

#[rstest]
#[case("new_york_calm", ThermalStatus::Comfortable, SnowRisk::Low, WeatherRisk::Normal)]
#[case("arctic_wind", ThermalStatus::ExtremeFreeze, SnowRisk::Low, WeatherRisk::Normal)]
#[case("alpine_snow", ThermalStatus::Freezing, SnowRisk::High, WeatherRisk::Normal)]
#[case("coastal_fog", ThermalStatus::Comfortable, SnowRisk::Low, WeatherRisk::Dangerous)]
#[case(
    "north_atlantic_storm",
    ThermalStatus::Comfortable,
    SnowRisk::Low,
    WeatherRisk::Extreme
)]
fn test_fixture_levels(
    #[case] name: &str,
    #[case] thermal: ThermalStatus,
    #[case] snow: SnowRisk,
    #[case] weather: WeatherRisk,
) {
    let report = classify(&forecast(name, 1.0, 2.0)).unwrap();
    assert_eq!(report.human_feeling_index.status, thermal);
    assert_eq!(report.snow_analysis.risk_level, snow);
    assert_eq!(report.weather_risk.risk_level, weather);
}

#[test]
fn test_arctic_wind_converts_speed() {
    let report = classify(&forecast("arctic_wind", 78.22, 15.65)).unwrap();
    let feeling = &report.human_feeling_index;
    assert_eq!(feeling.apparent_temperature, -15.0);
    assert_eq!(feeling.wind_speed_kmh, 30.0);
    assert_eq!(feeling.wind_speed_ms, 8.33);
    assert_eq!(feeling.status_color, RiskColor::Red);
    // 500 m is above the 400 m threshold
    assert_eq!(report.snow_analysis.freezing_level_min_m, 500.0);
}

#[test]
fn test_alpine_snow_totals() {
    let report = classify(&forecast("alpine_snow", 46.02, 7.75)).unwrap();
    let snow = &report.snow_analysis;
    assert_eq!(snow.total_snow_cm, 25.0);
    assert_eq!(snow.total_snow_mm, 250.0);
    assert_eq!(snow.max_snow_depth_cm, 5.0);
    assert_eq!(snow.risk_color, RiskColor::Red);
    assert_eq!(report.human_feeling_index.status_color, RiskColor::Orange);
}

#[test]
fn test_coastal_fog_visibility() {
    let report = classify(&forecast("coastal_fog", 50.37, -4.14)).unwrap();
    assert_eq!(report.weather_risk.min_visibility_m, 500.0);
    assert_eq!(report.weather_risk.max_wind_gusts_kmh, 40.0);
    assert_eq!(report.weather_risk.risk_color, RiskColor::Orange);
}

#[test]
fn test_storm_gusts_in_metres_per_second() {
    let report = classify(&forecast("north_atlantic_storm", 62.0, -6.79)).unwrap();
    let risk = &report.weather_risk;
    assert_eq!(risk.max_wind_gusts_kmh, 72.5);
    assert_eq!(risk.max_wind_gusts_ms, 20.14);
    assert_eq!(risk.min_pressure_hpa, 990.0);
    assert_eq!(risk.risk_color, RiskColor::Red);
}

#[test]
fn test_classification_is_deterministic() {
    let document = forecast("coastal_fog", 50.37, -4.14);
    assert_eq!(classify(&document).unwrap(), classify(&document).unwrap());
}

#[test]
fn test_report_json_sections() {
    let report = classify(&forecast("alpine_snow", 46.02, 7.75)).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["humanFeelingIndex"]["status"], "FREEZING");
    assert_eq!(json["snowAnalysis"]["risk_level"], "HIGH");
    assert_eq!(json["snowAnalysis"]["risk_color"], "RED");
    assert_eq!(json["weatherRiskEngine"]["risk_level"], "NORMAL");
    assert_eq!(json["location"]["timezone"], "Europe/Zurich");
}

#[test]
fn test_empty_temperature_series_is_incomplete() {
    let mut document = forecast("new_york_calm", 40.7128, -74.0060);
    document.daily.temperature_max.clear();

    let err = classify(&document).unwrap_err();
    assert!(matches!(err, CitySenseError::DataIncomplete { .. }));
}

#[test]
fn test_null_hourly_value_is_incomplete() {
    let mut document = forecast("coastal_fog", 50.37, -4.14);
    document.hourly.visibility[3] = None;

    match classify(&document).unwrap_err() {
        CitySenseError::DataIncomplete { field } => assert_eq!(field, "hourly.visibility[3]"),
        other => panic!("unexpected error: {other}"),
    }
}
