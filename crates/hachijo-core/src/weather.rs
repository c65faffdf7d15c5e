//! Normalized weather items (wave, wind, typhoon advisories).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherService {
    WeatherWave,
    WeatherWind,
    WeatherTyphoon,
}

/// Named forecast offset from the fetch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Horizon {
    #[serde(rename = "TODAY")]
    Today,
    #[serde(rename = "PLUS_24H")]
    Plus24h,
    #[serde(rename = "PLUS_72H")]
    Plus72h,
    #[serde(rename = "PLUS_7D")]
    Plus7d,
}

impl Horizon {
    /// Offset in hours from "now" to this horizon's target time.
    #[must_use]
    pub fn offset_hours(self) -> i64 {
        match self {
            Horizon::Today => 0,
            Horizon::Plus24h => 24,
            Horizon::Plus72h => 72,
            Horizon::Plus7d => 168,
        }
    }

    pub const ALL: [Horizon; 4] = [
        Horizon::Today,
        Horizon::Plus24h,
        Horizon::Plus72h,
        Horizon::Plus7d,
    ];
}

/// One normalized weather reading or advisory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherItem {
    pub service: WeatherService,
    pub horizon: Horizon,
    /// Port tag for wave readings (底土 / 八重根).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    /// Point tag for wind readings (e.g. `HACHIJO_CENTER`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wave_height_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wave_period_s: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swell_direction_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_gust_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_direction_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typhoon_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typhoon_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typhoon_distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub source_urls: Vec<String>,
}

impl WeatherItem {
    /// Baseline item with only the required fields set.
    #[must_use]
    pub fn new(service: WeatherService, horizon: Horizon, source_url: &str) -> Self {
        Self {
            service,
            horizon,
            port: None,
            point: None,
            wave_height_m: None,
            wave_period_s: None,
            swell_direction_deg: None,
            wind_speed_ms: None,
            wind_gust_ms: None,
            wind_direction_deg: None,
            typhoon_id: None,
            typhoon_name: None,
            typhoon_distance_km: None,
            time: None,
            note: None,
            source_urls: vec![source_url.to_owned()],
        }
    }
}
