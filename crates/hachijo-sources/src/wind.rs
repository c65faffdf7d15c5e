//! Wind forecast for the island via the Open-Meteo forecast API.
//!
//! Single representative point (the town office), same horizon and
//! nearest-sample selection as the wave adapter.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use hachijo_core::geo::HACHIJO_TOWN_OFFICE;
use hachijo_core::{
    Envelope, EnvelopeParts, Horizon, NormalizedItem, SourceRef, WeatherItem, WeatherService,
};
use hachijo_fetch::FetchClient;

use crate::error::SourceError;
use crate::nearest::nearest_index;

const PRODUCTION_BASE_URL: &str = "https://api.open-meteo.com";
const DOCS_URL: &str = "https://open-meteo.com/en/docs";

const POINT_NAME: &str = "HACHIJO_CENTER";

#[derive(Debug, Clone, Default, Deserialize)]
struct ForecastHourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    windspeed_10m: Vec<f64>,
    #[serde(default)]
    windgusts_10m: Vec<f64>,
    #[serde(default)]
    winddirection_10m: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct WindEntry {
    horizon: Horizon,
    index: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wind_speed_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wind_gust_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wind_direction_deg: Option<f64>,
}

pub struct WindSource {
    client: FetchClient,
    base_url: String,
}

impl WindSource {
    #[must_use]
    pub fn new(client: FetchClient) -> Self {
        Self::with_base_url(client, PRODUCTION_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(client: FetchClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn sources(&self) -> Vec<SourceRef> {
        vec![SourceRef::new("Open-Meteo Forecast", DOCS_URL)]
    }

    /// Fetch and normalize; any error becomes a failure envelope.
    pub async fn run(&self) -> Envelope {
        match self.try_run().await {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(source = "wind", error = %err, "source run failed");
                Envelope::failure(self.sources(), err.to_string())
            }
        }
    }

    async fn try_run(&self) -> Result<Envelope, SourceError> {
        let url = format!(
            "{}/v1/forecast?latitude={}&longitude={}&hourly=windspeed_10m,windgusts_10m,winddirection_10m&timezone=Asia%2FTokyo",
            self.base_url, HACHIJO_TOWN_OFFICE.lat, HACHIJO_TOWN_OFFICE.lon
        );
        let fetched = self.client.fetch_json::<Value>(&url, &[]).await?;
        let hourly: ForecastHourly = fetched
            .data
            .get("hourly")
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or_default();

        let mut warnings = Vec::new();
        if hourly.time.is_empty() {
            warnings.push("hourly.time が空です".to_owned());
        }

        let now = Utc::now();
        let entries: Vec<WindEntry> = Horizon::ALL
            .iter()
            .map(|&horizon| {
                let target = now + Duration::hours(horizon.offset_hours());
                let index = nearest_index(&hourly.time, target);
                WindEntry {
                    horizon,
                    index: index.map_or(-1, |i| i as i64),
                    time: index.and_then(|i| hourly.time.get(i).cloned()),
                    wind_speed_ms: index.and_then(|i| hourly.windspeed_10m.get(i).copied()),
                    wind_gust_ms: index.and_then(|i| hourly.windgusts_10m.get(i).copied()),
                    wind_direction_deg: index
                        .and_then(|i| hourly.winddirection_10m.get(i).copied()),
                }
            })
            .collect();

        let normalized = entries
            .iter()
            .map(|entry| NormalizedItem::Weather(entry_to_item(entry)))
            .collect();

        Ok(Envelope::success(
            self.sources(),
            EnvelopeParts {
                raw: fetched.data,
                extracted: Some(json!(entries)),
                normalized,
                warnings,
            },
        ))
    }
}

fn entry_to_item(entry: &WindEntry) -> WeatherItem {
    let mut item = WeatherItem::new(WeatherService::WeatherWind, entry.horizon, DOCS_URL);
    item.point = Some(POINT_NAME.to_owned());
    item.wind_speed_ms = entry.wind_speed_ms;
    item.wind_gust_ms = entry.wind_gust_ms;
    item.wind_direction_deg = entry.wind_direction_deg;
    item.time = entry.time.clone();
    item
}
