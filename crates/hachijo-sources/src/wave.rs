//! Wave forecast for the two ferry ports via the Open-Meteo Marine API.
//!
//! One forecast per port (底土 and 八重根), fetched concurrently. For each
//! horizon the hourly sample nearest the target time is selected. The
//! forecast points are nearby open-water representatives, so every run
//! carries a fixed caveat warning.

use chrono::{Duration, Utc};
use futures::future::try_join;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use hachijo_core::geo::{GeoPoint, SOKODO_BEACH, YAENE_PORT};
use hachijo_core::{
    Envelope, EnvelopeParts, Horizon, NormalizedItem, SourceRef, WeatherItem, WeatherService,
};
use hachijo_fetch::FetchClient;

use crate::error::SourceError;
use crate::nearest::nearest_index;

const PRODUCTION_BASE_URL: &str = "https://marine-api.open-meteo.com";
const DOCS_URL: &str = "https://open-meteo.com/en/docs/marine-weather-api";

const REPRESENTATIVE_POINT_WARNING: &str = "港ピンポイント観測ではなく近傍代表地点を使用";

#[derive(Debug, Clone, Default, Deserialize)]
struct MarineHourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    wave_height: Vec<f64>,
    #[serde(default)]
    wave_period: Vec<f64>,
    #[serde(default)]
    swell_wave_direction: Vec<f64>,
}

/// One horizon pick for one port, kept in `extracted` for diagnostics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct WaveEntry {
    horizon: Horizon,
    port: &'static str,
    index: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wave_height_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wave_period_s: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    swell_direction_deg: Option<f64>,
}

pub struct WaveSource {
    client: FetchClient,
    base_url: String,
}

impl WaveSource {
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
        vec![SourceRef::new("Open-Meteo Marine", DOCS_URL)]
    }

    /// Fetch and normalize; any error becomes a failure envelope.
    pub async fn run(&self) -> Envelope {
        match self.try_run().await {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(source = "wave", error = %err, "source run failed");
                Envelope::failure(self.sources(), err.to_string())
            }
        }
    }

    async fn try_run(&self) -> Result<Envelope, SourceError> {
        let (sokodo, yaene) = try_join(
            self.fetch_port("底土", SOKODO_BEACH),
            self.fetch_port("八重根", YAENE_PORT),
        )
        .await?;

        let normalized = sokodo
            .entries
            .iter()
            .chain(yaene.entries.iter())
            .map(|entry| NormalizedItem::Weather(entry_to_item(entry)))
            .collect();

        Ok(Envelope::success(
            self.sources(),
            EnvelopeParts {
                raw: json!({ "sokodo": sokodo.raw, "yaene": yaene.raw }),
                extracted: Some(json!({
                    "sokodo": sokodo.entries,
                    "yaene": yaene.entries,
                })),
                normalized,
                warnings: vec![REPRESENTATIVE_POINT_WARNING.to_owned()],
            },
        ))
    }

    async fn fetch_port(
        &self,
        port: &'static str,
        point: GeoPoint,
    ) -> Result<PortForecast, SourceError> {
        let url = format!(
            "{}/v1/marine?latitude={}&longitude={}&hourly=wave_height,wave_period,swell_wave_direction&timezone=Asia%2FTokyo",
            self.base_url, point.lat, point.lon
        );
        let fetched = self.client.fetch_json::<Value>(&url, &[]).await?;
        let hourly: MarineHourly = fetched
            .data
            .get("hourly")
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or_default();

        let now = Utc::now();
        let entries = Horizon::ALL
            .iter()
            .map(|&horizon| {
                let target = now + Duration::hours(horizon.offset_hours());
                let index = nearest_index(&hourly.time, target);
                WaveEntry {
                    horizon,
                    port,
                    index: index.map_or(-1, |i| i as i64),
                    time: index.and_then(|i| hourly.time.get(i).cloned()),
                    wave_height_m: index.and_then(|i| hourly.wave_height.get(i).copied()),
                    wave_period_s: index.and_then(|i| hourly.wave_period.get(i).copied()),
                    swell_direction_deg: index
                        .and_then(|i| hourly.swell_wave_direction.get(i).copied()),
                }
            })
            .collect();

        Ok(PortForecast {
            raw: fetched.data,
            entries,
        })
    }
}

struct PortForecast {
    raw: Value,
    entries: Vec<WaveEntry>,
}

fn entry_to_item(entry: &WaveEntry) -> WeatherItem {
    let mut item = WeatherItem::new(WeatherService::WeatherWave, entry.horizon, DOCS_URL);
    item.port = Some(entry.port.to_owned());
    item.wave_height_m = entry.wave_height_m;
    item.wave_period_s = entry.wave_period_s;
    item.swell_direction_deg = entry.swell_direction_deg;
    item.time = entry.time.clone();
    item
}
