//! Store opening hours via the Google Places details API (JSON).
//!
//! Emits up to three rows: today's hours (with an OPEN/CLOSED status from
//! `openNow`), the regular weekly hours, and a special-hours note when the
//! current schedule differs from the regular one. "Today" is resolved in
//! JST, the timezone the weekday descriptions are written for.

use chrono::{Datelike, FixedOffset, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use hachijo_core::{
    Envelope, EnvelopeParts, NormalizedItem, SourceRef, StatusCode, TransportItem,
    TransportService,
};
use hachijo_fetch::FetchClient;

use crate::error::SourceError;

const PRODUCTION_BASE_URL: &str = "https://places.googleapis.com";
const PLACE_ID: &str = "ChIJRZf7Z0H1FzUR0r3rVd7YH6c";
const FIELD_MASK: &str = "id,displayName,currentOpeningHours,regularOpeningHours";

const MAPS_URL: &str = "https://maps.app.goo.gl/z3mKL3S91tcQUxRM9";
const DOCS_URL: &str =
    "https://developers.google.com/maps/documentation/places/web-service/place-details";

const WEEKDAYS_JA: [&str; 7] = [
    "日曜日", "月曜日", "火曜日", "水曜日", "木曜日", "金曜日", "土曜日",
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpeningHours {
    open_now: Option<bool>,
    weekday_descriptions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceResponse {
    current_opening_hours: Option<OpeningHours>,
    regular_opening_hours: Option<OpeningHours>,
}

pub struct BusinessHoursSource {
    client: FetchClient,
    base_url: String,
    api_key: Option<String>,
}

impl BusinessHoursSource {
    #[must_use]
    pub fn new(client: FetchClient, api_key: Option<String>) -> Self {
        Self::with_base_url(client, PRODUCTION_BASE_URL, api_key)
    }

    #[must_use]
    pub fn with_base_url(
        client: FetchClient,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn sources(&self) -> Vec<SourceRef> {
        vec![
            SourceRef::new("Googleマップ 八丈ストア", MAPS_URL),
            SourceRef::new("Places API Place Details", DOCS_URL),
        ]
    }

    /// Fetch and normalize; any error becomes a failure envelope.
    pub async fn run(&self) -> Envelope {
        match self.try_run().await {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(source = "business-hours", error = %err, "source run failed");
                Envelope::failure(self.sources(), err.to_string())
            }
        }
    }

    async fn try_run(&self) -> Result<Envelope, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingConfig("GOOGLE_MAPS_API_KEY"))?;

        let url = format!("{}/v1/places/{}?languageCode=ja", self.base_url, PLACE_ID);
        let fetched = self
            .client
            .fetch_json::<Value>(
                &url,
                &[("X-Goog-Api-Key", api_key), ("X-Goog-FieldMask", FIELD_MASK)],
            )
            .await?;
        let place: PlaceResponse =
            serde_json::from_value(fetched.data.clone()).unwrap_or_default();

        let current = place.current_opening_hours.unwrap_or_default();
        let regular = place.regular_opening_hours.unwrap_or_default();

        let today_line = find_today_hours(
            current
                .weekday_descriptions
                .as_deref()
                .or(regular.weekday_descriptions.as_deref()),
        );
        let weekday_descriptions = regular.weekday_descriptions.clone().unwrap_or_default();

        let special_note = match (&current.weekday_descriptions, &regular.weekday_descriptions) {
            (Some(current_desc), Some(regular_desc)) if current_desc != regular_desc => {
                Some("本日は特別営業時間の可能性があります")
            }
            (Some(_), None) => Some("特別営業時間情報が提供されています"),
            _ => None,
        };

        let mut normalized = Vec::new();

        let mut today = TransportItem::new(TransportService::BusinessHours, "本日の営業時間", MAPS_URL);
        today.status = Some(match current.open_now {
            Some(true) => StatusCode::Open,
            Some(false) => StatusCode::Closed,
            None => StatusCode::Unknown,
        });
        today.note = Some(today_line.clone().unwrap_or_else(|| "UNKNOWN".to_owned()));
        normalized.push(NormalizedItem::Transport(today));

        if !weekday_descriptions.is_empty() {
            let mut weekly =
                TransportItem::new(TransportService::BusinessHours, "通常営業時間", MAPS_URL);
            weekly.note = Some(weekday_descriptions.join(" / "));
            normalized.push(NormalizedItem::Transport(weekly));
        }

        if let Some(note) = special_note {
            let mut special =
                TransportItem::new(TransportService::BusinessHours, "特別営業時間", MAPS_URL);
            special.note = Some(note.to_owned());
            normalized.push(NormalizedItem::Transport(special));
        }

        Ok(Envelope::success(
            self.sources(),
            EnvelopeParts {
                raw: fetched.data,
                extracted: Some(json!({
                    "todayLine": today_line,
                    "openNow": current.open_now,
                    "weekdayDescriptions": weekday_descriptions,
                    "specialNote": special_note,
                })),
                normalized,
                warnings: Vec::new(),
            },
        ))
    }
}

/// Today's line from the weekday descriptions, matched by JST weekday
/// prefix.
fn find_today_hours(weekday_descriptions: Option<&[String]>) -> Option<String> {
    let descriptions = weekday_descriptions?;
    let jst = FixedOffset::east_opt(9 * 3600).expect("valid JST offset");
    let weekday = Utc::now().with_timezone(&jst).weekday();
    let today_label = WEEKDAYS_JA[weekday.num_days_from_sunday() as usize];
    descriptions
        .iter()
        .find(|line| line.starts_with(today_label))
        .cloned()
}
