//! ANA Hachijojima flights via the ODPT flight-information API (JSON).
//!
//! Departures and arrivals are two separate endpoints, fetched
//! concurrently and filtered to the island route's fixed flight numbers.
//! ODPT items are loosely shaped, so field access goes through ordered
//! candidate-key tables rather than a fixed struct.

use futures::future::try_join;
use serde_json::{json, Value};

use hachijo_core::{
    classify, Direction, Envelope, EnvelopeParts, NormalizedItem, SourceRef, StatusCode,
    StatusRule, TransportItem, TransportService,
};
use hachijo_fetch::FetchClient;

use crate::error::SourceError;
use crate::fields::{pick_num, pick_str};

const PRODUCTION_BASE_URL: &str = "https://api.odpt.org";

const DEPARTURE_PATH: &str =
    "/api/v4/odpt:FlightInformationDeparture?odpt:operator=odpt.Operator:ANA&acl:consumerKey=";
const ARRIVAL_PATH: &str =
    "/api/v4/odpt:FlightInformationArrival?odpt:operator=odpt.Operator:ANA&acl:consumerKey=";

const TARGET_DEPARTURES: &[&str] = &["ANA1891", "ANA1893", "ANA1895"];
const TARGET_ARRIVALS: &[&str] = &["ANA1892", "ANA1894", "ANA1896"];

const FLIGHT_NUMBER_KEYS: &[&str] = &[
    "odpt:flightNumber",
    "odpt:flightNumberText",
    "odpt:flightNumberName",
];
const STATUS_KEYS: &[&str] = &["odpt:flightStatus", "odpt:flightStatusText", "odpt:status"];

const RULES: &[StatusRule] = &[
    StatusRule {
        code: StatusCode::Cancelled,
        keywords: &["cancel"],
    },
    StatusRule {
        code: StatusCode::Delayed,
        keywords: &["delay"],
    },
    StatusRule {
        code: StatusCode::Suspended,
        keywords: &["suspend"],
    },
    StatusRule {
        code: StatusCode::OnTime,
        keywords: &["on_time", "on-time"],
    },
];

pub struct AnaSource {
    client: FetchClient,
    base_url: String,
    consumer_key: Option<String>,
}

impl AnaSource {
    #[must_use]
    pub fn new(client: FetchClient, consumer_key: Option<String>) -> Self {
        Self::with_base_url(client, PRODUCTION_BASE_URL, consumer_key)
    }

    #[must_use]
    pub fn with_base_url(
        client: FetchClient,
        base_url: impl Into<String>,
        consumer_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            consumer_key,
        }
    }

    /// Cited URLs never carry the real key.
    fn sources(&self) -> Vec<SourceRef> {
        vec![
            SourceRef::new(
                "ODPT 出発",
                format!("{}{}YOUR_KEY", self.base_url, DEPARTURE_PATH),
            ),
            SourceRef::new(
                "ODPT 到着",
                format!("{}{}YOUR_KEY", self.base_url, ARRIVAL_PATH),
            ),
        ]
    }

    /// Fetch and normalize; any error becomes a failure envelope.
    pub async fn run(&self) -> Envelope {
        match self.try_run().await {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(source = "ana", error = %err, "source run failed");
                Envelope::failure(self.sources(), err.to_string())
            }
        }
    }

    async fn try_run(&self) -> Result<Envelope, SourceError> {
        let key = self
            .consumer_key
            .as_deref()
            .ok_or(SourceError::MissingConfig("ODPT_CONSUMER_KEY"))?;

        let departure_url = format!("{}{}{}", self.base_url, DEPARTURE_PATH, key);
        let arrival_url = format!("{}{}{}", self.base_url, ARRIVAL_PATH, key);

        // One sub-fetch failure fails the whole run.
        let (departures, arrivals) = try_join(
            self.client.fetch_json::<Vec<Value>>(&departure_url, &[]),
            self.client.fetch_json::<Vec<Value>>(&arrival_url, &[]),
        )
        .await?;

        let target_departures = filter_flights(&departures.data, TARGET_DEPARTURES);
        let target_arrivals = filter_flights(&arrivals.data, TARGET_ARRIVALS);

        let mut warnings = Vec::new();
        if target_departures.is_empty() {
            warnings.push("No target departures found".to_owned());
        }
        if target_arrivals.is_empty() {
            warnings.push("No target arrivals found".to_owned());
        }

        let normalized = target_departures
            .iter()
            .map(|item| normalize_item(item, Direction::Outbound, &departure_url))
            .chain(
                target_arrivals
                    .iter()
                    .map(|item| normalize_item(item, Direction::Inbound, &arrival_url)),
            )
            .map(NormalizedItem::Transport)
            .collect();

        Ok(Envelope::success(
            self.sources(),
            EnvelopeParts {
                raw: json!({
                    "departures": departures.data,
                    "arrivals": arrivals.data,
                }),
                extracted: Some(json!({
                    "departures": target_departures,
                    "arrivals": target_arrivals,
                })),
                normalized,
                warnings,
            },
        ))
    }
}

fn filter_flights(items: &[Value], targets: &[&str]) -> Vec<Value> {
    items
        .iter()
        .filter(|item| {
            pick_str(item, FLIGHT_NUMBER_KEYS)
                .is_some_and(|number| targets.contains(&number.as_str()))
        })
        .cloned()
        .collect()
}

fn normalize_item(item: &Value, direction: Direction, source_url: &str) -> TransportItem {
    let title = pick_str(item, FLIGHT_NUMBER_KEYS)
        .or_else(|| pick_str(item, &["@id", "dc:title"]))
        .unwrap_or_else(|| "UNKNOWN".to_owned());
    let status_text = pick_str(item, STATUS_KEYS);

    let mut out = TransportItem::new(TransportService::Ana, title, source_url);
    out.direction = Some(direction);
    out.status = Some(classify(status_text.as_deref(), RULES));
    out.status_text = status_text;
    out.dep_planned = pick_str(
        item,
        &["odpt:scheduledDepartureTime", "odpt:scheduledDepartureTimeText"],
    );
    out.arr_planned = pick_str(
        item,
        &["odpt:scheduledArrivalTime", "odpt:scheduledArrivalTimeText"],
    );
    out.dep_estimated = pick_str(
        item,
        &["odpt:estimatedDepartureTime", "odpt:estimatedDepartureTimeText"],
    );
    out.arr_estimated = pick_str(
        item,
        &["odpt:estimatedArrivalTime", "odpt:estimatedArrivalTimeText"],
    );
    out.delay_minutes = pick_num(item, &["odpt:delay", "odpt:delayMinutes"]);
    out.note = pick_str(item, &["odpt:note", "odpt:remarks", "odpt:remark"]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn departure_payload() -> Value {
        json!([
            {
                "odpt:flightNumber": "ANA1891",
                "odpt:flightStatus": "odpt.FlightStatus:Delayed",
                "odpt:scheduledDepartureTime": "07:30",
                "odpt:estimatedDepartureTime": "07:55",
                "odpt:delay": 25.0
            },
            {
                "odpt:flightNumber": "ANA0021",
                "odpt:flightStatus": "odpt.FlightStatus:OnTime"
            }
        ])
    }

    fn arrival_payload() -> Value {
        json!([
            {
                "odpt:flightNumberText": "ANA1892",
                "odpt:flightStatusText": "Cancelled",
                "odpt:scheduledArrivalTime": "09:25",
                "odpt:note": "機材繰りのため"
            }
        ])
    }

    async fn mock_odpt(server: &MockServer, endpoint: &str, payload: Value, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/api/v4/{endpoint}")))
            .and(query_param("acl:consumerKey", "test-key"))
            .respond_with(ResponseTemplate::new(status).set_body_json(payload))
            .mount(server)
            .await;
    }

    fn source(server: &MockServer, key: Option<&str>) -> AnaSource {
        let client = FetchClient::new().expect("client");
        AnaSource::with_base_url(client, server.uri(), key.map(str::to_owned))
    }

    #[tokio::test]
    async fn filters_to_island_flights_and_classifies() {
        let server = MockServer::start().await;
        mock_odpt(&server, "odpt:FlightInformationDeparture", departure_payload(), 200).await;
        mock_odpt(&server, "odpt:FlightInformationArrival", arrival_payload(), 200).await;

        let envelope = source(&server, Some("test-key")).run().await;
        assert!(envelope.ok, "expected success: {:?}", envelope.error);
        assert!(envelope.warnings.is_none());

        let items = envelope.normalized.expect("normalized items");
        assert_eq!(items.len(), 2);

        let NormalizedItem::Transport(dep) = &items[0] else {
            panic!("expected transport item");
        };
        assert_eq!(dep.title, "ANA1891");
        assert_eq!(dep.direction, Some(Direction::Outbound));
        assert_eq!(dep.status, Some(StatusCode::Delayed));
        assert_eq!(dep.delay_minutes, Some(25.0));
        assert_eq!(dep.dep_estimated.as_deref(), Some("07:55"));

        let NormalizedItem::Transport(arr) = &items[1] else {
            panic!("expected transport item");
        };
        assert_eq!(arr.title, "ANA1892");
        assert_eq!(arr.direction, Some(Direction::Inbound));
        assert_eq!(arr.status, Some(StatusCode::Cancelled));
        assert_eq!(arr.note.as_deref(), Some("機材繰りのため"));
    }

    #[tokio::test]
    async fn source_urls_never_carry_the_key() {
        let server = MockServer::start().await;
        mock_odpt(&server, "odpt:FlightInformationDeparture", json!([]), 200).await;
        mock_odpt(&server, "odpt:FlightInformationArrival", json!([]), 200).await;

        let envelope = source(&server, Some("test-key")).run().await;
        for source_ref in &envelope.sources {
            assert!(source_ref.url.ends_with("YOUR_KEY"), "url: {}", source_ref.url);
            assert!(!source_ref.url.contains("test-key"));
        }
    }

    #[tokio::test]
    async fn empty_filter_results_warn() {
        let server = MockServer::start().await;
        mock_odpt(&server, "odpt:FlightInformationDeparture", json!([]), 200).await;
        mock_odpt(&server, "odpt:FlightInformationArrival", json!([]), 200).await;

        let envelope = source(&server, Some("test-key")).run().await;
        assert!(envelope.ok);
        let warnings = envelope.warnings.expect("warnings");
        assert_eq!(
            warnings,
            vec![
                "No target departures found".to_owned(),
                "No target arrivals found".to_owned()
            ]
        );
    }

    #[tokio::test]
    async fn missing_key_is_a_structured_failure() {
        let server = MockServer::start().await;
        let envelope = source(&server, None).run().await;
        assert!(!envelope.ok);
        assert!(envelope.invariants_hold());
        assert_eq!(
            envelope.error.expect("error").message,
            "ODPT_CONSUMER_KEY is not set"
        );
    }

    #[tokio::test]
    async fn one_failing_endpoint_fails_the_run() {
        let server = MockServer::start().await;
        mock_odpt(&server, "odpt:FlightInformationDeparture", departure_payload(), 200).await;
        mock_odpt(&server, "odpt:FlightInformationArrival", json!([]), 502).await;

        let envelope = source(&server, Some("test-key")).run().await;
        assert!(!envelope.ok);
        let message = envelope.error.expect("error").message;
        assert!(message.contains("502"), "message: {message}");
    }
}
