//! Normalized transport items (ferries, flights, business hours).

use serde::{Deserialize, Serialize};

use crate::status::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportService {
    Ana,
    Tokaikisen,
    UmisoraAogashima,
    BusinessHours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Outbound,
    Inbound,
}

/// One normalized transport row.
///
/// Immutable value object: built once per fetch cycle, then placed into an
/// envelope and never touched again. Wire names are camelCase to match the
/// stored envelope JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportItem {
    pub service: TransportService,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    pub title: String,
    /// Absent for informational rows (e.g. the weekly business-hours line)
    /// so they never skew the primary-status pick.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dep_planned: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arr_planned: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dep_estimated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arr_estimated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub source_urls: Vec<String>,
}

impl TransportItem {
    /// Baseline item with only the required fields set.
    #[must_use]
    pub fn new(service: TransportService, title: impl Into<String>, source_url: &str) -> Self {
        Self {
            service,
            direction: None,
            title: title.into(),
            status: None,
            status_text: None,
            dep_planned: None,
            arr_planned: None,
            dep_estimated: None,
            arr_estimated: None,
            delay_minutes: None,
            port: None,
            note: None,
            source_urls: vec![source_url.to_owned()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case_and_skips_none() {
        let mut item = TransportItem::new(
            TransportService::Tokaikisen,
            "さるびあ丸",
            "https://example.com/schedule",
        );
        item.status = Some(StatusCode::Cancelled);
        item.status_text = Some("欠航".to_owned());
        item.dep_planned = Some("09:40".to_owned());

        let json = serde_json::to_value(&item).expect("serialize");
        assert_eq!(json["service"], "TOKAIKISEN");
        assert_eq!(json["status"], "CANCELLED");
        assert_eq!(json["depPlanned"], "09:40");
        assert!(json.get("arrPlanned").is_none());
        assert!(json.get("delayMinutes").is_none());
    }

    #[test]
    fn deserializes_stored_shape() {
        let json = serde_json::json!({
            "service": "ANA",
            "direction": "OUTBOUND",
            "title": "ANA1891",
            "status": "DELAYED",
            "delayMinutes": 25.0,
            "sourceUrls": ["https://api.example.com/departures"]
        });
        let item: TransportItem = serde_json::from_value(json).expect("deserialize");
        assert_eq!(item.service, TransportService::Ana);
        assert_eq!(item.direction, Some(Direction::Outbound));
        assert_eq!(item.delay_minutes, Some(25.0));
    }
}
