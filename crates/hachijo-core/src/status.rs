//! Operational-status taxonomy shared by all source adapters.
//!
//! Free-text status strings from the upstream sources are classified into a
//! closed [`StatusCode`] set via ordered keyword tables. Each source keeps
//! its own vocabulary (one ferry operator writes 欠航, another also uses
//! 運休), so the rule tables live next to the adapters and only the matching
//! machinery is shared.

use serde::{Deserialize, Serialize};

use crate::envelope::NormalizedItem;

/// Closed set of operational status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    OnTime,
    Delayed,
    Cancelled,
    Suspended,
    Open,
    Closed,
    Unknown,
}

/// One classification rule: any keyword hit yields `code`.
///
/// Rules are checked in table order and the first hit wins. Cancellation
/// rules are listed first in every source table: a status string carrying
/// both a delay keyword and a cancellation keyword is a cancellation.
#[derive(Debug, Clone, Copy)]
pub struct StatusRule {
    pub code: StatusCode,
    pub keywords: &'static [&'static str],
}

/// Classify free text against an ordered rule table.
///
/// Matching is case-insensitive substring containment. `None` or no match
/// yields [`StatusCode::Unknown`].
#[must_use]
pub fn classify(text: Option<&str>, rules: &[StatusRule]) -> StatusCode {
    let Some(text) = text else {
        return StatusCode::Unknown;
    };
    let lower = text.to_lowercase();
    for rule in rules {
        if rule.keywords.iter().any(|kw| lower.contains(kw)) {
            return rule.code;
        }
    }
    StatusCode::Unknown
}

/// Display tone for a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTone {
    Ok,
    Warn,
    Bad,
    Muted,
}

/// Status code plus its display label and tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusMeta {
    pub code: StatusCode,
    pub label: &'static str,
    pub tone: StatusTone,
}

/// Severity order used by [`pick_primary_status`]: most severe first.
const STATUS_PRIORITY: [StatusCode; 7] = [
    StatusCode::Cancelled,
    StatusCode::Suspended,
    StatusCode::Delayed,
    StatusCode::Unknown,
    StatusCode::OnTime,
    StatusCode::Open,
    StatusCode::Closed,
];

/// Select the single most severe status across `codes`.
///
/// Empty input yields `UNKNOWN` with the muted tone.
#[must_use]
pub fn pick_primary_status(codes: &[StatusCode]) -> StatusMeta {
    let code = STATUS_PRIORITY
        .into_iter()
        .find(|candidate| codes.contains(candidate))
        .unwrap_or(StatusCode::Unknown);
    status_meta(code)
}

/// [`pick_primary_status`] over a normalized item list: items without a
/// status (weather items, plain-note items) are ignored.
#[must_use]
pub fn primary_status_of_items(items: &[NormalizedItem]) -> StatusMeta {
    let codes: Vec<StatusCode> = items.iter().filter_map(NormalizedItem::status_code).collect();
    pick_primary_status(&codes)
}

fn status_meta(code: StatusCode) -> StatusMeta {
    let (label, tone) = match code {
        StatusCode::Cancelled => ("欠航", StatusTone::Bad),
        StatusCode::Suspended => ("条件付き", StatusTone::Warn),
        StatusCode::Delayed => ("遅延", StatusTone::Warn),
        StatusCode::OnTime => ("運航", StatusTone::Ok),
        StatusCode::Open => ("営業中", StatusTone::Ok),
        StatusCode::Closed => ("休業", StatusTone::Bad),
        StatusCode::Unknown => ("情報なし", StatusTone::Muted),
    };
    StatusMeta { code, label, tone }
}
