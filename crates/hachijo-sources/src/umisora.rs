//! うみそら便 Aogashima service status (HTML).
//!
//! The Tokyo islands access site lays its status table out as per-column
//! cell classes rather than row-major `<tr>` markup, and renders status as
//! an icon image. Rows are reassembled by index across the column lists,
//! and icon `alt`/`src` values are mapped back to status text.

use regex::Regex;
use scraper::{ElementRef, Html};
use serde::Serialize;
use serde_json::{json, Value};

use hachijo_core::{
    classify, Envelope, EnvelopeParts, NormalizedItem, SourceRef, StatusCode, StatusRule,
    TransportItem, TransportService,
};
use hachijo_fetch::FetchClient;

use crate::error::SourceError;
use crate::html::{element_text, has_ancestor_with_class, selector};

const PRODUCTION_BASE_URL: &str = "https://www.islandaccess.metro.tokyo.lg.jp";

const RULES: &[StatusRule] = &[
    StatusRule {
        code: StatusCode::Cancelled,
        keywords: &["欠航", "運休"],
    },
    StatusRule {
        code: StatusCode::OnTime,
        keywords: &["就航"],
    },
    StatusRule {
        code: StatusCode::Suspended,
        keywords: &["条件"],
    },
    StatusRule {
        code: StatusCode::OnTime,
        keywords: &["運航"],
    },
];

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct UmisoraRow {
    company: String,
    genre: String,
    flight: String,
    dep_time: String,
    dep_place: String,
    arr_time: String,
    arr_place: String,
    status: String,
    note: String,
}

pub struct UmisoraSource {
    client: FetchClient,
    base_url: String,
}

impl UmisoraSource {
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

    fn page_url(&self) -> String {
        format!("{}/traffic/aogashima/", self.base_url)
    }

    fn sources(&self) -> Vec<SourceRef> {
        vec![SourceRef::new("うみそら便 青ヶ島", self.page_url())]
    }

    /// Fetch and normalize; any error becomes a failure envelope.
    pub async fn run(&self) -> Envelope {
        match self.try_run().await {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(source = "umisora", error = %err, "source run failed");
                Envelope::failure(self.sources(), err.to_string())
            }
        }
    }

    async fn try_run(&self) -> Result<Envelope, SourceError> {
        let url = self.page_url();
        let fetched = self.client.fetch_text(&url, &[]).await?;
        let mut parts = extract(&fetched.body, &url);
        parts.raw = Value::String(fetched.body);
        Ok(Envelope::success(self.sources(), parts))
    }
}

fn extract(body: &str, source_url: &str) -> EnvelopeParts {
    let document = Html::parse_document(body);
    let mut warnings = Vec::new();

    let section_selector = selector(".info__detail#aogashima");
    let table_selector = selector(".info__detail-table");
    let tables: Vec<ElementRef<'_>> = document
        .select(&section_selector)
        .next()
        .map(|section| {
            section
                .select(&table_selector)
                // The -sp block duplicates the table for small screens.
                .filter(|table| !has_ancestor_with_class(*table, "info__detail-sp"))
                .collect()
        })
        .unwrap_or_default();
    if tables.is_empty() {
        warnings.push("運航状況テーブルが見つかりませんでした".to_owned());
    }

    let updated_at_regex =
        Regex::new(r"\d{4}年\d{1,2}月\d{1,2}日[^\n]{0,20}現在").expect("valid regex");
    let updated_at_text = updated_at_regex.find(body).map(|m| m.as_str().to_owned());

    let extracted_tables: Vec<Vec<UmisoraRow>> = tables.iter().map(|t| table_rows(*t)).collect();

    let filtered_rows: Vec<UmisoraRow> = extracted_tables
        .iter()
        .flatten()
        .filter(|row| {
            let places = format!("{} {}", row.dep_place, row.arr_place);
            places.contains("八丈島") && places.contains("青ヶ島")
        })
        .cloned()
        .collect();
    if filtered_rows.is_empty() {
        warnings.push("八丈島⇄青ヶ島の行が見つかりませんでした".to_owned());
    }

    let normalized = filtered_rows
        .iter()
        .map(|row| NormalizedItem::Transport(row_to_item(row, updated_at_text.as_deref(), source_url)))
        .collect();

    EnvelopeParts {
        raw: Value::Null,
        extracted: Some(json!({
            "updatedAtText": updated_at_text,
            "tables": extracted_tables
                .iter()
                .map(|rows| json!({ "rows": rows }))
                .collect::<Vec<Value>>(),
            "filteredRows": filtered_rows,
        })),
        normalized,
        warnings,
    }
}

/// Reassemble rows from the per-column cell lists. The row count follows
/// the longest data column; the note column may be shorter.
fn table_rows(table: ElementRef<'_>) -> Vec<UmisoraRow> {
    let company = column_cells(table, "info__detail-company");
    let genre = column_cells(table, "info__detail-genre");
    let flight = column_cells(table, "info__detail-fn");
    let dep_time = column_cells(table, "info__detail-departure");
    let dep_place = column_cells(table, "info__detail-to");
    let arr_time = column_cells(table, "info__detail-arrival");
    let arr_place = column_cells(table, "info__detail-from");
    let status = column_cells(table, "info__detail-status");
    let note = column_cells(table, "info__detail-info-remark");

    let row_count = [
        company.len(),
        genre.len(),
        flight.len(),
        dep_time.len(),
        dep_place.len(),
        arr_time.len(),
        arr_place.len(),
        status.len(),
    ]
    .into_iter()
    .max()
    .unwrap_or(0);

    (0..row_count)
        .map(|index| UmisoraRow {
            company: pick_text(&company, index),
            genre: pick_text(&genre, index),
            flight: pick_text(&flight, index),
            dep_time: pick_text(&dep_time, index),
            dep_place: pick_text(&dep_place, index),
            arr_time: pick_text(&arr_time, index),
            arr_place: pick_text(&arr_place, index),
            status: pick_status(&status, index),
            note: pick_text(&note, index),
        })
        .collect()
}

fn column_cells<'a>(table: ElementRef<'a>, class: &str) -> Vec<ElementRef<'a>> {
    let cell_selector = selector(&format!(".{class}:not(.th)"));
    table.select(&cell_selector).collect()
}

/// Cell text, falling back to the `alt` of an embedded image.
fn pick_text(cells: &[ElementRef<'_>], index: usize) -> String {
    let Some(cell) = cells.get(index) else {
        return String::new();
    };
    let text = element_text(*cell);
    if !text.is_empty() {
        return text;
    }
    img_attr(*cell, "alt").unwrap_or_default()
}

/// Status cell resolution: meaningful `alt` first, then the icon filename,
/// then plain text.
fn pick_status(cells: &[ElementRef<'_>], index: usize) -> String {
    let Some(cell) = cells.get(index) else {
        return String::new();
    };
    if let Some(alt) = img_attr(*cell, "alt") {
        if alt != "テキスト" {
            return alt;
        }
    }
    if let Some(src) = img_attr(*cell, "src") {
        if src.contains("icon_circle") {
            return "運航".to_owned();
        }
        if src.contains("icon_cross") {
            return "欠航・運休".to_owned();
        }
        if src.contains("icon_caution") {
            return "条件付".to_owned();
        }
    }
    element_text(*cell)
}

fn img_attr(cell: ElementRef<'_>, attr: &str) -> Option<String> {
    let img_selector = selector("img");
    let value = cell.select(&img_selector).next()?.value().attr(attr)?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

fn row_to_item(row: &UmisoraRow, updated_at: Option<&str>, source_url: &str) -> TransportItem {
    let title_parts: Vec<&str> = [&row.company, &row.genre, &row.flight]
        .into_iter()
        .map(String::as_str)
        .filter(|part| !part.is_empty())
        .collect();
    let title = if title_parts.is_empty() {
        "UMISORA".to_owned()
    } else {
        title_parts.join(" / ")
    };

    let status_text = (!row.status.is_empty()).then(|| row.status.clone());
    let port_parts: Vec<&str> = [&row.dep_place, &row.arr_place]
        .into_iter()
        .map(String::as_str)
        .filter(|part| !part.is_empty())
        .collect();

    let mut item = TransportItem::new(TransportService::UmisoraAogashima, title, source_url);
    item.status = Some(classify(status_text.as_deref(), RULES));
    item.status_text = status_text;
    item.dep_planned = (!row.dep_time.is_empty()).then(|| row.dep_time.clone());
    item.arr_planned = (!row.arr_time.is_empty()).then(|| row.arr_time.clone());
    item.port = (!port_parts.is_empty()).then(|| port_parts.join(" / "));
    item.note = if row.note.is_empty() {
        updated_at.map(str::to_owned)
    } else {
        Some(row.note.clone())
    };
    item
}
