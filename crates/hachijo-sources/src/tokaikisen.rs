//! Tokai Kisen ferry schedule (HTML).
//!
//! The operator publishes per-route schedule tables; only the 八丈島
//! section is relevant here. Column meaning is recovered from the header
//! row by keyword, so minor header rewording survives without code changes.

use scraper::{ElementRef, Html};
use serde_json::{json, Value};

use hachijo_core::{
    classify, Envelope, EnvelopeParts, NormalizedItem, SourceRef, StatusCode, StatusRule,
    TransportItem, TransportService,
};
use hachijo_fetch::FetchClient;

use crate::error::SourceError;
use crate::html::{ancestor_with_class, cell_at, column_index, element_text, selector};

const PRODUCTION_BASE_URL: &str = "https://www.tokaikisen.co.jp";

const RULES: &[StatusRule] = &[
    StatusRule {
        code: StatusCode::Cancelled,
        keywords: &["欠航"],
    },
    StatusRule {
        code: StatusCode::OnTime,
        keywords: &["就航"],
    },
    StatusRule {
        code: StatusCode::Suspended,
        keywords: &["条件"],
    },
];

pub struct TokaikisenSource {
    client: FetchClient,
    base_url: String,
}

impl TokaikisenSource {
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

    fn schedule_url(&self) -> String {
        format!("{}/schedule/", self.base_url)
    }

    fn timetable_url(&self) -> String {
        format!("{}/boarding/timetable/", self.base_url)
    }

    fn sources(&self) -> Vec<SourceRef> {
        vec![
            SourceRef::new("東海汽船 運航状況", self.schedule_url()),
            SourceRef::new("東海汽船 時刻表", self.timetable_url()),
        ]
    }

    /// Fetch and normalize; any error becomes a failure envelope.
    pub async fn run(&self) -> Envelope {
        match self.try_run().await {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(source = "tokaikisen", error = %err, "source run failed");
                Envelope::failure(self.sources(), err.to_string())
            }
        }
    }

    async fn try_run(&self) -> Result<Envelope, SourceError> {
        let url = self.schedule_url();
        let fetched = self.client.fetch_text(&url, &[]).await?;
        let source_urls = vec![self.schedule_url(), self.timetable_url()];
        let mut parts = extract(&fetched.body, &source_urls);
        parts.raw = Value::String(fetched.body);
        Ok(Envelope::success(self.sources(), parts))
    }
}

fn extract(body: &str, source_urls: &[String]) -> EnvelopeParts {
    let document = Html::parse_document(body);
    let mut warnings = Vec::new();

    let section_selector = selector("#Hachijojima");
    let section = document.select(&section_selector).next();
    if section.is_none() {
        warnings.push("八丈島発着セクションが見つかりませんでした".to_owned());
    }

    let table_selector = selector("table.stable");
    let tables: Vec<ElementRef<'_>> = match section {
        Some(section) => section.select(&table_selector).collect(),
        // Without the section anchor, scan the whole page.
        None => document.select(&table_selector).collect(),
    };
    if tables.is_empty() {
        warnings.push("運航状況テーブルが見つかりませんでした".to_owned());
    }

    let mut extracted_tables = Vec::new();
    let mut normalized = Vec::new();
    for table in tables {
        let title = table_title(table);
        let (headers, rows) = table_cells(table);
        for row in &rows {
            if let Some(item) = row_to_item(title.as_deref(), &headers, row, source_urls) {
                normalized.push(NormalizedItem::Transport(item));
            }
        }
        extracted_tables.push(json!({
            "title": title,
            "headers": headers,
            "rows": rows,
        }));
    }

    if normalized.is_empty() && warnings.is_empty() {
        warnings.push("運航状況テーブルが空です".to_owned());
    }

    EnvelopeParts {
        raw: Value::Null,
        extracted: Some(json!({
            "sectionFound": section.is_some(),
            "tables": extracted_tables,
        })),
        normalized,
        warnings,
    }
}

/// Heading text of the enclosing `.scheduleTable` block, typically the
/// sailing date.
fn table_title(table: ElementRef<'_>) -> Option<String> {
    let wrapper = ancestor_with_class(table, "scheduleTable")?;
    let heading_selector = selector("h2, h3, h4");
    let heading = wrapper.select(&heading_selector).next()?;
    let text = element_text(heading);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Header texts (row 0) and body rows as cell-text matrices.
fn table_cells(table: ElementRef<'_>) -> (Vec<String>, Vec<Vec<String>>) {
    let row_selector = selector("tr");
    let cell_selector = selector("th, td");
    let mut rows = table.select(&row_selector).map(|row| {
        row.select(&cell_selector)
            .map(element_text)
            .collect::<Vec<String>>()
    });
    let headers = rows.next().unwrap_or_default();
    let body: Vec<Vec<String>> = rows.filter(|cells| !cells.is_empty()).collect();
    (headers, body)
}

fn row_to_item(
    table_title: Option<&str>,
    headers: &[String],
    cells: &[String],
    source_urls: &[String],
) -> Option<TransportItem> {
    if cells.iter().all(String::is_empty) {
        return None;
    }

    let dep_time = cell_at(cells, column_index(headers, &["出航"]));
    let dep_port = cell_at(cells, column_index(headers, &["発地", "発", "行き先"]));
    let ship = cell_at(cells, column_index(headers, &["船種", "船"]));
    let arr_port = cell_at(
        cells,
        column_index(headers, &["到着港", "到着地", "到着", "着", "出帆港"]),
    );
    let status_text = cell_at(cells, column_index(headers, &["運航", "状況"]));
    let note = cell_at(cells, column_index(headers, &["備考", "注意"]));

    let title_parts: Vec<&str> = [table_title, dep_port.as_deref(), ship.as_deref(), arr_port.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    let title = if title_parts.is_empty() {
        "東海汽船".to_owned()
    } else {
        title_parts.join(" / ")
    };

    let mut item = TransportItem::new(TransportService::Tokaikisen, title, &source_urls[0]);
    item.source_urls = source_urls.to_vec();
    item.status = Some(classify(status_text.as_deref(), RULES));
    item.status_text = status_text;
    item.dep_planned = dep_time;
    // The stored contract carries the arrival port when the table has one.
    item.port = arr_port.or(dep_port);
    item.note = note;
    Some(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SCHEDULE_HTML: &str = r#"
        <html><body>
        <div id="Hachijojima">
          <div class="scheduleTable">
            <h3>10月2日（水）</h3>
            <table class="stable">
              <tr><th>出航時刻</th><th>発地</th><th>船種</th><th>到着港</th><th>運航状況</th><th>備考</th></tr>
              <tr><td>22:30</td><td>東京</td><td>橘丸</td><td>八丈島</td><td>就航</td><td></td></tr>
              <tr><td>09:40</td><td>八丈島</td><td>橘丸</td><td>東京</td><td>欠航</td><td>低気圧接近のため</td></tr>
            </table>
          </div>
        </div>
        </body></html>"#;

    async fn serve(body: &str, status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/schedule/"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn normalizes_schedule_rows() {
        let server = serve(SCHEDULE_HTML, 200).await;
        let client = FetchClient::new().expect("client");
        let source = TokaikisenSource::with_base_url(client, server.uri());

        let envelope = source.run().await;
        assert!(envelope.ok, "expected success: {:?}", envelope.error);
        assert!(envelope.invariants_hold());
        assert!(envelope.warnings.is_none());

        let items = envelope.normalized.expect("normalized items");
        assert_eq!(items.len(), 2);
        let NormalizedItem::Transport(first) = &items[0] else {
            panic!("expected transport item");
        };
        assert_eq!(first.service, TransportService::Tokaikisen);
        assert_eq!(first.status, Some(StatusCode::OnTime));
        assert_eq!(first.dep_planned.as_deref(), Some("22:30"));
        assert_eq!(first.port.as_deref(), Some("八丈島"));
        assert_eq!(first.title, "10月2日（水） / 東京 / 橘丸 / 八丈島");
        assert_eq!(first.source_urls.len(), 2);

        let NormalizedItem::Transport(second) = &items[1] else {
            panic!("expected transport item");
        };
        assert_eq!(second.status, Some(StatusCode::Cancelled));
        assert_eq!(second.note.as_deref(), Some("低気圧接近のため"));
    }

    #[tokio::test]
    async fn port_falls_back_to_departure_without_an_arrival_column() {
        let html = r#"
            <div id="Hachijojima">
              <table class="stable">
                <tr><th>出航時刻</th><th>発地</th><th>運航状況</th></tr>
                <tr><td>09:40</td><td>八丈島</td><td>就航</td></tr>
              </table>
            </div>"#;
        let server = serve(html, 200).await;
        let client = FetchClient::new().expect("client");
        let source = TokaikisenSource::with_base_url(client, server.uri());

        let envelope = source.run().await;
        let items = envelope.normalized.expect("normalized items");
        let NormalizedItem::Transport(item) = &items[0] else {
            panic!("expected transport item");
        };
        assert_eq!(item.port.as_deref(), Some("八丈島"));
    }

    #[tokio::test]
    async fn missing_section_is_a_warning_not_a_failure() {
        let server = serve("<html><body><p>メンテナンス中</p></body></html>", 200).await;
        let client = FetchClient::new().expect("client");
        let source = TokaikisenSource::with_base_url(client, server.uri());

        let envelope = source.run().await;
        assert!(envelope.ok);
        let warnings = envelope.warnings.expect("warnings");
        assert!(warnings.contains(&"八丈島発着セクションが見つかりませんでした".to_owned()));
        assert!(warnings.contains(&"運航状況テーブルが見つかりませんでした".to_owned()));
        assert_eq!(envelope.normalized.as_deref(), Some(&[][..]));
    }

    #[tokio::test]
    async fn empty_table_is_a_warning() {
        let html = r#"
            <div id="Hachijojima">
              <table class="stable">
                <tr><th>出航時刻</th><th>運航状況</th></tr>
              </table>
            </div>"#;
        let server = serve(html, 200).await;
        let client = FetchClient::new().expect("client");
        let source = TokaikisenSource::with_base_url(client, server.uri());

        let envelope = source.run().await;
        assert!(envelope.ok);
        assert_eq!(
            envelope.warnings.as_deref(),
            Some(&["運航状況テーブルが空です".to_owned()][..])
        );
    }

    #[tokio::test]
    async fn upstream_error_yields_failure_envelope() {
        let server = serve("", 503).await;
        let client = FetchClient::new().expect("client");
        let source = TokaikisenSource::with_base_url(client, server.uri());

        let envelope = source.run().await;
        assert!(!envelope.ok);
        assert!(envelope.invariants_hold());
        assert_eq!(envelope.sources.len(), 2);
        let message = envelope.error.expect("error").message;
        assert!(message.contains("503"), "message: {message}");
    }
}
