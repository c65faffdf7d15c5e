//! Typhoon advisories from the JMA disaster-information Atom feed (XML).
//!
//! The feed carries every advisory category; only entries whose title
//! mentions a typhoon are kept. Parsing walks the Atom events with
//! `quick-xml` rather than deserializing the whole feed.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use serde_json::{json, Value};

use hachijo_core::{
    Envelope, EnvelopeParts, Horizon, NormalizedItem, SourceRef, WeatherItem, WeatherService,
};
use hachijo_fetch::FetchClient;

use crate::error::SourceError;

const PRODUCTION_FEED_URL: &str = "https://www.data.jma.go.jp/developer/xml/feed/extra.xml";

#[derive(Debug, Clone, Default, Serialize)]
struct FeedEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<String>,
}

impl FeedEntry {
    fn is_typhoon(&self) -> bool {
        self.title.as_deref().is_some_and(|title| {
            title.contains("台風") || title.to_lowercase().contains("typhoon")
        })
    }
}

struct Feed {
    updated: Option<String>,
    entries: Vec<FeedEntry>,
}

pub struct TyphoonSource {
    client: FetchClient,
    feed_url: String,
}

impl TyphoonSource {
    #[must_use]
    pub fn new(client: FetchClient) -> Self {
        Self::with_feed_url(client, PRODUCTION_FEED_URL)
    }

    #[must_use]
    pub fn with_feed_url(client: FetchClient, feed_url: impl Into<String>) -> Self {
        Self {
            client,
            feed_url: feed_url.into(),
        }
    }

    fn sources(&self) -> Vec<SourceRef> {
        vec![SourceRef::new("気象庁 防災情報XML", self.feed_url.clone())]
    }

    /// Fetch and normalize; any error becomes a failure envelope.
    pub async fn run(&self) -> Envelope {
        match self.try_run().await {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(source = "typhoon", error = %err, "source run failed");
                Envelope::failure(self.sources(), err.to_string())
            }
        }
    }

    async fn try_run(&self) -> Result<Envelope, SourceError> {
        let fetched = self.client.fetch_text(&self.feed_url, &[]).await?;
        let feed = parse_feed(&fetched.body)?;

        let typhoon_entries: Vec<FeedEntry> =
            feed.entries.into_iter().filter(FeedEntry::is_typhoon).collect();

        let mut warnings = Vec::new();
        if typhoon_entries.is_empty() {
            warnings.push("台風情報が見つかりませんでした".to_owned());
        }

        let normalized = typhoon_entries
            .iter()
            .map(|entry| NormalizedItem::Weather(entry_to_item(entry, &self.feed_url)))
            .collect();

        Ok(Envelope::success(
            self.sources(),
            EnvelopeParts {
                raw: Value::String(fetched.body),
                extracted: Some(json!({
                    "feedUpdated": feed.updated,
                    "entries": typhoon_entries,
                })),
                normalized,
                warnings,
            },
        ))
    }
}

fn entry_to_item(entry: &FeedEntry, feed_url: &str) -> WeatherItem {
    let source_url = entry.link.as_deref().unwrap_or(feed_url);
    let mut item = WeatherItem::new(WeatherService::WeatherTyphoon, Horizon::Today, source_url);
    item.typhoon_name = entry.title.clone();
    item.time = entry.updated.clone();
    item.note = entry.id.clone();
    item
}

fn parse_feed(xml: &str) -> Result<Feed, SourceError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut feed_updated: Option<String> = None;
    let mut entries = Vec::new();
    let mut current: Option<FeedEntry> = None;
    // Tag the next text event lands in, while inside an entry.
    let mut field: Option<&'static str> = None;

    loop {
        match reader.read_event()? {
            Event::Start(el) => match el.name().as_ref() {
                b"entry" => current = Some(FeedEntry::default()),
                b"title" if current.is_some() => field = Some("title"),
                b"id" if current.is_some() => field = Some("id"),
                b"updated" => {
                    if current.is_some() {
                        field = Some("updated");
                    } else {
                        field = Some("feed_updated");
                    }
                }
                b"link" => {
                    if let Some(entry) = current.as_mut() {
                        if let Some(href) = link_href(&el)? {
                            entry.link = Some(href);
                        }
                    }
                }
                _ => field = None,
            },
            Event::Empty(el) => {
                if el.name().as_ref() == b"link" {
                    if let Some(entry) = current.as_mut() {
                        if let Some(href) = link_href(&el)? {
                            entry.link = Some(href);
                        }
                    }
                }
            }
            Event::Text(text) => {
                let value = text.unescape().map_err(quick_xml::Error::from)?.into_owned();
                match (field, current.as_mut()) {
                    (Some("title"), Some(entry)) => entry.title = Some(value),
                    (Some("id"), Some(entry)) => entry.id = Some(value),
                    (Some("updated"), Some(entry)) => entry.updated = Some(value),
                    (Some("feed_updated"), None) => {
                        if feed_updated.is_none() {
                            feed_updated = Some(value);
                        }
                    }
                    _ => {}
                }
            }
            Event::End(el) => {
                if el.name().as_ref() == b"entry" {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(Feed {
        updated: feed_updated,
        entries,
    })
}

fn link_href(el: &quick_xml::events::BytesStart<'_>) -> Result<Option<String>, SourceError> {
    for attr in el.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == b"href" {
            return Ok(Some(attr.unescape_value().map_err(quick_xml::Error::from)?.into_owned()));
        }
    }
    Ok(None)
}
