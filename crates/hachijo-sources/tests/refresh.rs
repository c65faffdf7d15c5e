//! End-to-end refresh: adapters against mock upstreams, persisted through
//! a file-backed store.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hachijo_fetch::FetchClient;
use hachijo_sources::{
    refresh_all_with, SourceKey, TokaikisenSource, WaveSource, WindSource,
};
use hachijo_store::{ReportStore, StoreConfig};

fn file_store(dir: &std::path::Path) -> ReportStore {
    ReportStore::new(StoreConfig {
        url: None,
        api_key: None,
        table: "status_reports".to_owned(),
        fallback_dir: dir.to_path_buf(),
    })
    .expect("store")
}

#[tokio::test]
async fn batch_refresh_isolates_failures_and_saves_everything() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/schedule/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div id="Hachijojima"><table class="stable">
                <tr><th>出航時刻</th><th>発地</th><th>運航状況</th></tr>
                <tr><td>09:40</td><td>八丈島</td><td>欠航</td></tr>
            </table></div>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/marine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hourly": {
                "time": ["2000-01-01T00:00"],
                "wave_height": [1.5],
                "wave_period": [8.0],
                "swell_wave_direction": [180.0]
            }
        })))
        .mount(&server)
        .await;
    // The wind upstream is down this cycle.
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let store = file_store(dir.path());
    let base = server.uri();

    let keys = [SourceKey::Tokaikisen, SourceKey::Wave, SourceKey::Wind];
    let results = refresh_all_with(&store, &keys, |key| {
        let base = base.clone();
        async move {
            let client = FetchClient::new().expect("client");
            match key {
                SourceKey::Tokaikisen => TokaikisenSource::with_base_url(client, base).run().await,
                SourceKey::Wave => WaveSource::with_base_url(client, base).run().await,
                SourceKey::Wind => WindSource::with_base_url(client, base).run().await,
                other => panic!("unexpected key: {other}"),
            }
        }
    })
    .await;

    assert_eq!(results.len(), 3);
    assert!(results["tokaikisen"].fetch_ok);
    assert!(results["wave"].fetch_ok);
    assert!(!results["wind"].fetch_ok);
    assert!(results["wind"].error.as_deref().is_some_and(|e| e.contains("503")));
    for outcome in results.values() {
        assert!(outcome.save_ok);
        assert!(outcome.fetched_at.is_some());
    }

    // The failure envelope is persisted too, so readers can see the
    // failed run.
    let records = store
        .read_many(&[
            "tokaikisen".to_owned(),
            "wave".to_owned(),
            "wind".to_owned(),
        ])
        .await
        .expect("read");
    assert_eq!(records.len(), 3);
    assert!(records["tokaikisen"].payload.ok);
    assert!(!records["wind"].payload.ok);
    assert!(records["wind"].payload.invariants_hold());
}

#[tokio::test]
async fn cancelled_ferry_run_round_trips_through_the_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/schedule/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div id="Hachijojima"><table class="stable">
                <tr><th>出航時刻</th><th>運航状況</th></tr>
                <tr><td>09:40</td><td>欠航</td></tr>
            </table></div>"#,
        ))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let store = file_store(dir.path());
    let base = server.uri();

    let results = refresh_all_with(&store, &[SourceKey::Tokaikisen], |_| {
        let base = base.clone();
        async move {
            let client = FetchClient::new().expect("client");
            TokaikisenSource::with_base_url(client, base).run().await
        }
    })
    .await;
    assert!(results["tokaikisen"].fetch_ok);

    let records = store
        .read_many(&["tokaikisen".to_owned()])
        .await
        .expect("read");
    let payload = &records["tokaikisen"].payload;
    let items = payload.normalized.as_ref().expect("normalized");
    let meta = hachijo_core::primary_status_of_items(items);
    assert_eq!(meta.code, hachijo_core::StatusCode::Cancelled);
    assert_eq!(meta.label, "欠航");
}
