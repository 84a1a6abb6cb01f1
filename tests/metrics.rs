// tests/metrics.rs
use chrono::{TimeZone, Utc};
use digest_bot::config::SourcesConfig;
use digest_bot::ingest::providers::rss::RssFeedProvider;
use digest_bot::ingest::recency::filter_recent;
use digest_bot::ingest::run_once;
use digest_bot::ingest::types::SourceProvider;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

const TECH_XML: &str = include_str!("fixtures/tech_rss.xml");

fn counter_value(recorder: &DebuggingRecorder, name: &str) -> Option<u64> {
    recorder
        .snapshotter()
        .snapshot()
        .into_vec()
        .into_iter()
        .find(|(key, _, _, _)| key.key().name() == name)
        .and_then(|(_, _, _, v)| match v {
            DebugValue::Counter(c) => Some(c),
            _ => None,
        })
}

#[test]
fn ingest_counters_are_recorded() {
    let recorder = DebuggingRecorder::new();
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let cfg = SourcesConfig::default();
    let providers: Vec<Box<dyn SourceProvider>> = vec![
        Box::new(RssFeedProvider::from_fixture("https://techcrunch.test/feed/", TECH_XML, &cfg)),
        Box::new(RssFeedProvider::from_fixture("https://broken.test/feed", "<rss><channel><item></channel>", &cfg)),
    ];
    let now = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap();

    metrics::with_local_recorder(&recorder, || {
        let items = rt.block_on(run_once(&providers));
        let _ = filter_recent(items, now, 24);
    });

    assert_eq!(counter_value(&recorder, "digest_items_fetched_total"), Some(3));
    assert_eq!(counter_value(&recorder, "digest_provider_errors_total"), Some(1));
    assert_eq!(counter_value(&recorder, "digest_items_stale_total"), Some(1));
}
