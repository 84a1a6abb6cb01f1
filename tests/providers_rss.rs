use digest_bot::config::SourcesConfig;
use digest_bot::ingest::providers::feed::UNKNOWN_SOURCE;
use digest_bot::ingest::providers::rss::RssFeedProvider;
use digest_bot::ingest::types::{Category, SourceProvider};

const TECH_XML: &str = include_str!("fixtures/tech_rss.xml");
const RESEARCH_XML: &str = include_str!("fixtures/research_atom.xml");

#[tokio::test]
async fn rss_fixture_maps_items() {
    let cfg = SourcesConfig::default();
    let p = RssFeedProvider::from_fixture("https://techcrunch.test/feed/", TECH_XML, &cfg);

    let items = p.fetch_latest().await.expect("rss parse ok");
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|i| i.source == "TechCrunch"));
    assert!(items.iter().all(|i| i.category == Category::News));
    assert_eq!(
        items[0].summary,
        "The new model is cheaper and twice as fast on coding benchmarks."
    );
    assert_eq!(items[1].summary, "Funding led by a16z & friends.");
    assert_eq!(items[2].title, "Last week's gadget roundup");
}

#[tokio::test]
async fn atom_fixture_from_research_feed_is_research() {
    let cfg = SourcesConfig::default();
    let p = RssFeedProvider::from_fixture("https://research.google.test/blog/atom.xml", RESEARCH_XML, &cfg);
    assert_eq!(p.category(), Category::Research);

    let items = p.fetch_latest().await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].source, "Google Research Blog");
    assert_eq!(items[0].url, "https://research.google.test/blog/sparse-moe/");
    assert_eq!(items[1].summary, "Mamba-style layers revisited.");
}

#[tokio::test]
async fn per_feed_limit_applies() {
    let cfg = SourcesConfig {
        per_feed_limit: 2,
        ..SourcesConfig::default()
    };
    let p = RssFeedProvider::from_fixture("https://techcrunch.test/feed/", TECH_XML, &cfg);
    assert_eq!(p.fetch_latest().await.unwrap().len(), 2);
}

#[tokio::test]
async fn untitled_feed_uses_unknown_source() {
    let xml = r#"<rss><channel><item><title>x</title><link>https://x.test/1</link></item></channel></rss>"#;
    let p = RssFeedProvider::from_fixture("https://x.test/feed", xml, &SourcesConfig::default());
    let items = p.fetch_latest().await.unwrap();
    assert_eq!(items[0].source, UNKNOWN_SOURCE);
}

#[tokio::test]
async fn http_feed_is_fetched_and_parsed() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("GET", "/feed/")
        .with_status(200)
        .with_header("content-type", "application/rss+xml")
        .with_body(TECH_XML)
        .create_async()
        .await;

    let cfg = SourcesConfig::default();
    let url = format!("{}/feed/", server.url());
    let p = RssFeedProvider::from_url(&url, &cfg, reqwest::Client::new());
    let items = p.fetch_latest().await.unwrap();

    m.assert_async().await;
    assert_eq!(items.len(), 3);
    assert_eq!(p.name(), url);
}

#[tokio::test]
async fn http_error_status_is_provider_error() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/feed/")
        .with_status(503)
        .create_async()
        .await;

    let url = format!("{}/feed/", server.url());
    let p = RssFeedProvider::from_url(&url, &SourcesConfig::default(), reqwest::Client::new());
    let err = p.fetch_latest().await.unwrap_err();
    assert!(err.to_string().contains("503"), "{err}");
}
