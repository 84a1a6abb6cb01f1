// tests/config_env.rs
use digest_bot::config::{DigestConfig, ItemCount, Secrets};
use serial_test::serial;
use std::io::Write;

fn clear_secrets() {
    for k in ["TELEGRAM_BOT_TOKEN", "TELEGRAM_CHAT_ID", "GEMINI_API_KEY"] {
        std::env::remove_var(k);
    }
}

#[test]
#[serial]
fn loads_from_env_path() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        f,
        r#"
[sources]
feeds = ["https://a.test/feed", " https://a.test/feed "]
subreddits = []

[selection]
research = {{ at_most = 8 }}

[store]
path = "state/seen.json"
capacity = 50
"#
    )
    .unwrap();

    std::env::set_var("DIGEST_CONFIG_PATH", f.path());
    let cfg = DigestConfig::load_default().unwrap();
    std::env::remove_var("DIGEST_CONFIG_PATH");

    assert_eq!(cfg.sources.feeds, vec!["https://a.test/feed".to_string()]);
    assert!(cfg.sources.subreddits.is_empty());
    assert_eq!(cfg.selection.research, ItemCount::AtMost(8));
    assert_eq!(cfg.selection.news, ItemCount::Exactly(3));
    assert_eq!(cfg.store.capacity, 50);
    assert_eq!(cfg.store.path.to_str(), Some("state/seen.json"));
}

#[test]
#[serial]
fn missing_env_path_is_an_error() {
    std::env::set_var("DIGEST_CONFIG_PATH", "/definitely/not/here.toml");
    let res = DigestConfig::load_default();
    std::env::remove_var("DIGEST_CONFIG_PATH");
    assert!(res.is_err());
}

#[test]
#[serial]
fn secrets_require_all_three_vars() {
    clear_secrets();
    std::env::set_var("TELEGRAM_BOT_TOKEN", "123:abc");
    std::env::set_var("TELEGRAM_CHAT_ID", "42");
    let err = Secrets::from_env().unwrap_err();
    assert_eq!(err.to_string(), "Missing GEMINI_API_KEY env var");

    std::env::set_var("GEMINI_API_KEY", "  key  ");
    let s = Secrets::from_env().unwrap();
    assert_eq!(s.gemini_api_key, "key");
    let dbg = format!("{s:?}");
    assert!(!dbg.contains("123:abc"));
    clear_secrets();
}

#[test]
#[serial]
fn blank_secret_counts_as_missing() {
    clear_secrets();
    std::env::set_var("TELEGRAM_BOT_TOKEN", "   ");
    let err = Secrets::from_env().unwrap_err();
    assert_eq!(err.to_string(), "Missing TELEGRAM_BOT_TOKEN env var");
    clear_secrets();
}

#[test]
fn shipped_sample_config_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/digest.toml");
    let cfg = DigestConfig::load_from_file(path).unwrap();
    assert_eq!(cfg.selection.research, ItemCount::AtMost(5));
    assert_eq!(cfg.selection.news, ItemCount::Exactly(3));
    assert_eq!(cfg.sources.feeds.len(), 11, "feeds fall back to defaults");
}
