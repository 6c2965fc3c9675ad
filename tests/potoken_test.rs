//! Integration tests for the PO Token cache, generator and provider
//!
//! Run with: cargo test --test potoken_test

mod common;

use chrono::Duration;
use pretty_assertions::assert_eq;
use std::sync::Arc;

use common::{token_doc, token_doc_for, unreachable, ManualClock, QueuedProbe};
use tiktube::potoken::{PoTokenCache, PoTokenGenerator, PoTokenProvider};

fn cache_path(dir: &tempfile::TempDir) -> std::path::PathBuf {
    dir.path().join("storage").join("po_token_cache.json")
}

#[tokio::test]
async fn test_cache_generate_expire_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new_year_2024();
    let mut cache = PoTokenCache::with_clock(cache_path(&dir), clock.clone());
    let generator = PoTokenGenerator::new(QueuedProbe::new(vec![token_doc("tok1")]));

    assert_eq!(cache.get_token("android"), None);

    let generated = generator.generate("android").await;
    assert_eq!(generated.as_deref(), Some("tok1"));

    cache.set_token_with_ttl("android", "tok1", 3);
    assert_eq!(cache.get_token("android").as_deref(), Some("tok1"));

    clock.advance(Duration::days(4));
    assert_eq!(cache.get_token("android"), None);
}

#[tokio::test]
async fn test_provider_regenerates_after_expiry() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new_year_2024();
    let probe = QueuedProbe::new(vec![token_doc("tok1"), token_doc("tok2")]);
    let provider = PoTokenProvider::new(
        PoTokenCache::with_clock(cache_path(&dir), clock.clone()),
        PoTokenGenerator::new(probe.clone()),
    );

    assert_eq!(provider.token_for("android").await, "tok1");
    clock.advance(Duration::days(2));
    assert_eq!(provider.token_for("android").await, "tok1");
    assert_eq!(probe.calls(), 1);

    clock.advance(Duration::days(2));
    assert_eq!(provider.token_for("android").await, "tok2");
    assert_eq!(probe.calls(), 2);
}

#[tokio::test]
async fn test_provider_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new_year_2024();

    {
        let provider = PoTokenProvider::new(
            PoTokenCache::with_clock(cache_path(&dir), clock.clone()),
            PoTokenGenerator::new(QueuedProbe::new(vec![token_doc("persisted")])),
        );
        assert_eq!(provider.token_for("android").await, "persisted");
    }

    let probe = QueuedProbe::new(vec![]);
    let provider = PoTokenProvider::new(
        PoTokenCache::with_clock(cache_path(&dir), clock.clone()),
        PoTokenGenerator::new(probe.clone()),
    );
    assert_eq!(provider.token_for("android").await, "persisted");
    assert_eq!(probe.calls(), 0);
}

#[tokio::test]
async fn test_unreachable_probe_degrades_to_empty_token() {
    let dir = tempfile::tempdir().unwrap();
    let probe = QueuedProbe::new(vec![unreachable(), unreachable(), unreachable()]);
    let provider = PoTokenProvider::new(
        PoTokenCache::with_clock(cache_path(&dir), ManualClock::new_year_2024()),
        PoTokenGenerator::new(probe.clone()),
    );

    for _ in 0..3 {
        assert_eq!(provider.token_for("android").await, "");
    }
    assert_eq!(provider.consecutive_failures(), 3);
    assert!(!cache_path(&dir).exists(), "nothing should be persisted on failure");
}

#[tokio::test]
async fn test_recovery_after_failures() {
    let dir = tempfile::tempdir().unwrap();
    let probe = QueuedProbe::new(vec![unreachable(), token_doc_for("ios", "late")]);
    let provider = PoTokenProvider::new(
        PoTokenCache::with_clock(cache_path(&dir), ManualClock::new_year_2024()),
        PoTokenGenerator::new(probe),
    );

    assert_eq!(provider.token_for("ios").await, "");
    assert_eq!(provider.token_for("ios").await, "late");
    assert_eq!(provider.consecutive_failures(), 0);

    let entries = provider.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0.client, "ios");
    assert!(entries[0].1);
}

#[tokio::test]
async fn test_corrupt_store_is_replaced_on_first_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = cache_path(&dir);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"\x00\x01garbage").unwrap();

    let provider = PoTokenProvider::new(
        PoTokenCache::with_clock(&path, ManualClock::new_year_2024()),
        PoTokenGenerator::new(QueuedProbe::new(vec![token_doc("fresh")])),
    );
    assert_eq!(provider.token_for("android").await, "fresh");

    let doc: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc["android"]["token"], "fresh");
    assert_eq!(doc["android"]["expires_at"], "2024-01-04T00:00:00");
}

#[tokio::test]
async fn test_concurrent_misses_leave_single_entry() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(PoTokenProvider::new(
        PoTokenCache::with_clock(cache_path(&dir), ManualClock::new_year_2024()),
        PoTokenGenerator::new(QueuedProbe::new(vec![token_doc("a"), token_doc("b")])),
    ));

    let (first, second) = tokio::join!(provider.token_for("android"), provider.token_for("android"));

    assert!(!first.is_empty() && !second.is_empty());
    let entries = provider.entries().await;
    assert_eq!(entries.len(), 1);
    assert!(entries[0].0.token == "a" || entries[0].0.token == "b");
}

#[tokio::test]
async fn test_token_for_other_client_is_not_borrowed() {
    let dir = tempfile::tempdir().unwrap();
    let provider = PoTokenProvider::new(
        PoTokenCache::with_clock(cache_path(&dir), ManualClock::new_year_2024()),
        PoTokenGenerator::new(QueuedProbe::new(vec![token_doc("android-only")])),
    );

    assert_eq!(provider.token_for("ios").await, "");
    assert!(provider.entries().await.is_empty());
}
