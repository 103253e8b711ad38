//! Contract Test: State Model & Idempotency
//!
//! Each engine is a fresh process in production; these tests simulate
//! consecutive scheduled runs against the same on-disk cache.
//!
//! Constraints verified:
//! - The cache is written after a successful update and read back exactly
//! - A second run with an unchanged IP performs zero provider calls
//! - An IP change between runs triggers a new update

mod common;

use common::*;
use dodns_core::traits::StateStore;
use dodns_core::{DdnsEngine, FileStateStore, RunOutcome, SqliteStateStore};
use std::net::Ipv4Addr;
use std::path::Path;
use tempfile::tempdir;

fn sqlite_engine(db: &Path, ip: Ipv4Addr, provider: &MockDnsProvider) -> DdnsEngine {
    DdnsEngine::new(
        Box::new(FixedIpSource::new(ip)),
        Box::new(provider.clone()),
        Box::new(SqliteStateStore::new(db)),
        minimal_config(&["example.com"]),
    )
    .expect("engine construction succeeds")
}

#[tokio::test]
async fn second_run_with_same_ip_makes_no_remote_writes() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("last_ip.db");
    let ip = Ipv4Addr::new(192, 168, 1, 1);
    let provider = MockDnsProvider::new().with_domain("example.com", mixed_records("9.9.9.9"));

    // First run
    let outcome = sqlite_engine(&db, ip, &provider).run_once().await.unwrap();
    assert_eq!(outcome.records_updated(), 1);
    let calls_after_first = provider.total_calls();

    // Second run, fresh engine and store on the same file
    let outcome = sqlite_engine(&db, ip, &provider).run_once().await.unwrap();
    assert_eq!(outcome, RunOutcome::Unchanged { current_ip: ip });
    assert_eq!(
        provider.total_calls(),
        calls_after_first,
        "Second run should not contact the provider"
    );
    assert_eq!(provider.writes().len(), 1);
}

#[tokio::test]
async fn cache_round_trips_the_propagated_ip() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("last_ip.db");
    let ip = Ipv4Addr::new(1, 2, 3, 4);
    let provider = MockDnsProvider::new().with_domain("example.com", mixed_records("9.9.9.9"));

    sqlite_engine(&db, ip, &provider).run_once().await.unwrap();

    let store = SqliteStateStore::new(&db);
    assert_eq!(store.read().await.unwrap(), Some(ip));
}

#[tokio::test]
async fn ip_change_after_restart_triggers_update() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("last_ip.db");
    let initial_ip = Ipv4Addr::new(192, 168, 1, 1);
    let new_ip = Ipv4Addr::new(10, 0, 0, 1);
    let provider = MockDnsProvider::new().with_domain("example.com", mixed_records("9.9.9.9"));

    sqlite_engine(&db, initial_ip, &provider).run_once().await.unwrap();
    let outcome = sqlite_engine(&db, new_ip, &provider).run_once().await.unwrap();

    match outcome {
        RunOutcome::Updated {
            previous_ip,
            new_ip: propagated,
            ..
        } => {
            assert_eq!(previous_ip, Some(initial_ip));
            assert_eq!(propagated, new_ip);
        }
        other => panic!("expected Updated, got {:?}", other),
    }

    assert_eq!(provider.writes().len(), 2);
    assert_eq!(provider.records("example.com")[0].data, "10.0.0.1");
    assert_eq!(SqliteStateStore::new(&db).read().await.unwrap(), Some(new_ip));
}

#[tokio::test]
async fn dns_already_correct_still_refreshes_cache() {
    // Empty cache but the record is already right: no write, cache filled
    let dir = tempdir().unwrap();
    let path = dir.path().join("last_ip.json");
    let ip = Ipv4Addr::new(1, 2, 3, 4);
    let provider = MockDnsProvider::new().with_domain("example.com", mixed_records("1.2.3.4"));

    let engine = DdnsEngine::new(
        Box::new(FixedIpSource::new(ip)),
        Box::new(provider.clone()),
        Box::new(FileStateStore::new(&path)),
        minimal_config(&["example.com"]),
    )
    .unwrap();

    let outcome = engine.run_once().await.unwrap();

    assert!(matches!(outcome, RunOutcome::Updated { .. }));
    assert_eq!(outcome.records_updated(), 0);
    assert!(provider.writes().is_empty());
    assert_eq!(FileStateStore::new(&path).read().await.unwrap(), Some(ip));
}
