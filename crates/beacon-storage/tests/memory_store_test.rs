//! Behavioural tests for MemoryRecordStore.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use beacon_core::config::StorageConfig;
use beacon_core::errors::StorageError;
use beacon_core::models::{EventPersistence, LatencyTier, RecordFilter, StorageRecord};
use beacon_core::traits::RecordStorage;
use beacon_storage::MemoryRecordStore;

fn rec(id: &str, tier: LatencyTier) -> StorageRecord {
    StorageRecord::new(id, "tenant-a", tier, EventPersistence::Normal, vec![7; 16])
}

fn reserve_ids(
    store: &MemoryRecordStore,
    lease_ms: u64,
    min_tier: LatencyTier,
    max_count: usize,
) -> Vec<String> {
    let mut ids = Vec::new();
    store.get_and_reserve_records(
        &mut |r| {
            ids.push(r.id);
            true
        },
        lease_ms,
        min_tier,
        max_count,
    );
    ids
}

// ── T-STO-01: staging ──

#[test]
fn off_tier_is_never_staged() {
    let store = MemoryRecordStore::default();
    assert!(!store.store_record(rec("off", LatencyTier::Off)));
    assert_eq!(store.get_record_count(None), 0);
    assert_eq!(store.get_size(), 0);
    assert!(reserve_ids(&store, 0, LatencyTier::Normal, 0).is_empty());
}

#[test]
fn store_records_counts_only_accepted() {
    let store = MemoryRecordStore::default();
    let stored = store.store_records(vec![
        rec("a", LatencyTier::Normal),
        rec("b", LatencyTier::Off),
        rec("c", LatencyTier::Max),
    ]);
    assert_eq!(stored, 2);
    assert_eq!(store.get_record_count(Some(LatencyTier::Max)), 1);
    assert_eq!(store.get_record_count(Some(LatencyTier::Off)), 0);
}

#[test]
fn storing_a_queued_id_again_is_rejected() {
    let store = MemoryRecordStore::default();
    assert!(store.store_record(rec("y", LatencyTier::Normal)));
    assert!(!store.store_record(rec("y", LatencyTier::RealTime)));
    assert_eq!(store.store_records(vec![rec("y", LatencyTier::Normal), rec("z", LatencyTier::Normal)]), 1);

    let ids = reserve_ids(&store, 60_000, LatencyTier::Normal, 0);
    assert_eq!(ids.len(), 2);
    assert_eq!(store.get_reserved_count(), 2);
    assert_eq!(store.get_record_count(None), 0);
}

#[test]
fn storing_a_reserved_id_again_is_rejected() {
    let store = MemoryRecordStore::default();
    store.store_record(rec("x", LatencyTier::Normal));
    assert_eq!(reserve_ids(&store, 60_000, LatencyTier::Normal, 0), vec!["x".to_string()]);

    assert!(!store.store_record(rec("x", LatencyTier::Normal)));
    assert!(store.is_reserved("x"));
    assert!(!store.is_queued("x"));

    // Once the id has left the store it may be staged again.
    store.delete_records(&["x".to_string()]);
    assert!(store.store_record(rec("x", LatencyTier::Normal)));
}

// ── T-STO-02: reservation ──

#[test]
fn two_normal_records_drain_without_lease() {
    let store = MemoryRecordStore::default();
    store.store_record(rec("a", LatencyTier::Normal));
    store.store_record(rec("b", LatencyTier::Normal));

    let mut calls = 0;
    store.get_and_reserve_records(
        &mut |_| {
            calls += 1;
            true
        },
        0,
        LatencyTier::Normal,
        10,
    );
    assert_eq!(calls, 2);
    assert_eq!(store.get_size(), 0);
    assert_eq!(store.get_record_count(None), 0);
    assert_eq!(store.get_reserved_count(), 0);
    assert_eq!(store.last_read_record_count(), 2);
}

#[test]
fn reservation_order_is_tier_desc_then_lifo() {
    let store = MemoryRecordStore::default();
    store.store_record(rec("n1", LatencyTier::Normal));
    store.store_record(rec("m1", LatencyTier::Max));
    store.store_record(rec("n2", LatencyTier::Normal));
    store.store_record(rec("cd", LatencyTier::CostDeferred));
    store.store_record(rec("m2", LatencyTier::Max));

    let ids = reserve_ids(&store, 1_000, LatencyTier::Normal, 0);
    assert_eq!(ids, vec!["m2", "m1", "cd", "n2", "n1"]);
}

#[test]
fn min_tier_excludes_lower_tiers() {
    let store = MemoryRecordStore::default();
    store.store_record(rec("n", LatencyTier::Normal));
    store.store_record(rec("rt", LatencyTier::RealTime));
    let ids = reserve_ids(&store, 1_000, LatencyTier::RealTime, 0);
    assert_eq!(ids, vec!["rt"]);
    assert_eq!(store.get_record_count(Some(LatencyTier::Normal)), 1);
}

#[test]
fn reserve_with_min_tier_off_is_refused() {
    let store = MemoryRecordStore::default();
    store.store_record(rec("n", LatencyTier::Normal));
    assert!(!store.get_and_reserve_records(&mut |_| true, 0, LatencyTier::Off, 0));
    assert_eq!(store.get_record_count(None), 1);
}

#[test]
fn consumer_false_stops_but_keeps_handed_out_reserved() {
    let store = MemoryRecordStore::default();
    for id in ["a", "b", "c"] {
        store.store_record(rec(id, LatencyTier::Normal));
    }
    let mut seen = Vec::new();
    store.get_and_reserve_records(
        &mut |r| {
            seen.push(r.id);
            false
        },
        60_000,
        LatencyTier::Normal,
        0,
    );
    assert_eq!(seen, vec!["c"]);
    assert!(store.is_reserved("c"));
    assert_eq!(store.get_reserved_count(), 1);
    assert_eq!(store.get_record_count(None), 2);
}

#[test]
fn lease_moves_size_to_reserved_footprint() {
    let store = MemoryRecordStore::default();
    store.store_record(rec("a", LatencyTier::Normal));
    let before = store.get_size();
    reserve_ids(&store, 60_000, LatencyTier::Normal, 0);
    assert_eq!(store.get_size(), 0);
    assert_eq!(store.get_reserved_size(), before);
}

#[test]
fn huge_lease_does_not_wrap_into_the_past() {
    let store = MemoryRecordStore::default();
    store.store_record(rec("a", LatencyTier::Normal));
    assert_eq!(reserve_ids(&store, u64::MAX, LatencyTier::Normal, 0).len(), 1);

    store.store_record(rec("b", LatencyTier::Normal));
    assert_eq!(reserve_ids(&store, 60_000, LatencyTier::Normal, 0), vec!["b".to_string()]);
    assert!(store.is_reserved("a"));
    assert_eq!(store.get_reserved_count(), 2);
}

#[test]
fn get_records_removes_without_lease() {
    let store = MemoryRecordStore::default();
    store.store_record(rec("a", LatencyTier::Normal));
    store.store_record(rec("b", LatencyTier::RealTime));
    let records = store.get_records(false, LatencyTier::Normal, 0);
    assert_eq!(records.len(), 2);
    assert_eq!(store.get_reserved_count(), 0);
    assert_eq!(store.get_record_count(None), 0);
}

// ── T-STO-03: completion ──

#[test]
fn delete_removes_from_reserved_and_queues() {
    let store = MemoryRecordStore::default();
    store.store_record(rec("a", LatencyTier::Normal));
    store.store_record(rec("b", LatencyTier::Normal));
    reserve_ids(&store, 60_000, LatencyTier::Normal, 1);
    assert!(store.is_reserved("b"));

    let deleted = store.delete_records(&["a".into(), "b".into(), "zz".into()]);
    assert_eq!(deleted, 2);
    assert_eq!(store.get_reserved_count(), 0);
    assert_eq!(store.get_record_count(None), 0);
    assert!(store.is_last_read_from_memory());
}

#[test]
fn delete_matching_is_a_conjunction() {
    let store = MemoryRecordStore::default();
    store.store_record(rec("a", LatencyTier::Normal));
    let mut other = rec("b", LatencyTier::Normal);
    other.tenant_token = "tenant-b".into();
    store.store_record(other);
    store.store_record(rec("c", LatencyTier::RealTime));

    let filter = RecordFilter {
        tenant_token: Some("tenant-a".into()),
        latency: Some(LatencyTier::Normal),
        ..Default::default()
    };
    assert_eq!(store.delete_records_matching(&filter), 1);
    assert!(!store.is_queued("a"));
    assert!(store.is_queued("b"));
    assert!(store.is_queued("c"));
}

#[test]
fn empty_filter_deletes_nothing() {
    let store = MemoryRecordStore::default();
    store.store_record(rec("a", LatencyTier::Normal));
    assert_eq!(store.delete_records_matching(&RecordFilter::default()), 0);
    assert_eq!(store.get_record_count(None), 1);
}

#[test]
fn release_restores_size_and_optionally_counts_retry() {
    let store = MemoryRecordStore::default();
    store.store_record(rec("a", LatencyTier::Normal));
    let size = store.get_size();
    let ids = reserve_ids(&store, 60_000, LatencyTier::Normal, 0);

    assert_eq!(store.release_records(&ids, true), 1);
    assert_eq!(store.get_size(), size);
    assert_eq!(store.get_reserved_size(), 0);

    let records = store.get_records(false, LatencyTier::Normal, 0);
    assert_eq!(records[0].retry_count, 1);
    assert!(records[0].reserved_until.is_none());
}

#[test]
fn release_past_retry_limit_drops_record() {
    let store = MemoryRecordStore::new(&StorageConfig { max_retry_count: 1 });
    store.store_record(rec("a", LatencyTier::Normal));

    let ids = reserve_ids(&store, 60_000, LatencyTier::Normal, 0);
    assert_eq!(store.release_records(&ids, true), 1);

    let ids = reserve_ids(&store, 60_000, LatencyTier::Normal, 0);
    assert_eq!(store.release_records(&ids, true), 0);
    assert_eq!(store.get_record_count(None), 0);
    assert_eq!(store.get_reserved_count(), 0);
}

#[test]
fn release_all_twice_equals_once() {
    let store = MemoryRecordStore::default();
    for id in ["a", "b", "c"] {
        store.store_record(rec(id, LatencyTier::Normal));
    }
    reserve_ids(&store, 60_000, LatencyTier::Normal, 2);
    assert_eq!(store.release_all_records(), 2);
    let after_first = (
        store.get_record_count(None),
        store.get_reserved_count(),
        store.get_size(),
    );
    assert_eq!(store.release_all_records(), 0);
    let after_second = (
        store.get_record_count(None),
        store.get_reserved_count(),
        store.get_size(),
    );
    assert_eq!(after_first, after_second);
    assert_eq!(after_first.0, 3);
}

#[test]
fn expired_lease_is_reclaimed_on_next_reservation() {
    let store = MemoryRecordStore::default();
    store.store_record(rec("a", LatencyTier::Normal));
    reserve_ids(&store, 1, LatencyTier::Normal, 0);
    thread::sleep(std::time::Duration::from_millis(20));

    let mut retry_counts = Vec::new();
    store.get_and_reserve_records(
        &mut |r| {
            retry_counts.push(r.retry_count);
            true
        },
        60_000,
        LatencyTier::Normal,
        0,
    );
    assert_eq!(retry_counts, vec![1]);
}

#[test]
fn delete_all_clears_everything() {
    let store = MemoryRecordStore::default();
    store.store_record(rec("a", LatencyTier::Normal));
    store.store_record(rec("b", LatencyTier::Max));
    reserve_ids(&store, 60_000, LatencyTier::Max, 0);
    store.delete_all_records();
    assert_eq!(store.get_record_count(None), 0);
    assert_eq!(store.get_reserved_count(), 0);
    assert_eq!(store.get_size(), 0);
}

// ── T-STO-04: unsupported and maintenance ──

#[test]
fn settings_are_unsupported() {
    let store = MemoryRecordStore::default();
    assert!(matches!(
        store.store_setting("k", "v"),
        Err(StorageError::Unsupported { .. })
    ));
    assert!(matches!(
        store.get_setting("k"),
        Err(StorageError::Unsupported { .. })
    ));
    assert!(matches!(
        store.delete_setting("k"),
        Err(StorageError::Unsupported { .. })
    ));
}

#[test]
fn maintenance_calls_are_harmless() {
    let store = MemoryRecordStore::default();
    store.store_record(rec("a", LatencyTier::Normal));
    reserve_ids(&store, 60_000, LatencyTier::Normal, 0);
    store.store_record(rec("b", LatencyTier::Normal));
    store.flush();
    assert!(store.resize_db());
    store.shutdown();
    assert_eq!(store.get_record_count(None), 1);
}

// ── T-STO-05: concurrency ──

#[test]
fn concurrent_producers_and_reserver_lose_nothing() {
    let store = Arc::new(MemoryRecordStore::default());
    let producers: Vec<_> = (0..4)
        .map(|p| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..250 {
                    store.store_record(rec(&format!("p{p}-{i}"), LatencyTier::Normal));
                }
            })
        })
        .collect();

    let reserver = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            let mut seen = HashSet::new();
            for _ in 0..200 {
                store.get_and_reserve_records(
                    &mut |r| {
                        seen.insert(r.id);
                        true
                    },
                    60_000,
                    LatencyTier::Normal,
                    10,
                );
            }
            seen
        })
    };

    for p in producers {
        p.join().unwrap();
    }
    let seen = reserver.join().unwrap();

    assert_eq!(seen.len(), store.get_reserved_count());
    assert_eq!(store.get_reserved_count() + store.get_record_count(None), 1000);
    for id in &seen {
        assert!(!store.is_queued(id));
    }
}
