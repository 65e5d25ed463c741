//! End-to-end tests for the Tachyon rule engine
//!
//! Exercises the full path from rule registration through ingestion fan-out
//! to range reconstruction against the in-memory store.

use std::sync::Arc;

use tachyon_engine::{
    AggregateKind, KeyValueStore, MemoryStore, RuleEngine, RuleId, Sample, TachyonError,
};

fn engine() -> (Arc<MemoryStore>, Arc<RuleEngine>) {
    let store = Arc::new(MemoryStore::new());
    let engine = Arc::new(RuleEngine::new(Arc::clone(&store) as Arc<dyn KeyValueStore>));
    (store, engine)
}

#[tokio::test]
async fn two_samples_in_one_bin_average() {
    let (_, engine) = engine();
    let id = engine
        .register_rule("^spam.*", "f", 1, 10, 100, AggregateKind::Avg)
        .expect("register should succeed");

    engine.add_sample("spamA", 10.0, 0).await.expect("add should succeed");
    engine.add_sample("spamA", 20.0, 0).await.expect("add should succeed");

    let series = engine
        .read_range("spamA", id, 0, 1)
        .await
        .expect("read should succeed");
    assert_eq!(series, vec![(0, Some(15.0))]);
}

#[tokio::test]
async fn samples_straddling_a_chunk_boundary() {
    let (_, engine) = engine();
    let id = engine
        .register_rule("^spam.*", "f", 1, 10, 100, AggregateKind::Avg)
        .expect("register should succeed");

    // bin 9 is chunk 0 / slot 9; bin 10 is chunk 1 / slot 0
    engine.add_sample("spamA", 5.0, 9).await.expect("add should succeed");
    engine.add_sample("spamA", 5.0, 10).await.expect("add should succeed");

    let series = engine
        .read_range("spamA", id, 0, 11)
        .await
        .expect("read should succeed");
    assert_eq!(series.len(), 11);
    assert_eq!(series[9], (9, Some(5.0)));
    assert_eq!(series[10], (10, Some(5.0)));
    for (ts, value) in &series[..9] {
        assert!(value.is_none(), "bin at {} should be absent", ts);
    }
}

#[tokio::test]
async fn one_sample_fans_out_to_two_rules() {
    let (_, engine) = engine();
    let sums = engine
        .register_rule("web\\..*", "f", 1, 10, 100, AggregateKind::Sum)
        .expect("register should succeed");
    let counts = engine
        .register_rule(".*\\.requests", "f", 1, 10, 100, AggregateKind::Count)
        .expect("register should succeed");

    let outcome = engine
        .add_sample("web.requests", 7.0, 0)
        .await
        .expect("add should succeed");
    assert_eq!(outcome.matched, 2);
    assert_eq!(outcome.applied, 2);
    assert!(outcome.fully_applied());

    // each rule produced an independently queryable series
    let by_sum = engine
        .read_range("web.requests", sums, 0, 1)
        .await
        .expect("read should succeed");
    let by_count = engine
        .read_range("web.requests", counts, 0, 1)
        .await
        .expect("read should succeed");
    assert_eq!(by_sum, vec![(0, Some(7.0))]);
    assert_eq!(by_count, vec![(0, Some(1.0))]);
}

#[tokio::test]
async fn expired_chunk_reads_absent_without_error() {
    let (store, engine) = engine();
    let id = engine
        .register_rule("^spam.*", "f", 1, 10, 100, AggregateKind::Sum)
        .expect("register should succeed");

    engine.add_sample("spamA", 3.0, 0).await.expect("add should succeed");

    // evict the chunk key the way store-native expiry would
    assert!(store.remove_key("ts:0:1:0:spamA"));

    let series = engine
        .read_range("spamA", id, 0, 2)
        .await
        .expect("read should succeed");
    assert_eq!(series, vec![(0, None), (1, None)]);
}

#[tokio::test]
async fn unmatched_series_is_dropped() {
    let (store, engine) = engine();
    engine
        .register_rule("spam.*", "f", 1, 10, 100, AggregateKind::Sum)
        .expect("register should succeed");

    let outcome = engine
        .add_sample("other", 1.0, 0)
        .await
        .expect("add should succeed");
    assert_eq!(outcome.matched, 0);
    assert_eq!(store.stats().merge_ops, 0);
}

#[tokio::test]
async fn concurrent_writers_keep_sums_additive() {
    let (store, engine) = engine();
    let id = engine
        .register_rule(".*", "f", 1, 10, 0, AggregateKind::Sum)
        .expect("register should succeed");

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            for _ in 0..25 {
                engine.add_sample("hits", 1.0, 0).await.expect("add should succeed");
            }
        }));
    }
    for handle in handles {
        handle.await.expect("task should finish");
    }

    assert_eq!(store.stats().merge_ops, 200);
    let series = engine
        .read_range("hits", id, 0, 1)
        .await
        .expect("read should succeed");
    assert_eq!(series, vec![(0, Some(200.0))]);
}

#[tokio::test]
async fn concurrent_last_writers_keep_newest_value() {
    let (_, engine) = engine();
    let id = engine
        .register_rule(".*", "f", 100, 10, 0, AggregateKind::Last)
        .expect("register should succeed");

    // all timestamps share bin 0; the largest timestamp must win no matter
    // the arrival order
    let mut handles = Vec::new();
    for ts in 0..50i64 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine
                .add_sample("gauge", ts as f64, ts)
                .await
                .expect("add should succeed");
        }));
    }
    for handle in handles {
        handle.await.expect("task should finish");
    }

    let series = engine
        .read_range("gauge", id, 0, 100)
        .await
        .expect("read should succeed");
    assert_eq!(series, vec![(0, Some(49.0))]);
}

#[tokio::test]
async fn ttl_refresh_follows_every_write() {
    let (store, engine) = engine();
    engine
        .register_rule(".*", "f", 1, 10, 300, AggregateKind::Sum)
        .expect("register should succeed");

    engine.add_sample("a", 1.0, 0).await.expect("add should succeed");
    engine.add_sample("a", 1.0, 5).await.expect("add should succeed");
    assert_eq!(store.stats().expire_ops, 2);
}

#[tokio::test]
async fn batch_ingestion_isolates_bad_timestamps() {
    let (_, engine) = engine();
    let id = engine
        .register_rule(".*", "f", 1, 10, 0, AggregateKind::Sum)
        .expect("register should succeed");

    let outcomes = engine
        .add_batch(&[
            Sample::new("a", 1.0, 0),
            Sample::new("a", 1.0, -1),
            Sample::new("a", 1.0, 0),
        ])
        .await;

    assert!(outcomes[0].is_ok());
    assert!(matches!(outcomes[1], Err(TachyonError::InvalidTimestamp(-1))));
    assert!(outcomes[2].is_ok());

    let series = engine
        .read_range("a", id, 0, 1)
        .await
        .expect("read should succeed");
    assert_eq!(series, vec![(0, Some(2.0))]);
}

#[tokio::test]
async fn multi_chunk_range_spans_many_keys() {
    let (_, engine) = engine();
    let id = engine
        .register_rule(".*", "f", 10, 3, 0, AggregateKind::Max)
        .expect("register should succeed");

    // step=10, chunk=3: bins 0..9 span chunks 0..3
    for bin in [0i64, 4, 8] {
        engine
            .add_sample("m", bin as f64, bin * 10)
            .await
            .expect("add should succeed");
    }

    let series = engine
        .read_range("m", id, 0, 90)
        .await
        .expect("read should succeed");
    assert_eq!(series.len(), 9);
    assert_eq!(series[0], (0, Some(0.0)));
    assert_eq!(series[4], (40, Some(4.0)));
    assert_eq!(series[8], (80, Some(8.0)));
    assert_eq!(series[1], (10, None));
    assert_eq!(series[7], (70, None));
}

#[tokio::test]
async fn distinct_rules_never_share_keys() {
    let (_, engine) = engine();
    // same pattern, same step: only the rule id distinguishes the keys
    let a = engine
        .register_rule("dup", "f", 1, 10, 0, AggregateKind::Sum)
        .expect("register should succeed");
    let b = engine
        .register_rule("dup", "f", 1, 10, 0, AggregateKind::Sum)
        .expect("register should succeed");
    assert_eq!((a, b), (RuleId(0), RuleId(1)));

    engine.add_sample("dup", 5.0, 0).await.expect("add should succeed");

    let by_a = engine.read_range("dup", a, 0, 1).await.expect("read should succeed");
    let by_b = engine.read_range("dup", b, 0, 1).await.expect("read should succeed");
    assert_eq!(by_a, vec![(0, Some(5.0))]);
    assert_eq!(by_b, vec![(0, Some(5.0))]);
}
