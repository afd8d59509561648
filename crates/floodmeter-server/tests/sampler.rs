#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::Message;
use tokio::sync::mpsc;

use floodmeter_core::error::{FloodError, Result};
use floodmeter_core::protocol::feed::RequestsEvent;
use floodmeter_core::protocol::stats::PeakRecord;
use floodmeter_server::app_state::AppState;
use floodmeter_server::config::ServerConfig;
use floodmeter_server::store::{MemoryPeakStore, PeakStore};
use floodmeter_server::tasks::Sampler;

fn hits(state: &AppState, n: usize) {
    let counters = state.counters();
    for _ in 0..n {
        counters.record_hit();
    }
}

fn decode(msg: Message) -> RequestsEvent {
    match msg {
        Message::Text(s) => RequestsEvent::from_text(&s).unwrap(),
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn three_tick_scenario_against_stats_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.json");
    let mut cfg = ServerConfig::default();
    cfg.stats.path = path.display().to_string();

    let state = AppState::new(cfg);
    let sampler = Sampler::new(&state);
    let (tx, mut rx) = mpsc::channel(8);
    state.broadcaster().subscribe(tx);

    hits(&state, 5);
    assert_eq!(sampler.tick().await, RequestsEvent::new(5, 5, 5));
    assert_eq!(decode(rx.recv().await.unwrap()), RequestsEvent::new(5, 5, 5));
    assert_eq!(state.counters().snapshot().interval, 0);
    let stored = fs::read_to_string(&path).unwrap();
    assert_eq!(PeakRecord::parse(&stored, "stats.json").unwrap(), PeakRecord::new(5));

    hits(&state, 3);
    assert_eq!(sampler.tick().await, RequestsEvent::new(8, 3, 5));
    assert_eq!(decode(rx.recv().await.unwrap()), RequestsEvent::new(8, 3, 5));
    assert_eq!(fs::read_to_string(&path).unwrap(), stored);

    hits(&state, 7);
    assert_eq!(sampler.tick().await, RequestsEvent::new(15, 7, 7));
    assert_eq!(decode(rx.recv().await.unwrap()), RequestsEvent::new(15, 7, 7));
    let stored = fs::read_to_string(&path).unwrap();
    assert_eq!(PeakRecord::parse(&stored, "stats.json").unwrap(), PeakRecord::new(7));
}

#[tokio::test]
async fn tie_with_peak_rewrites_record() {
    let store = Arc::new(MemoryPeakStore::with_record(PeakRecord::new(4)));
    let state = AppState::with_store(ServerConfig::default(), store.clone());
    let sampler = Sampler::new(&state);

    hits(&state, 4);
    assert_eq!(sampler.tick().await, RequestsEvent::new(4, 4, 4));
    assert_eq!(store.writes(), 1);
    assert_eq!(state.metrics().peak_writes.get(&[]), 1);
}

#[tokio::test]
async fn below_peak_leaves_store_untouched() {
    let store = Arc::new(MemoryPeakStore::with_record(PeakRecord::new(10)));
    let state = AppState::with_store(ServerConfig::default(), store.clone());
    let sampler = Sampler::new(&state);

    hits(&state, 9);
    assert_eq!(sampler.tick().await, RequestsEvent::new(9, 9, 10));
    assert_eq!(store.writes(), 0);
    assert_eq!(store.current(), Some(PeakRecord::new(10)));
}

#[tokio::test]
async fn idle_tick_with_zero_peak_still_writes() {
    let store = Arc::new(MemoryPeakStore::new());
    let state = AppState::with_store(ServerConfig::default(), store.clone());
    let sampler = Sampler::new(&state);

    assert_eq!(sampler.tick().await, RequestsEvent::new(0, 0, 0));
    assert_eq!(store.writes(), 1);
}

#[tokio::test]
async fn cumulative_spans_ticks() {
    let state = AppState::with_store(ServerConfig::default(), Arc::new(MemoryPeakStore::new()));
    let sampler = Sampler::new(&state);

    let mut total = 0;
    for n in [3, 0, 11, 1] {
        hits(&state, n);
        total += n as u64;
        let ev = sampler.tick().await;
        assert_eq!(ev.interval, n as u64);
        assert_eq!(ev.cumulative, total);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_hits_in_one_interval_are_all_counted() {
    let state = AppState::with_store(ServerConfig::default(), Arc::new(MemoryPeakStore::new()));
    let sampler = Sampler::new(&state);

    let mut handles = Vec::new();
    for _ in 0..50 {
        let counters = state.counters();
        handles.push(tokio::spawn(async move {
            for _ in 0..40 {
                counters.record_hit();
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let ev = sampler.tick().await;
    assert_eq!(ev.interval, 2000);
    assert_eq!(ev.cumulative, 2000);
}

/// Store that fails every operation.
struct BrokenStore;

#[async_trait]
impl PeakStore for BrokenStore {
    fn location(&self) -> &str {
        "broken"
    }

    async fn try_load(&self) -> Result<PeakRecord> {
        Err(FloodError::Internal("disk gone".into()))
    }

    async fn try_store(&self, _record: PeakRecord) -> Result<()> {
        Err(FloodError::Internal("disk gone".into()))
    }
}

#[tokio::test]
async fn broken_store_degrades_but_keeps_ticking() {
    let state = AppState::with_store(ServerConfig::default(), Arc::new(BrokenStore));
    let sampler = Sampler::new(&state);
    let (tx, mut rx) = mpsc::channel(4);
    state.broadcaster().subscribe(tx);

    hits(&state, 6);
    let ev = sampler.tick().await;
    assert_eq!(ev, RequestsEvent::new(6, 6, 6));
    assert_eq!(decode(rx.recv().await.unwrap()), ev);
    assert_eq!(state.counters().snapshot().interval, 0);

    hits(&state, 2);
    assert_eq!(sampler.tick().await, RequestsEvent::new(8, 2, 2));

    let metrics = state.metrics();
    assert_eq!(metrics.store_errors.get(&[("op", "load"), ("kind", "INTERNAL")]), 2);
    assert_eq!(metrics.store_errors.get(&[("op", "store"), ("kind", "INTERNAL")]), 2);
    assert_eq!(metrics.peak_writes.get(&[]), 0);
}
