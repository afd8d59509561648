#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;
use std::sync::Arc;

use floodmeter_core::protocol::stats::PeakRecord;
use floodmeter_server::obs::metrics::ServerMetrics;
use floodmeter_server::store::{FilePeakStore, PeakStore, RecoveringStore};

fn recovering(store: FilePeakStore) -> (RecoveringStore, Arc<ServerMetrics>) {
    let metrics = Arc::new(ServerMetrics::default());
    (RecoveringStore::new(Arc::new(store), Arc::clone(&metrics)), metrics)
}

#[tokio::test]
async fn missing_file_is_created_with_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.json");
    let store = FilePeakStore::new(&path);

    let rec = store.try_load().await.unwrap();
    assert_eq!(rec, PeakRecord::new(0));

    let on_disk = fs::read_to_string(&path).unwrap();
    assert_eq!(PeakRecord::parse(&on_disk, "stats.json").unwrap(), PeakRecord::new(0));
}

#[tokio::test]
async fn store_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.json");
    let store = FilePeakStore::new(&path);

    store.try_store(PeakRecord::new(1234)).await.unwrap();
    assert_eq!(store.try_load().await.unwrap(), PeakRecord::new(1234));

    let on_disk = fs::read_to_string(&path).unwrap();
    assert_eq!(on_disk, "{\n  \"max_requests\": 1234\n}");
    assert!(!dir.path().join("stats.json.tmp").exists());
}

#[tokio::test]
async fn corrupt_file_loads_as_zero_and_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.json");
    fs::write(&path, "{\"max_req").unwrap();

    let (store, metrics) = recovering(FilePeakStore::new(&path));
    assert_eq!(store.load().await, PeakRecord::new(0));

    assert_eq!(fs::read_to_string(&path).unwrap(), "{\"max_req");
    assert_eq!(metrics.store_errors.get(&[("op", "load"), ("kind", "STORE_CORRUPT")]), 1);
}

#[tokio::test]
async fn unwritable_location_is_swallowed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("stats.json");

    let (store, metrics) = recovering(FilePeakStore::new(&path));
    assert_eq!(store.load().await, PeakRecord::new(0));
    assert!(!store.store(PeakRecord::new(9)).await);

    assert_eq!(metrics.store_errors.get(&[("op", "load"), ("kind", "STORE_IO")]), 1);
    assert_eq!(metrics.store_errors.get(&[("op", "store"), ("kind", "STORE_IO")]), 1);
}

#[tokio::test]
async fn overwrite_replaces_previous_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.json");
    let (store, _) = recovering(FilePeakStore::new(&path));

    assert!(store.store(PeakRecord::new(10)).await);
    assert!(store.store(PeakRecord::new(3)).await);
    assert_eq!(store.load().await, PeakRecord::new(3));
}

#[tokio::test]
async fn failed_rename_leaves_no_tmp_file() {
    let dir = tempfile::tempdir().unwrap();
    // a directory in the way makes the final rename fail
    let path = dir.path().join("stats.json");
    fs::create_dir(&path).unwrap();
    fs::write(path.join("keep"), "x").unwrap();

    let store = FilePeakStore::new(&path);
    let err = store.try_store(PeakRecord::new(5)).await.unwrap_err();
    assert_eq!(err.kind().as_str(), "STORE_IO");

    assert!(!dir.path().join("stats.json.tmp").exists());
    assert!(path.join("keep").exists());
}
