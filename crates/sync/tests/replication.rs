// SPDX-License-Identifier: MIT

//! End-to-end replication: SQLite store, real HTTP client, mock remote.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use till_core::{Model, RecordStore, SqliteStore};
use till_sync::{Connectivity, Error, HttpPushClient, SyncConfig, SyncEngine};

/// Acknowledge whatever id the request carried, like a real upsert
/// endpoint would.
struct EchoId;

impl Respond for EchoId {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        ResponseTemplate::new(200).set_body_json(json!({"id": body["id"]}))
    }
}

fn engine_for(
    server: &MockServer,
    store: Arc<SqliteStore>,
    online: bool,
) -> SyncEngine<SqliteStore, HttpPushClient> {
    let config = SyncConfig {
        remote_base_url: server.uri(),
        api_key: "test-key".to_string(),
        ..SyncConfig::default()
    };
    SyncEngine::new(store, HttpPushClient::new(&config), Connectivity::new(online))
}

#[tokio::test]
async fn test_partial_failure_then_recovery() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(&dir.path().join("till.db")).unwrap());
    store
        .put(Model::Warehouse, "w-1", &json!({"name": "Main"}))
        .unwrap();
    store
        .put(Model::Warehouse, "w-2", &json!({"name": "Backup"}))
        .unwrap();
    store
        .put(Model::Sale, "s-1", &json!({"total": 990}))
        .unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sync/warehouse"))
        .respond_with(EchoId)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sync/sale"))
        .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
        .mount(&server)
        .await;
    let engine = engine_for(&server, Arc::clone(&store), true);

    // First pass: warehouses commit, the sale stays queued.
    let summary = engine.run_pass().await.unwrap();
    assert_eq!(summary.total_synced, 2);
    assert_eq!(summary.total_errors, 1);
    assert_eq!(store.count_unsynced(Model::Warehouse).unwrap(), 0);
    assert_eq!(store.count_unsynced(Model::Sale).unwrap(), 1);
    assert!(store.get(Model::Warehouse, "w-1").unwrap().synced);
    assert!(!store.get(Model::Sale, "s-1").unwrap().synced);

    // Remote recovers.
    server.reset().await;
    Mock::given(method("POST"))
        .respond_with(EchoId)
        .mount(&server)
        .await;

    // Second pass retries only what is still queued.
    let summary = engine.run_pass().await.unwrap();
    assert_eq!(summary.total_synced, 1);
    assert_eq!(summary.total_errors, 0);
    assert_eq!(store.count_unsynced(Model::Sale).unwrap(), 0);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.path().ends_with("/sync/sale"));
}

#[tokio::test]
async fn test_pass_pushes_models_in_registry_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(&dir.path().join("till.db")).unwrap());
    // Inserted child-first; the pass must still push parent models
    // first.
    store
        .put(Model::SaleItem, "si-1", &json!({"sale_id": "s-1"}))
        .unwrap();
    store
        .put(Model::Sale, "s-1", &json!({"warehouse_id": "w-1"}))
        .unwrap();
    store.put(Model::Warehouse, "w-1", &json!({})).unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(EchoId).mount(&server).await;
    let engine = engine_for(&server, Arc::clone(&store), true);

    engine.run_pass().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let paths: Vec<String> = requests.iter().map(|r| r.url.path().to_string()).collect();
    assert_eq!(paths, vec!["/sync/warehouse", "/sync/sale", "/sync/sale-item"]);
}

#[tokio::test]
async fn test_offline_engine_pushes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(&dir.path().join("till.db")).unwrap());
    store.put(Model::Product, "p-1", &json!({})).unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(EchoId).mount(&server).await;
    let engine = engine_for(&server, Arc::clone(&store), false);

    let err = engine.run_pass().await.unwrap_err();

    assert!(matches!(err, Error::Offline));
    assert!(server.received_requests().await.unwrap().is_empty());
    assert_eq!(store.count_unsynced(Model::Product).unwrap(), 1);
}
