// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use filnote_gateway::storage::kv_store::{now_ms, LEGACY_MIGRATION_TTL_MS};
use filnote_gateway::storage::{JsonFileStore, NonceBackend, NonceRecord, NonceTable};
use serde_json::{json, Value};
use tempfile::TempDir;

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_missing_file_is_initialised() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("nonces.json");
    let store = JsonFileStore::new(&path);

    let table = store.load().await.unwrap();
    assert!(table.is_empty());
    assert_eq!(read_json(&path), json!({"verifications": {}}));
}

#[tokio::test]
async fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nonces.json");
    let store = JsonFileStore::new(&path);

    let mut table = NonceTable::new();
    table.insert(
        "0xabc".to_string(),
        NonceRecord {
            nonce: "n-1".to_string(),
            expires_at: 1_900_000_000_000,
        },
    );
    store.save(&table).await.unwrap();

    assert_eq!(
        read_json(&path),
        json!({"verifications": {"0xabc": {"uuid": "n-1", "expiresAt": 1_900_000_000_000i64}}})
    );
    assert_eq!(JsonFileStore::new(&path).load().await.unwrap(), table);
    assert!(!path.with_extension("tmp").exists());
}

#[tokio::test]
async fn test_corrupt_and_empty_files_reset() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nonces.json");

    for contents in ["{not json", "", "   \n", r#"{"other": 1}"#] {
        std::fs::write(&path, contents).unwrap();
        let table = JsonFileStore::new(&path).load().await.unwrap();
        assert!(table.is_empty(), "contents {:?}", contents);
        assert_eq!(read_json(&path), json!({"verifications": {}}));
    }
}

#[tokio::test]
async fn test_malformed_records_dropped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nonces.json");
    std::fs::write(
        &path,
        json!({
            "verifications": {
                "0xgood": {"uuid": "ok", "expiresAt": 1_900_000_000_000i64},
                "0xnouuid": {"expiresAt": 1_900_000_000_000i64},
                "0xbadexpiry": {"uuid": "x", "expiresAt": "soon"},
                "0xnull": null
            }
        })
        .to_string(),
    )
    .unwrap();

    let table = JsonFileStore::new(&path).load().await.unwrap();
    assert_eq!(table.len(), 1);
    assert!(table.contains_key("0xgood"));
}

#[tokio::test]
async fn test_legacy_array_is_migrated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nonces.json");
    std::fs::write(
        &path,
        json!({"verifications": ["0xAAAA", "0xbbbb", 7]}).to_string(),
    )
    .unwrap();

    let before = now_ms();
    let table = JsonFileStore::new(&path).load().await.unwrap();
    let after = now_ms();

    assert_eq!(table.len(), 2);
    let record = &table["0xaaaa"];
    assert!(!record.nonce.is_empty());
    assert!(record.expires_at >= before + LEGACY_MIGRATION_TTL_MS);
    assert!(record.expires_at <= after + LEGACY_MIGRATION_TTL_MS);
    assert_ne!(table["0xaaaa"].nonce, table["0xbbbb"].nonce);

    // migration is persisted
    assert!(read_json(&path)["verifications"].is_object());
}
