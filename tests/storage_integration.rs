//! Storage adapter integration tests.
//!
//! Runs the same contract checks against every implemented backend:
//! - Operations fail before `connect()`
//! - Create/read/update/delete cycle with store-assigned ids
//! - Predicate queries with `eq`/`ne`, including `null`
//! - Ids are not reused after delete
//! - The factory rejects PostgreSQL at construction time

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use classroom::config::{StorageBackendType, StorageConfig};
use classroom::models::record::{record_from, record_id};
use classroom::models::{QUESTIONS, STUDENTS};
use classroom::storage::{
    DocumentStoreAdapter, MemoryAdapter, Query, SqliteAdapter, StorageAdapter,
    StorageAdapterFactory,
};
use classroom::{Error, StorageService};
use serde_json::{Value, json};
use tempfile::TempDir;

/// Builds one adapter of each implemented backend, rooted in `dir`.
fn adapters(dir: &TempDir) -> Vec<Box<dyn StorageAdapter>> {
    vec![
        Box::new(MemoryAdapter::new()),
        Box::new(DocumentStoreAdapter::new(dir.path().join("db.json"))),
        Box::new(SqliteAdapter::new(dir.path().join("classroom.db"))),
    ]
}

fn connected(dir: &TempDir) -> Vec<Box<dyn StorageAdapter>> {
    let adapters = adapters(dir);
    for adapter in &adapters {
        adapter.connect().unwrap();
    }
    adapters
}

// ============================================================================
// Connection lifecycle
// ============================================================================

#[test]
fn test_operations_fail_before_connect() {
    let dir = TempDir::new().unwrap();
    for adapter in adapters(&dir) {
        let name = adapter.name();
        assert!(
            matches!(adapter.read_all(STUDENTS), Err(Error::NotConnected { .. })),
            "{name}: read_all should require connect"
        );
        assert!(
            matches!(
                adapter.create(STUDENTS, record_from(json!({"name": "Ada"}))),
                Err(Error::NotConnected { .. })
            ),
            "{name}: create should require connect"
        );
        assert!(
            matches!(
                adapter.query(STUDENTS, &Query::new()),
                Err(Error::NotConnected { .. })
            ),
            "{name}: query should require connect"
        );
    }
}

#[test]
fn test_connect_and_disconnect_are_idempotent() {
    let dir = TempDir::new().unwrap();
    for adapter in adapters(&dir) {
        adapter.disconnect().unwrap();
        adapter.connect().unwrap();
        adapter.connect().unwrap();
        assert!(adapter.is_connected(), "{}", adapter.name());
        adapter.disconnect().unwrap();
        adapter.disconnect().unwrap();
        assert!(!adapter.is_connected(), "{}", adapter.name());
    }
}

// ============================================================================
// CRUD
// ============================================================================

#[test]
fn test_crud_cycle() {
    let dir = TempDir::new().unwrap();
    for adapter in connected(&dir) {
        let name = adapter.name();

        let created = adapter
            .create(
                QUESTIONS,
                record_from(json!({"content": "什么是函数？", "category": null, "student_id": 1})),
            )
            .unwrap();
        let id = record_id(&created).unwrap();
        assert_eq!(created["content"], json!("什么是函数？"), "{name}");

        let read = adapter.read(QUESTIONS, id).unwrap();
        assert_eq!(read, created, "{name}");

        let updated = adapter
            .update(QUESTIONS, id, record_from(json!({"category": "知识点应用类"})))
            .unwrap();
        assert_eq!(updated["category"], json!("知识点应用类"), "{name}");
        assert_eq!(updated["content"], json!("什么是函数？"), "{name}");
        assert_eq!(record_id(&updated), Some(id), "{name}");
        assert_eq!(adapter.read(QUESTIONS, id).unwrap(), updated, "{name}");

        adapter.delete(QUESTIONS, id).unwrap();
        assert!(
            matches!(adapter.read(QUESTIONS, id), Err(Error::NotFound { .. })),
            "{name}"
        );
    }
}

#[test]
fn test_missing_ids_are_not_found() {
    let dir = TempDir::new().unwrap();
    for adapter in connected(&dir) {
        let name = adapter.name();
        adapter
            .create(STUDENTS, record_from(json!({"name": "present"})))
            .unwrap();
        for id in [99, u64::MAX] {
            assert!(
                matches!(adapter.read(STUDENTS, id), Err(Error::NotFound { .. })),
                "{name} read {id}"
            );
            assert!(
                matches!(
                    adapter.update(STUDENTS, id, record_from(json!({"name": "x"}))),
                    Err(Error::NotFound { .. })
                ),
                "{name} update {id}"
            );
            assert!(
                matches!(adapter.delete(STUDENTS, id), Err(Error::NotFound { .. })),
                "{name} delete {id}"
            );
        }
    }
}

#[test]
fn test_update_cannot_change_id() {
    let dir = TempDir::new().unwrap();
    for adapter in connected(&dir) {
        let created = adapter
            .create(STUDENTS, record_from(json!({"student_id": "stu1"})))
            .unwrap();
        let id = record_id(&created).unwrap();

        let updated = adapter
            .update(STUDENTS, id, record_from(json!({"id": 500, "name": "Ada"})))
            .unwrap();
        assert_eq!(record_id(&updated), Some(id), "{}", adapter.name());
        assert!(
            matches!(adapter.read(STUDENTS, 500), Err(Error::NotFound { .. })),
            "{}",
            adapter.name()
        );
    }
}

#[test]
fn test_ids_are_not_reused_after_delete() {
    let dir = TempDir::new().unwrap();
    for adapter in connected(&dir) {
        let first = record_id(&adapter.create(STUDENTS, record_from(json!({"n": 1}))).unwrap());
        let second = record_id(&adapter.create(STUDENTS, record_from(json!({"n": 2}))).unwrap());
        assert!(second > first, "{}", adapter.name());

        adapter.delete(STUDENTS, second.unwrap()).unwrap();
        let third = record_id(&adapter.create(STUDENTS, record_from(json!({"n": 3}))).unwrap());
        assert!(third > second, "{}", adapter.name());
    }
}

#[test]
fn test_read_all_preserves_insertion_order() {
    let dir = TempDir::new().unwrap();
    for adapter in connected(&dir) {
        for name in ["a", "b", "c"] {
            adapter
                .create(STUDENTS, record_from(json!({"name": name})))
                .unwrap();
        }
        let names: Vec<Value> = adapter
            .read_all(STUDENTS)
            .unwrap()
            .into_iter()
            .map(|r| r["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("a"), json!("b"), json!("c")], "{}", adapter.name());
        assert!(adapter.read_all("unknown").unwrap().is_empty());
    }
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn test_query_eq_ne_null() {
    let dir = TempDir::new().unwrap();
    for adapter in connected(&dir) {
        let name = adapter.name();
        adapter
            .create(QUESTIONS, record_from(json!({"content": "a", "category": null})))
            .unwrap();
        adapter
            .create(
                QUESTIONS,
                record_from(json!({"content": "b", "category": "知识点定义类"})),
            )
            .unwrap();
        adapter
            .create(QUESTIONS, record_from(json!({"content": "c", "category": "Unclassified"})))
            .unwrap();

        let pending = adapter
            .query(QUESTIONS, &Query::new().eq("category", Value::Null))
            .unwrap();
        assert_eq!(pending.len(), 1, "{name}");
        assert_eq!(pending[0]["content"], json!("a"), "{name}");

        let classified = adapter
            .query(QUESTIONS, &Query::parse(&json!({"category": {"ne": null}})).unwrap())
            .unwrap();
        assert_eq!(classified.len(), 2, "{name}");

        let both = adapter
            .query(
                QUESTIONS,
                &Query::new()
                    .ne("category", Value::Null)
                    .ne("category", "Unclassified"),
            )
            .unwrap();
        assert_eq!(both.len(), 1, "{name}");
        assert_eq!(both[0]["content"], json!("b"), "{name}");

        let all = adapter.query(QUESTIONS, &Query::new()).unwrap();
        assert_eq!(all.len(), 3, "{name}");
    }
}

#[test]
fn test_query_numbers_compare_numerically() {
    let dir = TempDir::new().unwrap();
    for adapter in connected(&dir) {
        adapter
            .create(QUESTIONS, record_from(json!({"student_id": 1})))
            .unwrap();
        let hits = adapter
            .query(QUESTIONS, &Query::new().eq("student_id", 1.0))
            .unwrap();
        assert_eq!(hits.len(), 1, "{}", adapter.name());
    }
}

#[test]
fn test_malformed_predicate_maps() {
    for bad in [
        json!(["student_id"]),
        json!({"student_id": {"gt": 3}}),
        json!({"student_id": {}}),
        json!({"student_id": {"eq": 1, "ne": 2}}),
    ] {
        assert!(
            matches!(Query::parse(&bad), Err(Error::Validation(_))),
            "{bad} should be rejected"
        );
    }
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_document_store_persists_across_instances() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");

    let first = DocumentStoreAdapter::new(&path);
    first.connect().unwrap();
    let created = first
        .create(STUDENTS, record_from(json!({"student_id": "stu1", "name": "Ada"})))
        .unwrap();
    first.disconnect().unwrap();

    let second = DocumentStoreAdapter::new(&path);
    second.connect().unwrap();
    let id = record_id(&created).unwrap();
    assert_eq!(second.read(STUDENTS, id).unwrap(), created);
}

#[test]
fn test_sqlite_persists_across_instances() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("classroom.db");

    let first = SqliteAdapter::new(&path);
    first.connect().unwrap();
    let created = first
        .create(STUDENTS, record_from(json!({"student_id": "stu1"})))
        .unwrap();
    first.disconnect().unwrap();

    let second = SqliteAdapter::new(&path);
    second.connect().unwrap();
    assert_eq!(second.read_all(STUDENTS).unwrap(), vec![created]);
}

// ============================================================================
// Factory and facade
// ============================================================================

#[test]
fn test_factory_rejects_postgres() {
    let config = StorageConfig::with_backend(StorageBackendType::PostgreSQL);
    assert!(matches!(
        StorageAdapterFactory::create(&config),
        Err(Error::UnsupportedBackend(_))
    ));
    assert!(matches!(
        StorageService::from_config(&config),
        Err(Error::UnsupportedBackend(_))
    ));
}

#[test]
fn test_factory_builds_configured_backends() {
    let dir = TempDir::new().unwrap();
    let config = StorageConfig {
        document_path: dir.path().join("db.json"),
        sqlite_path: dir.path().join("classroom.db"),
        ..StorageConfig::default()
    };

    for (backend, name) in [
        (StorageBackendType::Document, "document"),
        (StorageBackendType::Memory, "memory"),
        (StorageBackendType::Sqlite, "sqlite"),
    ] {
        let service = StorageService::new(
            StorageAdapterFactory::create_with_backend(backend, &config).unwrap(),
        );
        assert_eq!(service.backend(), name);
        service.connect().unwrap();
        let created = service
            .create(STUDENTS, record_from(json!({"student_id": "stu1"})))
            .unwrap();
        assert!(record_id(&created).is_some());
        service.disconnect().unwrap();
    }
}
