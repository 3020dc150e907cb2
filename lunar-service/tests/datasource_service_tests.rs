use lunar_model::{DataSourceType, ModelError, TypeRegistry};
use lunar_service::{DatasourceService, ErrorKind, ServiceError, StorageContext};
use lunar_storage::StorageConfig;
use lunar_types::{ResourceId, UserId};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    context: StorageContext,
    service: DatasourceService,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let context = StorageContext::local(StorageConfig::with_base_path(dir.path())).unwrap();
    let service = context.datasources(Arc::new(TypeRegistry::with_builtin()));
    Fixture {
        dir,
        context,
        service,
    }
}

fn user(s: &str) -> UserId {
    UserId::parse(s).unwrap()
}

fn id(s: &str) -> ResourceId {
    ResourceId::parse(s).unwrap()
}

fn local_file(file_name: &str) -> Value {
    json!({"name": "t", "type": "LOCAL_FILE", "connectionAttributes": {"file_name": file_name}})
}

// ── Create / list ────────────────────────────────────────────────

#[tokio::test]
async fn create_generates_id_and_writes_document() {
    let f = fixture();
    let u1 = user("u1");

    let created = f.service.create(&u1, &local_file("a.txt")).await.unwrap();

    let expected: PathBuf = f
        .dir
        .path()
        .join(format!("users/u1/datasources/{}.json", created.id()));
    assert!(expected.is_file());

    let listed = f.service.list(&u1).await.unwrap();
    assert_eq!(listed, vec![created]);
}

#[tokio::test]
async fn stored_document_has_canonical_shape() {
    let f = fixture();
    let created = f
        .service
        .create(&user("u1"), &json!({"id": "d1", "type": "local_file", "connectionAttributes": {"fileName": "Data.CSV"}}))
        .await
        .unwrap();

    let text = std::fs::read_to_string(f.service.path(&user("u1"), created.id())).unwrap();
    let stored: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        stored,
        json!({
            "id": "d1",
            "name": "Local file datasource",
            "description": "Local file datasource - allows read and write operations on local files.",
            "type": "LOCAL_FILE",
            "connectionAttributes": {"fileName": "Data.CSV", "fileType": "csv"}
        })
    );
}

#[tokio::test]
async fn create_with_existing_id_conflicts() {
    let f = fixture();
    let u = user("u1");
    let payload = json!({"id": "d1", "type": "LOCAL_FILE", "connectionAttributes": {"file_name": "a.txt"}});
    f.service.create(&u, &payload).await.unwrap();

    let err = f.service.create(&u, &payload).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn same_id_for_different_users_is_fine() {
    let f = fixture();
    let payload = json!({"id": "shared", "type": "LOCAL_FILE", "connectionAttributes": {"file_name": "a.txt"}});
    f.service.create(&user("u1"), &payload).await.unwrap();
    f.service.create(&user("u2"), &payload).await.unwrap();
    assert_eq!(f.service.list(&user("u1")).await.unwrap().len(), 1);
    assert_eq!(f.service.list(&user("u2")).await.unwrap().len(), 1);
}

#[tokio::test]
async fn ids_that_listing_cannot_see_are_refused_on_create() {
    let f = fixture();
    let u = user("u1");
    for bad in [".cfg", "team[1]", "a*b", "x?"] {
        let payload = json!({"id": bad, "type": "LOCAL_FILE", "connectionAttributes": {"file_name": "a.txt"}});
        let err = f.service.create(&u, &payload).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput, "{bad} was accepted");
    }
    assert!(f.service.list(&u).await.unwrap().is_empty());
    assert!(UserId::parse("team[1]").is_err());
}

#[tokio::test]
async fn longest_id_round_trips_through_list() {
    let f = fixture();
    let u = user("u1");
    let long_id = "a".repeat(lunar_types::MAX_ID_LEN);
    let payload = json!({"id": long_id, "type": "LOCAL_FILE", "connectionAttributes": {"file_name": "a.txt"}});

    let created = f.service.create(&u, &payload).await.unwrap();
    assert_eq!(created.id().as_str(), long_id);
    assert_eq!(f.service.list(&u).await.unwrap(), vec![created]);

    let too_long = json!({"id": format!("{long_id}a"), "type": "LOCAL_FILE", "connectionAttributes": {"file_name": "a.txt"}});
    let err = f.service.create(&u, &too_long).await.unwrap_err();
    assert!(matches!(err, ServiceError::Model(ModelError::Validation { .. })));
}

#[tokio::test]
async fn unknown_type_writes_nothing() {
    let f = fixture();
    let err = f
        .service
        .create(&user("u1"), &json!({"name": "x", "type": "FTP", "connectionAttributes": {}}))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Model(ModelError::UnknownType { .. })));
    assert!(!f.dir.path().join("users/u1/datasources").exists());
}

#[tokio::test]
async fn postgres_attributes_under_local_file_are_rejected() {
    let f = fixture();
    let err = f
        .service
        .create(
            &user("u1"),
            &json!({
                "type": "LOCAL_FILE",
                "connectionAttributes": {"host": "h", "database": "d", "user": "u", "password": "p"}
            }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Model(ModelError::Validation { .. })));
}

#[tokio::test]
async fn list_for_unknown_user_is_empty() {
    let f = fixture();
    assert!(f.service.list(&user("nobody")).await.unwrap().is_empty());
}

// ── Get ──────────────────────────────────────────────────────────

#[tokio::test]
async fn get_round_trips() {
    let f = fixture();
    let u = user("u1");
    let created = f
        .service
        .create(
            &u,
            &json!({
                "type": "POSTGRESQL",
                "connectionAttributes": {"host": "db", "database": "d", "user": "u", "password": "p"}
            }),
        )
        .await
        .unwrap();

    let fetched = f.service.get(&u, created.id()).await.unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.data_source_type(), DataSourceType::Postgresql);
    assert_eq!(fetched.as_postgresql().unwrap().port, 5432);
}

#[tokio::test]
async fn get_missing_is_not_found() {
    let f = fixture();
    let err = f.service.get(&user("u1"), &id("nope")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn externally_edited_document_is_rejected_on_read() {
    let f = fixture();
    let u = user("u1");
    let created = f.service.create(&u, &local_file("a.txt")).await.unwrap();
    let path = f.service.path(&u, created.id());

    let mut doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    doc["type"] = json!("POSTGRESQL");
    std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

    let err = f.service.get(&u, created.id()).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidDocument { .. }));
    assert_eq!(err.kind(), ErrorKind::Corrupt);
}

#[tokio::test]
async fn document_whose_id_disagrees_with_file_name_is_rejected() {
    let f = fixture();
    let u = user("u1");
    f.service
        .create(&u, &json!({"id": "d1", "type": "LOCAL_FILE", "connectionAttributes": {"file_name": "a.txt"}}))
        .await
        .unwrap();
    let moved = f.service.path(&u, &id("d2"));
    std::fs::rename(f.service.path(&u, &id("d1")), &moved).unwrap();

    let err = f.service.get(&u, &id("d2")).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidDocument { source: ModelError::IdChanged { .. }, .. }
    ));
    assert!(f.service.list(&u).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_skips_corrupt_and_invalid_documents() {
    let f = fixture();
    let u = user("u1");
    let good = f.service.create(&u, &local_file("a.txt")).await.unwrap();
    let dir = f.dir.path().join("users/u1/datasources");
    std::fs::write(dir.join("corrupt.json"), "{ nope").unwrap();
    std::fs::write(dir.join("invalid.json"), r#"{"id": "invalid", "type": "FTP"}"#).unwrap();

    assert_eq!(f.service.list(&u).await.unwrap(), vec![good]);
}

// ── Update ───────────────────────────────────────────────────────

#[tokio::test]
async fn update_merges_and_persists() {
    let f = fixture();
    let u = user("u1");
    let created = f.service.create(&u, &local_file("a.txt")).await.unwrap();

    let updated = f
        .service
        .update(&u, created.id(), &json!({"description": "renamed", "connectionAttributes": {"fileName": "b.parquet"}}))
        .await
        .unwrap();

    assert_eq!(updated.id(), created.id());
    assert_eq!(updated.name(), "t");
    assert_eq!(updated.description(), "renamed");
    assert_eq!(updated.as_local_file().unwrap().file_type(), "parquet");
    assert_eq!(f.service.get(&u, created.id()).await.unwrap(), updated);
}

#[tokio::test]
async fn update_cannot_change_type() {
    let f = fixture();
    let u = user("u1");
    let created = f.service.create(&u, &local_file("a.txt")).await.unwrap();

    let err = f
        .service
        .update(&u, created.id(), &json!({"type": "POSTGRESQL"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Model(ModelError::DiscriminatorChanged { .. })));
    assert_eq!(f.service.get(&u, created.id()).await.unwrap(), created);
}

#[tokio::test]
async fn update_missing_is_not_found() {
    let f = fixture();
    let err = f
        .service
        .update(&user("u1"), &id("ghost"), &json!({"name": "x"}))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_are_serialized() {
    let f = fixture();
    let u = user("u1");
    let created = f.service.create(&u, &local_file("a.txt")).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = f.service.clone();
        let (u, id) = (u.clone(), created.id().clone());
        handles.push(tokio::spawn(async move {
            service.update(&u, &id, &json!({"name": format!("n{i}")})).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let name = f.service.get(&u, created.id()).await.unwrap().name().to_string();
    assert!(name.starts_with('n'));
}

// ── Delete ───────────────────────────────────────────────────────

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let f = fixture();
    let u = user("u1");
    let created = f.service.create(&u, &local_file("a.txt")).await.unwrap();

    assert!(f.service.delete(&u, created.id(), false).await.unwrap());
    assert!(f.service.get(&u, created.id()).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn delete_missing_honours_missing_ok() {
    let f = fixture();
    let u = user("u1");
    assert!(!f.service.delete(&u, &id("ghost"), true).await.unwrap());
    let err = f.service.delete(&u, &id("ghost"), false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ── Component input ──────────────────────────────────────────────

#[tokio::test]
async fn component_input_for_existing_file() {
    let f = fixture();
    let u = user("u1");
    f.context.provisioner().ensure_user_scaffold(&u).await.unwrap();
    let file_root = f.dir.path().join("users/u1/files");
    std::fs::write(file_root.join("sales.csv"), "a,b\n1,2\n").unwrap();

    let created = f
        .service
        .create(&u, &json!({"type": "LOCAL_FILE", "description": "q3", "connectionAttributes": {"file_name": "sales.csv"}}))
        .await
        .unwrap();
    let input = f.service.component_input(&u, created.id()).await.unwrap();

    assert_eq!(input.name, "sales.csv");
    assert_eq!(input.description, "q3");
    assert_eq!(input.file_type, "csv");
    assert_eq!(input.size, 8);
    assert_eq!(input.path, file_root.join("sales.csv"));
}

#[tokio::test]
async fn component_input_for_missing_file() {
    let f = fixture();
    let u = user("u1");
    let created = f.service.create(&u, &local_file("absent.csv")).await.unwrap();

    // No file root yet.
    let err = f.service.component_input(&u, created.id()).await.unwrap_err();
    assert!(matches!(err, ServiceError::FileNotFound(_)));

    // File root, but no file.
    f.context.provisioner().ensure_user_scaffold(&u).await.unwrap();
    let err = f.service.component_input(&u, created.id()).await.unwrap_err();
    assert!(matches!(&err, ServiceError::FileNotFound(p) if p.ends_with("absent.csv")));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn component_input_unsupported_for_postgres() {
    let f = fixture();
    let u = user("u1");
    let created = f
        .service
        .create(
            &u,
            &json!({"type": "POSTGRESQL", "connectionAttributes": {"host": "h", "database": "d", "user": "u", "password": "p"}}),
        )
        .await
        .unwrap();
    let err = f.service.component_input(&u, created.id()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Unsupported { .. }));
}
