//! End-to-end loads of the checked-in fixtures into recording stores.

#[path = "support/fixtures.rs"]
mod support;

use chrono::{TimeZone, Utc};
use mongofixture::store::memory::MemoryStore;
use mongofixture::store::StoreOperation;
use mongofixture::value::ID_FIELD;
use mongofixture::{
    DocumentData, ErrorKind, FixtureConfig, FixtureError, FixtureFormat, FixtureLoader, Value,
};
use rstest::rstest;
use std::fs;
use support::{RecordingStore, config, fixture_root};
use tempfile::TempDir;

fn admin1(store: &MemoryStore) -> DocumentData {
    store
        .find("users", &Value::from("admin1"))
        .expect("admin1 stored")
}

#[rstest]
#[case::auto_yaml(FixtureFormat::Auto, "admin_users")]
#[case::auto_json(FixtureFormat::Auto, "json/admin_users")]
#[case::forced_json(FixtureFormat::Json, "json/admin_users")]
#[case::forced_yaml(FixtureFormat::Yaml, "yaml/admin_users")]
#[tokio::test]
async fn single_fixture_populates_collections(#[case] format: FixtureFormat, #[case] name: &str) {
    let store = MemoryStore::new();
    let report = FixtureLoader::new(config(format), store.clone())
        .load(&[name])
        .await
        .expect("load");

    assert_eq!(report.count("users"), Some(2));
    assert_eq!(report.count("companies"), Some(2));
    let admin1 = admin1(&store);
    let created_at = Utc
        .with_ymd_and_hms(2019, 1, 2, 12, 34, 56)
        .single()
        .expect("valid time");
    let expected: DocumentData = [
        (ID_FIELD, Value::from("admin1")),
        ("name", Value::from("admin user1")),
        ("email", Value::from("admin1@example.com")),
        ("admin", Value::Bool(true)),
        ("company", Value::from("foo")),
        ("age", Value::Int(30)),
        ("note", Value::from("abc")),
        ("created_at", Value::Timestamp(created_at)),
    ]
    .into_iter()
    .collect();
    assert_eq!(admin1, expected);
}

#[rstest]
#[case(&["admin_users", "foo_users"])]
#[case(&["json/admin_users", "json/foo_users"])]
#[tokio::test]
async fn later_fixtures_override_fields(#[case] names: &[&str]) {
    let store = MemoryStore::new();
    FixtureLoader::new(config(FixtureFormat::Auto), store.clone())
        .load(names)
        .await
        .expect("load");

    assert_eq!(store.count("users"), 3);
    assert_eq!(store.count("companies"), 2);
    let admin1 = admin1(&store);
    assert_eq!(admin1.string_value("note"), Some("xyz"));
    assert_eq!(admin1.string_value("email"), Some("admin1@example.com"));
}

#[tokio::test]
async fn reversed_order_reverses_precedence() {
    let store = MemoryStore::new();
    FixtureLoader::new(config(FixtureFormat::Auto), store.clone())
        .load(&["foo_users", "admin_users"])
        .await
        .expect("load");
    assert_eq!(admin1(&store).string_value("note"), Some("abc"));
}

#[tokio::test]
async fn overriding_one_field_keeps_the_rest() {
    let root = TempDir::new().expect("create temp dir");
    fs::write(
        root.path().join("a.yaml"),
        "users:\n  admin1:\n    name: x\n    age: 1\n",
    )
    .expect("write a");
    fs::write(
        root.path().join("b.json"),
        r#"{"users": {"admin1": {"age": 2}}}"#,
    )
    .expect("write b");
    let store = MemoryStore::new();
    let config = FixtureConfig::builder().root_dir(root.path()).build();
    FixtureLoader::new(config, store.clone())
        .load(&["a", "b"])
        .await
        .expect("load");

    let expected: DocumentData = [
        (ID_FIELD, Value::from("admin1")),
        ("name", Value::from("x")),
        ("age", Value::Int(2)),
    ]
    .into_iter()
    .collect();
    assert_eq!(store.documents("users"), vec![expected]);
}

#[tokio::test]
async fn forced_format_rejects_other_syntax() {
    let err = FixtureLoader::new(config(FixtureFormat::Json), MemoryStore::new())
        .load(&["yaml/admin_users"])
        .await
        .expect_err("yaml parsed as json");
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[tokio::test]
async fn missing_fixture_makes_no_store_calls() {
    let store = RecordingStore::default();
    let err = FixtureLoader::new(config(FixtureFormat::Auto), store.clone())
        .load(&["admin_users", "json/nobody"])
        .await
        .expect_err("missing fixture");

    match err {
        FixtureError::NotFound { name, root } => {
            assert_eq!(name, "json/nobody");
            assert_eq!(root, fixture_root().join("json"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn empty_fixture_clears_existing_documents() {
    let root = TempDir::new().expect("create temp dir");
    fs::write(root.path().join("empty.json"), r#"{"users": {}}"#).expect("write fixture");
    let store = RecordingStore::default();
    let stale: DocumentData = [(ID_FIELD, Value::from("stale"))].into_iter().collect();
    store.inner.seed("users", vec![stale]);
    let config = FixtureConfig::builder().root_dir(root.path()).build();

    let report = FixtureLoader::new(config, store.clone())
        .load(&["empty"])
        .await
        .expect("load");

    assert_eq!(report.count("users"), Some(0));
    assert_eq!(store.inner.count("users"), 0);
    assert_eq!(
        store.calls(),
        ["open users", "drop users", "release users"]
    );
}

#[tokio::test]
async fn collections_reset_one_at_a_time_in_name_order() {
    let store = RecordingStore::default();
    FixtureLoader::new(config(FixtureFormat::Auto), store.clone())
        .load(&["admin_users"])
        .await
        .expect("load");
    assert_eq!(
        store.calls(),
        [
            "open companies",
            "drop companies",
            "insert companies x2",
            "release companies",
            "open users",
            "drop users",
            "insert users x2",
            "release users",
        ]
    );
}

#[tokio::test]
async fn store_failure_stops_later_collections_without_rollback() {
    let store = RecordingStore::failing_insert("users");
    let extra = TempDir::new().expect("create temp dir");
    fs::write(
        extra.path().join("all.yaml"),
        "audit:\n  a1:\n    event: seeded\nusers:\n  u1:\n    name: u\nzones:\n  z1:\n    name: z\n",
    )
    .expect("write fixture");
    let config = FixtureConfig::builder().root_dir(extra.path()).build();

    let err = FixtureLoader::new(config, store.clone())
        .load(&["all"])
        .await
        .expect_err("insert fails");

    assert!(matches!(
        err,
        FixtureError::Store { ref collection, operation: StoreOperation::Insert, .. }
            if collection == "users"
    ));
    assert_eq!(store.inner.count("audit"), 1);
    assert_eq!(store.inner.count("users"), 0);
    let calls = store.calls();
    assert!(calls.contains(&"release users".to_owned()));
    assert!(!calls.iter().any(|c| c.ends_with("zones")));
}

#[tokio::test]
async fn forced_format_loads_extensionless_fixture() {
    let root = TempDir::new().expect("create temp dir");
    fs::write(root.path().join("users"), r#"{"users": {"a": {"n": 1}}}"#).expect("write fixture");
    let store = MemoryStore::new();
    let config = FixtureConfig::builder()
        .root_dir(root.path())
        .format(FixtureFormat::Json)
        .build();

    let report = FixtureLoader::new(config, store.clone())
        .load(&["users"])
        .await
        .expect("load");

    assert_eq!(report.count("users"), Some(1));
    let doc = store.find("users", &Value::from("a")).expect("a stored");
    assert_eq!(doc.get("n"), Some(&Value::Int(1)));
}

#[tokio::test]
async fn detected_format_rejects_extensionless_fixture() {
    let root = TempDir::new().expect("create temp dir");
    fs::write(root.path().join("users"), r#"{"users": {"a": {"n": 1}}}"#).expect("write fixture");
    let store = RecordingStore::default();
    let config = FixtureConfig::builder().root_dir(root.path()).build();

    let err = FixtureLoader::new(config, store.clone())
        .load(&["users"])
        .await
        .expect_err("no extension to detect");

    assert!(matches!(err, FixtureError::UnknownFormat { ref path } if path.ends_with("users")));
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(store.calls().is_empty());
}
