//! Logs written by earlier releases use `type`/`data` and the `migrate` tag.

use raptor_rollback::{
    HistoryConfig, HistoryStore, RollbackAction, RollbackEntry, RollbackKind, LOG_FILE_NAME,
};
use tempfile::TempDir;

const LEGACY_LOG: &str = r#"[
  { "type": "migrate", "data": ["users", "posts"], "recoveryMessage": "Migrated users, posts" },
  { "type": "renameModel", "data": { "oldName": "post", "newName": "posts" }, "recoveryMessage": "Renamed post to posts" },
  { "type": "addModel", "data": { "modelName": "users" }, "recoveryMessage": "Added users" }
]"#;

#[tokio::test]
async fn legacy_records_are_read() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(LOG_FILE_NAME), LEGACY_LOG).unwrap();
    let history = HistoryStore::for_project(dir.path(), HistoryConfig::default());

    let entries = history.read().await;

    let kinds: Vec<RollbackKind> = entries.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![RollbackKind::Migration, RollbackKind::RenameModel, RollbackKind::AddModel]
    );
    assert_eq!(entries[0].action, RollbackAction::migration(["users", "posts"]));
    assert!(entries.iter().all(|e| e.recorded_at.is_none()));
}

#[tokio::test]
async fn appending_rewrites_legacy_log_in_current_format() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(LOG_FILE_NAME), LEGACY_LOG).unwrap();
    let history = HistoryStore::for_project(dir.path(), HistoryConfig { capacity: 3 });

    history
        .append(RollbackEntry::new(RollbackAction::add_model("tags"), "Added tags"))
        .await
        .unwrap();

    let text = std::fs::read_to_string(history.path()).unwrap();
    assert!(text.contains("\"kind\": \"addModel\""));
    assert!(text.contains("\"kind\": \"migration\""));
    assert!(!text.contains("\"type\""));

    let messages: Vec<String> = history.read().await.into_iter().map(|e| e.recovery_message).collect();
    assert_eq!(
        messages,
        vec!["Added tags", "Migrated users, posts", "Renamed post to posts"]
    );
}

#[tokio::test]
async fn unknown_kinds_are_skipped_with_a_warning() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(LOG_FILE_NAME),
        r#"[{ "kind": "seedData", "payload": {}, "recoveryMessage": "Seeded" },
            { "kind": "addModel", "payload": { "modelName": "a" }, "recoveryMessage": "Added a" }]"#,
    )
    .unwrap();
    let history = HistoryStore::for_project(dir.path(), HistoryConfig::default());

    let decoded = history.load().await.unwrap();

    assert_eq!(decoded.entries.len(), 1);
    assert_eq!(decoded.warnings.len(), 1);
    assert_eq!(decoded.warnings[0].kind, "seedData");
}
