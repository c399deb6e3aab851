//! Property tests for the persisted rollback log
//!
//! A sequence of registrations and removals applied to a `HistoryStore` must
//! leave the same entries, in the same order, as the same sequence applied to
//! an in-memory list that keeps newest first and drops beyond capacity.

use proptest::prelude::*;
use raptor_rollback::{
    decode, HistoryConfig, HistoryStore, Registrar, RollbackAction, RollbackKind,
};
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Debug, Clone)]
enum Op {
    Add(String),
    Rename(String, String),
    Migrate(Vec<String>),
    Remove(usize),
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}"
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        name_strategy().prop_map(Op::Add),
        (name_strategy(), name_strategy()).prop_map(|(a, b)| Op::Rename(a, b)),
        prop::collection::vec(name_strategy(), 1..4).prop_map(Op::Migrate),
        (0usize..8).prop_map(Op::Remove),
    ]
}

fn action_for(op: &Op) -> Option<(RollbackAction, String)> {
    match op {
        Op::Add(name) => Some((RollbackAction::add_model(name), format!("Added {}", name))),
        Op::Rename(old, new) => Some((
            RollbackAction::rename_model(old, new),
            format!("Renamed {} to {}", old, new),
        )),
        Op::Migrate(names) => Some((
            RollbackAction::migration(names.clone()),
            format!("Migrated {}", names.join(", ")),
        )),
        Op::Remove(_) => None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_log_matches_bounded_newest_first_list(
        capacity in 1usize..6,
        ops in prop::collection::vec(op_strategy(), 1..16),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let dir = TempDir::new().unwrap();
            let history = Arc::new(HistoryStore::for_project(
                dir.path(),
                HistoryConfig { capacity },
            ));
            let registrar = Registrar::new(history.clone());
            let mut expected: Vec<String> = Vec::new();

            for op in &ops {
                if let Op::Remove(index) = op {
                    let result = history.remove_at(*index).await;
                    if *index < expected.len() {
                        let removed = result.unwrap();
                        assert_eq!(removed.recovery_message, expected.remove(*index));
                    } else {
                        assert!(result.is_err());
                    }
                } else if let Some((action, message)) = action_for(op) {
                    assert!(registrar.register(action, message.clone()).await);
                    expected.insert(0, message);
                    expected.truncate(capacity);
                }

                let messages: Vec<String> = history
                    .read()
                    .await
                    .into_iter()
                    .map(|e| e.recovery_message)
                    .collect();
                assert_eq!(messages, expected);
            }
        });
    }

    #[test]
    fn prop_log_file_is_always_strict_json(
        ops in prop::collection::vec(op_strategy(), 1..10),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let dir = TempDir::new().unwrap();
            let history = Arc::new(HistoryStore::for_project(dir.path(), HistoryConfig::default()));
            history.ensure_exists().await.unwrap();
            let registrar = Registrar::new(history.clone());

            for op in &ops {
                if let Some((action, message)) = action_for(op) {
                    registrar.register(action, message).await;
                }
            }

            let text = tokio::fs::read_to_string(history.path()).await.unwrap();
            let entries = decode(&text).unwrap();
            assert!(entries.len() <= history.capacity());
            assert!(entries.iter().all(|e| RollbackKind::ALL.contains(&e.kind())));
        });
    }
}

#[tokio::test]
async fn test_registration_failure_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    // A directory where the log file should be makes every write fail
    let log_path = dir.path().join("log");
    tokio::fs::create_dir_all(log_path.join("child")).await.unwrap();

    let registrar = Registrar::new(Arc::new(HistoryStore::new(&log_path, HistoryConfig::default())));
    assert!(!registrar.register(RollbackAction::add_model("users"), "Added users").await);
    assert!(registrar
        .try_register(RollbackAction::add_model("users"), "Added users")
        .await
        .is_err());
}

#[test]
fn test_capacity_from_config_falls_back_to_default() {
    assert_eq!(HistoryConfig::from_configured(None).capacity, 5);
    assert_eq!(HistoryConfig::from_configured(Some(0)).capacity, 5);
    assert_eq!(HistoryConfig::from_configured(Some(-3)).capacity, 5);
    assert_eq!(HistoryConfig::from_configured(Some(2)).capacity, 2);
}
