//! Deleting a model and rolling it back restores the table definition, the
//! rows and the model file, for any column layout and row contents, on a real
//! SQLite database and real files.

use proptest::prelude::*;
use raptor_files::LocalFiles;
use raptor_rollback::{
    parse_model_fields, ColumnDef, FilePrimitives, HistoryConfig, HistoryStore, ModelLayout,
    Registrar, RollbackAction, RowValue, SchemaStore, UndoEngine,
};
use raptor_storage::SqliteSchemaStore;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use tempfile::TempDir;

const TYPES: [&str; 3] = ["INTEGER", "TEXT", "REAL"];

fn columns_strategy() -> impl Strategy<Value = Vec<ColumnDef>> {
    prop::collection::btree_set(
        "[a-z][a-z0-9_]{0,6}".prop_filter("implicit rowid alias", |n| {
            !matches!(n.as_str(), "rowid" | "oid" | "_rowid_")
        }),
        1..5,
    )
    .prop_flat_map(|names: BTreeSet<String>| {
        let names: Vec<String> = names.into_iter().collect();
        let count = names.len();
        (Just(names), prop::collection::vec(0usize..TYPES.len(), count))
    })
    .prop_map(|(names, types)| {
        names
            .into_iter()
            .zip(types)
            .map(|(name, t)| ColumnDef::new(name, TYPES[t]))
            .collect()
    })
}

fn value_strategy(sql_type: &str) -> BoxedStrategy<RowValue> {
    let value = match sql_type {
        "INTEGER" => any::<i64>().prop_map(|i| json!(i)).boxed(),
        "REAL" => (-1.0e6f64..1.0e6).prop_map(|f| json!(f)).boxed(),
        _ => "[ -~]{0,12}".prop_map(|s| json!(s)).boxed(),
    };
    prop_oneof![1 => Just(RowValue::Null), 4 => value].boxed()
}

fn table_strategy() -> impl Strategy<Value = (Vec<ColumnDef>, Vec<Vec<RowValue>>)> {
    columns_strategy().prop_flat_map(|columns| {
        let row: Vec<BoxedStrategy<RowValue>> =
            columns.iter().map(|c| value_strategy(&c.sql_type)).collect();
        (Just(columns), prop::collection::vec(row, 0..6))
    })
}

/// Floats that happen to be whole numbers come back from SQLite as reals;
/// compare numerically so `2` and `2.0` match in REAL columns.
fn same_value(a: &RowValue, b: &RowValue) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_delete_then_undo_restores_table_rows_and_file(
        (columns, rows) in table_strategy(),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let dir = TempDir::new().unwrap();
            let schema = Arc::new(SqliteSchemaStore::open(dir.path().join("db.sqlite")).unwrap());
            let files = Arc::new(LocalFiles::new());
            let layout = ModelLayout::for_project(dir.path(), "js");
            let history = Arc::new(HistoryStore::for_project(dir.path(), HistoryConfig::default()));
            history.ensure_exists().await.unwrap();

            schema.create_table("things", &columns).await.unwrap();
            for row in &rows {
                let values: Vec<(String, RowValue)> = columns
                    .iter()
                    .map(|c| c.name.clone())
                    .zip(row.iter().cloned())
                    .collect();
                schema.insert_row("things", &values).await.unwrap();
            }
            let path = layout.model_path("things");
            files
                .write_file(&path, &raptor_rollback::render_model_file("things", &columns))
                .await
                .unwrap();

            // Capture, delete, then record, as the delete-model command does
            let described = schema.describe_table("things").await.unwrap();
            let names: Vec<String> = described.iter().map(|c| c.name.clone()).collect();
            let captured = schema.fetch_rows("things", &names).await.unwrap();
            files.delete_file(&path).await.unwrap();
            schema.drop_table("things").await.unwrap();
            assert!(Registrar::new(history.clone())
                .register(RollbackAction::delete_model("things", &described, captured), "Deleted model things")
                .await);

            let entry = history.read().await.remove(0);
            UndoEngine::new(schema.clone(), files.clone(), layout.clone())
                .undo(&entry)
                .await
                .unwrap();

            assert_eq!(schema.describe_table("things").await.unwrap(), columns);
            let restored = schema.fetch_rows("things", &names).await.unwrap();
            assert_eq!(restored.len(), rows.len());
            for (got, want) in restored.iter().zip(&rows) {
                assert_eq!(got.len(), want.len());
                assert!(got.iter().zip(want).all(|(g, w)| same_value(g, w)), "{:?} != {:?}", got, want);
            }
            let source = files.read_file(&path).await.unwrap();
            assert_eq!(parse_model_fields(&source), Some(columns.clone()));
        });
    }
}
