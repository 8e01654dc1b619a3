//! End-to-end bulk insert behavior against the mock executor

use proptest::prelude::*;
use rowpack_engine::{BulkInserter, RuleSet};
use rowpack_test_utils::assertions::*;
use rowpack_test_utils::fixtures::*;
use rowpack_test_utils::generators::*;
use rowpack_test_utils::*;
use serde::Serialize;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("build runtime")
}

#[tokio::test]
async fn inserts_one_raw_mapping_in_one_statement() {
    let executor = MockExecutor::new();
    let inserter = BulkInserter::new(&executor, sample_records_table());

    let inserted = inserter
        .bulk_insert(
            &[Row::new().with("name", "Foo").with("age", 30)],
            &InsertOptions::default(),
        )
        .await
        .expect("insert");

    assert_eq!(inserted, 1);
    let statements = executor.statements();
    assert_eq!(statements.len(), 1);
    assert_eq!(
        statements[0],
        r#"INSERT INTO "sample_records" ("name", "age") VALUES ('Foo', 30)"#
    );
}

#[tokio::test]
async fn inserts_five_records_in_one_statement() {
    let executor = MockExecutor::new();
    let inserter = BulkInserter::new(&executor, sample_records_table());

    let inserted = inserter
        .bulk_insert(&sample_rows(5, 4), &InsertOptions::default())
        .await
        .expect("insert");

    assert_eq!(inserted, 5);
    assert_eq!(executor.rows_inserted(), 5);
    assert_eq!(executor.statement_count(), 1);
}

#[tokio::test]
async fn ten_records_share_a_single_insert() {
    let executor = MockExecutor::new();
    let inserter = BulkInserter::new(&executor, sample_records_table());

    inserter
        .bulk_insert(&sample_rows(10, 7), &InsertOptions::default())
        .await
        .expect("insert");

    let sql = &executor.statements()[0];
    assert_single_insert(sql, SAMPLE_TABLE);
    assert_row_tuples(sql, 10);
    for i in 0..10 {
        assert!(sql.contains(&format!("'Foo{}'", i)), "missing Foo{} in {}", i, sql);
    }
}

#[tokio::test]
async fn primary_key_is_dropped_unless_requested() {
    let executor = MockExecutor::new();
    let inserter = BulkInserter::new(&executor, sample_records_table());
    let records = sample_records_with_ids(5, 1001);

    inserter
        .bulk_insert(&records, &InsertOptions::default())
        .await
        .expect("insert");
    let sql = executor.statements().remove(0);
    assert!(!sql.contains(r#""id""#));
    assert!(!sql.contains("1001"));

    executor.clear();
    inserter
        .bulk_insert(&records, &InsertOptions::new().use_provided_primary_key(true))
        .await
        .expect("insert");
    let sql = executor.statements().remove(0);
    assert!(sql.starts_with(r#"INSERT INTO "sample_records" ("id", "name", "age")"#));
    for id in 1001..1006 {
        assert!(sql.contains(&format!("({}, ", id)));
    }
}

#[tokio::test]
async fn accepts_structured_records() {
    let executor = MockExecutor::new();
    let inserter = BulkInserter::new(&executor, sample_records_table());
    let records = vec![SampleRecord::new("Foo", 30), SampleRecord::new("Bar", 31)];

    let inserted = inserter
        .bulk_insert(&records, &InsertOptions::default())
        .await
        .expect("insert");

    assert_eq!(inserted, 2);
    assert_eq!(
        executor.statements()[0],
        r#"INSERT INTO "sample_records" ("name", "age") VALUES ('Foo', 30), ('Bar', 31)"#
    );
}

#[tokio::test]
async fn accepts_serializable_attributes() {
    #[derive(Serialize)]
    struct Partial {
        age: i32,
    }

    let executor = MockExecutor::new();
    let inserter = BulkInserter::new(&executor, sample_records_table());
    let records = vec![Attributes(Partial { age: 1 }), Attributes(Partial { age: 2 })];

    inserter
        .bulk_insert(&records, &InsertOptions::default())
        .await
        .expect("insert");

    assert_eq!(
        executor.statements()[0],
        r#"INSERT INTO "sample_records" ("age") VALUES (1), (2)"#
    );
}

#[tokio::test]
async fn invalid_records_are_skipped_when_validating() {
    let executor = MockExecutor::new();
    let rules = RuleSet::new().presence("name");
    let inserter = BulkInserter::new(&executor, sample_records_table()).with_validator(&rules);
    let records = vec![
        Row::new().with("name", Value::Null).with("age", 5),
        Row::new().with("age", 6),
    ];

    let report = inserter
        .insert(&records, &InsertOptions::new().validate(true))
        .await
        .expect("insert");

    assert_eq!(report.rows_inserted, 0);
    assert_eq!(report.skipped_invalid, 2);
    assert_eq!(executor.statement_count(), 0);
}

#[tokio::test]
async fn validation_is_off_by_default() {
    let executor = MockExecutor::new();
    let rules = RuleSet::new().presence("name");
    let inserter = BulkInserter::new(&executor, sample_records_table()).with_validator(&rules);

    let inserted = inserter
        .bulk_insert(&[Row::new().with("age", 6)], &InsertOptions::default())
        .await
        .expect("insert");

    assert_eq!(inserted, 1);
}

#[tokio::test]
async fn batches_ten_records_into_five_statements() {
    let executor = MockExecutor::new();
    let inserter = BulkInserter::new(&executor, sample_records_table());

    let inserted = inserter
        .bulk_insert_in_batches(&sample_rows(10, 3), &InsertOptions::new().batch_size(2))
        .await
        .expect("insert");

    assert_eq!(inserted, 10);
    let statements = executor.statements();
    assert_eq!(statements.len(), 5);
    for sql in &statements {
        assert_single_insert(sql, SAMPLE_TABLE);
        assert_row_tuples(sql, 2);
    }
}

#[tokio::test]
async fn unknown_column_aborts_before_execution() {
    let executor = MockExecutor::new();
    let inserter = BulkInserter::new(&executor, sample_records_table());
    let mut rows = sample_rows(4, 1);
    rows.push(Row::new().with("nickname", "x"));

    let result = inserter
        .bulk_insert_in_batches(&rows, &InsertOptions::new().batch_size(2))
        .await;

    assert_unknown_column(&result, "nickname");
    assert_eq!(executor.statement_count(), 0);
}

#[tokio::test]
async fn unsupported_value_aborts_before_execution() {
    let executor = MockExecutor::new();
    let inserter = BulkInserter::new(&executor, sample_records_table());
    let rows = vec![Row::new().with("name", "a\0b")];

    let result = inserter.bulk_insert(&rows, &InsertOptions::default()).await;

    assert_unsupported_type(&result);
    assert_eq!(executor.statement_count(), 0);
}

#[tokio::test]
async fn failing_batch_stops_the_rest() {
    let executor = MockExecutor::failing_at(1);
    let inserter = BulkInserter::new(&executor, sample_records_table());

    let result = inserter
        .bulk_insert_in_batches(&sample_rows(6, 2), &InsertOptions::new().batch_size(2))
        .await;

    assert_execution_failed(&result);
    assert_eq!(executor.statement_count(), 1);
    assert_eq!(executor.rows_inserted(), 2);
}

#[tokio::test]
async fn empty_input_executes_nothing() {
    let executor = MockExecutor::new();
    let inserter = BulkInserter::new(&executor, sample_records_table());

    let inserted = inserter
        .bulk_insert(&Vec::<Row>::new(), &InsertOptions::default())
        .await
        .expect("insert");

    assert_eq!(inserted, 0);
    assert_eq!(executor.statement_count(), 0);
}

#[tokio::test]
async fn records_without_columns_insert_defaults() {
    let executor = MockExecutor::new();
    let inserter = BulkInserter::new(&executor, sample_records_table());

    let inserted = inserter
        .bulk_insert(&[Row::new(), Row::new()], &InsertOptions::default())
        .await
        .expect("insert");

    assert_eq!(inserted, 2);
    assert_eq!(
        executor.statements()[0],
        r#"INSERT INTO "sample_records" ("id") VALUES (DEFAULT), (DEFAULT)"#
    );
}

#[tokio::test]
async fn loads_table_from_catalog() {
    let executor = MockExecutor::new();
    let catalog = sample_catalog();
    let inserter = BulkInserter::load(&catalog, &executor, SAMPLE_TABLE)
        .await
        .expect("load");

    inserter
        .bulk_insert(&sample_rows(3, 9), &InsertOptions::default())
        .await
        .expect("insert");

    assert_eq!(executor.rows_inserted(), 3);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Statement count is ceil(n / batch_size) and each batch is a single
    /// insert carrying every value verbatim.
    #[test]
    fn prop_batches_cover_every_record(
        rows in arb_complete_sample_rows(40),
        batch_size in 1usize..12,
    ) {
        let executor = MockExecutor::new();
        let inserter = BulkInserter::new(&executor, sample_records_table());
        let options = InsertOptions::new().batch_size(batch_size);

        let inserted = runtime()
            .block_on(inserter.bulk_insert_in_batches(&rows, &options))
            .expect("insert");

        let statements = executor.statements();
        prop_assert_eq!(inserted, rows.len() as u64);
        prop_assert_eq!(statements.len(), rows.len().div_ceil(batch_size));

        for (sql, chunk) in statements.iter().zip(rows.chunks(batch_size)) {
            prop_assert_eq!(sql.matches("INSERT INTO").count(), 1);
            prop_assert_eq!(count_value_tuples(sql), chunk.len() as u64);
            for row in chunk {
                let name = row.get("name").and_then(Value::as_str).unwrap_or_default();
                let needle = format!("'{}'", name);
                prop_assert!(sql.contains(&needle), "missing {} in {}", needle, sql);
            }
        }
    }

    /// Mixed row shapes still produce one statement with NULL filling gaps.
    #[test]
    fn prop_mixed_shapes_single_statement(
        rows in proptest::collection::vec(arb_sample_row(), 1..20),
    ) {
        let executor = MockExecutor::new();
        let inserter = BulkInserter::new(&executor, sample_records_table());

        let inserted = runtime()
            .block_on(inserter.bulk_insert(&rows, &InsertOptions::default()))
            .expect("insert");

        prop_assert_eq!(inserted, rows.len() as u64);
        prop_assert_eq!(executor.statement_count(), 1);
    }
}
