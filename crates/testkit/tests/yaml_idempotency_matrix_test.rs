use schemectl_testkit::{TestCase, TestResult, run_diff_test};

const SNAPSHOT: &str = r#"
provider: mysql
database_name: shop
analyzed_at: "2026-01-01T00:00:00Z"
tables:
  - name: carts
    schema_namespace: shop
    columns:
      - name: id
        data_type: { category: Integer }
        native_type: int
        nullable: false
        primary_key: true
        identity: true
      - name: total
        data_type: { category: Decimal, precision: 10, scale: 2 }
        native_type: decimal(10,2)
        nullable: false
        primary_key: false
        identity: false
    indexes: []
    constraints:
      - name: pk_carts
        kind: PrimaryKey
        table: carts
        columns: [id]
        referenced_table: null
        referenced_columns: []
        on_delete: null
        on_update: null
        check_expression: null
views: []
indexes: []
constraints: []
procedures: []
functions: []
"#;

fn schema() -> schemectl_core::DatabaseSchema {
    serde_yaml::from_str(SNAPSHOT).expect("snapshot should parse")
}

#[test]
fn diffing_a_schema_against_itself_is_idempotent() {
    let case = TestCase { current: schema(), desired: schema(), expected_change_count: Some(0), ..TestCase::default() };
    assert_eq!(run_diff_test(&case, "mysql"), TestResult::Passed);
}

#[test]
fn a_second_application_of_the_same_target_produces_no_further_changes() {
    let first_pass = schemectl_core::DiffEngine::new().diff(&schema(), &schema(), &schemectl_core::DiffConfig::new(true, Vec::new()));
    assert!(first_pass.changes.is_empty());
    assert!(first_pass.is_valid());
}
