use schemectl_testkit::{TestCase, TestResult, run_diff_test};

fn schema(yaml: &str) -> schemectl_core::DatabaseSchema {
    serde_yaml::from_str(yaml).expect("fixture schema should parse")
}

const EMPTY: &str = r#"
provider: postgresql
database_name: app
analyzed_at: "2026-01-01T00:00:00Z"
tables: []
views: []
indexes: []
constraints: []
procedures: []
functions: []
"#;

const ONE_TABLE: &str = r#"
provider: postgresql
database_name: app
analyzed_at: "2026-01-01T00:00:00Z"
tables:
  - name: orders
    schema_namespace: public
    columns:
      - name: id
        data_type: { category: Integer }
        native_type: int4
        nullable: false
        primary_key: true
        identity: true
    indexes: []
    constraints: []
views: []
indexes: []
constraints: []
procedures: []
functions: []
"#;

#[test]
fn creating_a_table_from_nothing_reports_a_safe_create() {
    let case = TestCase {
        current: schema(EMPTY),
        desired: schema(ONE_TABLE),
        expected_changes: serde_yaml::from_str("[{operation: Create, object_kind: Table, qualified_name: orders}]").unwrap(),
        expected_change_count: Some(1),
        max_risk: Some(schemectl_core::RiskLevel::Safe),
        ..TestCase::default()
    };
    assert_eq!(run_diff_test(&case, "postgresql"), TestResult::Passed);
}

#[test]
fn dropping_a_table_is_reported_as_risky_and_warned() {
    let case = TestCase {
        current: schema(ONE_TABLE),
        desired: schema(EMPTY),
        expected_changes: serde_yaml::from_str("[{operation: Drop, object_kind: Table, qualified_name: orders}]").unwrap(),
        expected_warning_codes: vec!["TABLE_DROP".to_string()],
        ..TestCase::default()
    };
    assert_eq!(run_diff_test(&case, "postgresql"), TestResult::Passed);
}

#[test]
fn a_max_risk_ceiling_lower_than_the_actual_change_fails_the_fixture() {
    let case = TestCase {
        current: schema(ONE_TABLE),
        desired: schema(EMPTY),
        max_risk: Some(schemectl_core::RiskLevel::Safe),
        ..TestCase::default()
    };
    assert!(matches!(run_diff_test(&case, "postgresql"), TestResult::Failed(_)));
}
