use schemectl_testkit::{TestCase, TestResult, run_diff_test};

const EMPTY: &str = r#"
provider: mysql
database_name: app
analyzed_at: "2026-01-01T00:00:00Z"
tables: []
views: []
indexes: []
constraints: []
procedures: []
functions: []
"#;

const TABLE_NAMED_ORDER: &str = r#"
provider: mysql
database_name: app
analyzed_at: "2026-01-01T00:00:00Z"
tables:
  - name: order
    schema_namespace: app
    columns:
      - name: group
        data_type: { category: Integer }
        native_type: int
        nullable: false
        primary_key: false
        identity: false
    indexes: []
    constraints: []
views: []
indexes: []
constraints: []
procedures: []
functions: []
"#;

#[test]
fn a_table_or_column_named_after_a_reserved_word_produces_quoting_warnings() {
    let case = TestCase {
        current: serde_yaml::from_str(EMPTY).unwrap(),
        desired: serde_yaml::from_str(TABLE_NAMED_ORDER).unwrap(),
        reserved_words: vec!["order".to_string(), "group".to_string()],
        expected_warning_codes: vec!["RESERVED_WORD_TABLE".to_string(), "RESERVED_WORD_COLUMN".to_string()],
        ..TestCase::default()
    };
    assert_eq!(run_diff_test(&case, "mysql"), TestResult::Passed);
}

#[test]
fn an_unreserved_name_produces_no_quoting_warnings() {
    let case = TestCase {
        current: serde_yaml::from_str(EMPTY).unwrap(),
        desired: serde_yaml::from_str(TABLE_NAMED_ORDER).unwrap(),
        reserved_words: Vec::new(),
        expected_warning_codes: vec![],
        ..TestCase::default()
    };
    let result = run_diff_test(&case, "mysql");
    assert_eq!(result, TestResult::Passed);
}
