use schemectl_testkit::{TestResult, load_test_cases_from_str, run_diff_test};

const MANIFEST: &str = r#"
add_column:
  current:
    provider: postgresql
    database_name: app
    analyzed_at: "2026-01-01T00:00:00Z"
    tables:
      - name: users
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
  desired:
    provider: postgresql
    database_name: app
    analyzed_at: "2026-01-01T00:00:00Z"
    tables:
      - name: users
        schema_namespace: public
        columns:
          - name: id
            data_type: { category: Integer }
            native_type: int4
            nullable: false
            primary_key: true
            identity: true
          - name: email
            data_type: { category: Varchar, size: 255 }
            native_type: varchar(255)
            nullable: true
            primary_key: false
            identity: false
        indexes: []
        constraints: []
    views: []
    indexes: []
    constraints: []
    procedures: []
    functions: []
  expected_changes:
    - operation: Alter
      object_kind: Column
      qualified_name: users.email
  expected_change_count: 1

no_changes_on_identical_schemas:
  current:
    provider: sqlite
    database_name: app
    analyzed_at: "2026-01-01T00:00:00Z"
    tables: []
    views: []
    indexes: []
    constraints: []
    procedures: []
    functions: []
  desired:
    provider: sqlite
    database_name: app
    analyzed_at: "2026-01-01T00:00:00Z"
    tables: []
    views: []
    indexes: []
    constraints: []
    procedures: []
    functions: []
  expected_change_count: 0
"#;

#[test]
fn manifest_parses_into_named_fixtures() {
    let cases = load_test_cases_from_str(MANIFEST).expect("manifest should parse");
    assert_eq!(cases.len(), 2);
    assert!(cases.contains_key("add_column"));
    assert!(cases.contains_key("no_changes_on_identical_schemas"));
}

#[test]
fn every_fixture_in_the_manifest_passes_against_its_own_expectations() {
    let cases = load_test_cases_from_str(MANIFEST).expect("manifest should parse");
    for (name, case) in &cases {
        let result = run_diff_test(case, &case.current.provider);
        assert_eq!(result, TestResult::Passed, "fixture `{name}` failed: {result:?}");
    }
}

#[test]
fn malformed_yaml_surfaces_a_configuration_error() {
    let error = load_test_cases_from_str("not: [valid, testcase").unwrap_err();
    assert!(error.to_string().contains("yaml"));
}
