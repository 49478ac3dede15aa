use schemectl_testkit::{TestCase, load_test_cases_from_str};

#[test]
fn a_bare_fixture_defaults_every_optional_expectation_to_empty() {
    let case = TestCase::default();
    assert!(case.expected_changes.is_empty());
    assert!(case.expected_change_count.is_none());
    assert!(case.expected_error_codes.is_empty());
    assert!(case.expected_warning_codes.is_empty());
    assert!(case.max_risk.is_none());
    assert!(case.flavor.is_none());
    assert!(case.reserved_words.is_empty());
}

#[test]
fn fixtures_may_omit_every_field_but_current_and_desired() {
    let yaml = r#"
minimal:
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
"#;
    let cases = load_test_cases_from_str(yaml).expect("minimal fixture should parse");
    let case = &cases["minimal"];
    assert_eq!(case.current.provider, "sqlite");
    assert!(case.expected_changes.is_empty());
}

#[test]
fn an_unknown_field_is_rejected_rather_than_silently_ignored() {
    let yaml = r#"
broken:
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
  typo_field: true
"#;
    assert!(load_test_cases_from_str(yaml).is_err());
}
