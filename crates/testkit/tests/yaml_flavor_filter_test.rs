use schemectl_testkit::{TestCase, TestResult, matches_flavor, run_diff_test};

/// A fixture annotated for one flavor whose own assertions are wrong
/// (expects a change count that never happens on empty schemas). On a
/// matching flavor this should fail outright; on a mismatched flavor the
/// runner should treat the failure as an expected skip rather than a
/// real test failure.
fn self_contradicting_case(flavor: &str) -> TestCase {
    TestCase { flavor: Some(flavor.to_string()), expected_change_count: Some(99), ..TestCase::default() }
}

fn trivially_passing_case(flavor: &str) -> TestCase {
    TestCase { flavor: Some(flavor.to_string()), expected_change_count: Some(0), ..TestCase::default() }
}

#[test]
fn flavor_matcher_supports_positive_and_negative_requirements() {
    assert!(matches_flavor(Some("mysql"), "mysql"));
    assert!(!matches_flavor(Some("mysql"), "mariadb"));
    assert!(matches_flavor(Some("!oracle"), "postgresql"));
    assert!(!matches_flavor(Some("!oracle"), "oracle"));
    assert!(matches_flavor(None, "anything"));
}

#[test]
fn a_mismatched_flavor_whose_assertions_genuinely_fail_is_reported_as_skipped() {
    let fixture = self_contradicting_case("mysql");
    let result = run_diff_test(&fixture, "postgresql");
    assert!(matches!(result, TestResult::Skipped(_)), "got {result:?}");
}

#[test]
fn a_mismatched_flavor_whose_assertions_would_have_passed_is_reported_as_failed() {
    let fixture = trivially_passing_case("mysql");
    let result = run_diff_test(&fixture, "postgresql");
    assert!(matches!(result, TestResult::Failed(_)), "got {result:?}");
}

#[test]
fn a_matching_flavor_runs_its_assertions_for_real() {
    let fixture = trivially_passing_case("mysql");
    assert_eq!(run_diff_test(&fixture, "mysql"), TestResult::Passed);

    let broken = self_contradicting_case("mysql");
    assert!(matches!(run_diff_test(&broken, "mysql"), TestResult::Failed(_)));
}

#[test]
fn negative_flavor_requirements_gate_the_same_way() {
    let fixture = self_contradicting_case("!oracle");
    assert!(matches!(run_diff_test(&fixture, "sqlite"), TestResult::Failed(_)));
    assert!(matches!(run_diff_test(&fixture, "oracle"), TestResult::Skipped(_)));
}
