use std::collections::BTreeMap;

use schemectl_core::{DatabaseSchema, DiffConfig, DiffEngine, Error, ObjectKind, OperationKind, Result, RiskLevel};
use serde::Deserialize;

/// One expected entry in a diff's change set. Matched against the actual
/// `SchemaChange` list by `(operation, object_kind, qualified_name)` —
/// the same triple the differ sorts by, so fixtures read in the order the
/// engine is expected to emit them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedChange {
    pub operation: OperationKind,
    pub object_kind: ObjectKind,
    pub qualified_name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestCase {
    pub current: DatabaseSchema,
    pub desired: DatabaseSchema,
    pub expected_changes: Vec<ExpectedChange>,
    pub expected_change_count: Option<usize>,
    pub expected_error_codes: Vec<String>,
    pub expected_warning_codes: Vec<String>,
    pub max_risk: Option<RiskLevel>,
    pub flavor: Option<String>,
    pub reserved_words: Vec<String>,
}

impl Default for TestCase {
    fn default() -> Self {
        Self {
            current: DatabaseSchema::empty("", "", ""),
            desired: DatabaseSchema::empty("", "", ""),
            expected_changes: Vec::new(),
            expected_change_count: None,
            expected_error_codes: Vec::new(),
            expected_warning_codes: Vec::new(),
            max_risk: None,
            flavor: None,
            reserved_words: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    Passed,
    Skipped(String),
    Failed(String),
}

pub fn load_test_cases_from_str(yaml: &str) -> Result<BTreeMap<String, TestCase>> {
    serde_yaml::from_str(yaml).map_err(parse_yaml_error)
}

pub fn matches_flavor(requirement: Option<&str>, current_flavor: &str) -> bool {
    let Some(requirement) = requirement.map(str::trim).filter(|value| !value.is_empty()) else {
        return true;
    };

    if let Some(excluded_flavor) = requirement.strip_prefix('!') {
        return excluded_flavor != current_flavor;
    }

    requirement == current_flavor
}

/// Runs one fixture's diff against the real `DiffEngine` and checks it
/// against the fixture's expectations. `current_flavor` is the provider
/// name under test (`"postgresql"`, `"mysql"`, ...); a fixture whose
/// `flavor` requirement doesn't match is expected to fail its own
/// assertions, mirroring how the dialect surface is exercised per-provider.
pub fn run_diff_test(test: &TestCase, current_flavor: &str) -> TestResult {
    let flavor_requirement = test.flavor.as_deref();
    let expect_failure = !matches_flavor(flavor_requirement, current_flavor);
    let execution_result = run_diff_test_impl(test);

    if expect_failure {
        return match execution_result {
            Err(_) | Ok(TestResult::Failed(_)) => TestResult::Skipped(format!(
                "correctly fails on non-matching flavor (requires '{}', running on '{current_flavor}')",
                flavor_requirement.unwrap_or_default()
            )),
            Ok(TestResult::Passed | TestResult::Skipped(_)) => TestResult::Failed(format!(
                "fixture passed but flavor '{}' does not match current flavor '{current_flavor}'",
                flavor_requirement.unwrap_or_default()
            )),
        };
    }

    match execution_result {
        Ok(result) => result,
        Err(error) => TestResult::Failed(error.to_string()),
    }
}

fn run_diff_test_impl(test: &TestCase) -> Result<TestResult> {
    let engine = DiffEngine::new();
    let config = DiffConfig::new(true, test.reserved_words.clone());
    let outcome = engine.diff(&test.current, &test.desired, &config);

    if let Some(expected_count) = test.expected_change_count {
        if outcome.changes.len() != expected_count {
            return Ok(TestResult::Failed(format!("expected {expected_count} changes, found {}", outcome.changes.len())));
        }
    }

    for expected in &test.expected_changes {
        let found = outcome
            .changes
            .iter()
            .any(|c| c.operation == expected.operation && c.object_kind == expected.object_kind && c.qualified_name == expected.qualified_name);
        if !found {
            return Ok(TestResult::Failed(format!("expected change not found: {expected:?}")));
        }
    }

    for code in &test.expected_error_codes {
        if !outcome.errors.iter().any(|e| &e.code == code) {
            return Ok(TestResult::Failed(format!("expected validation error code `{code}` not found")));
        }
    }

    for code in &test.expected_warning_codes {
        if !outcome.warnings.iter().any(|w| &w.code == code) {
            return Ok(TestResult::Failed(format!("expected validation warning code `{code}` not found")));
        }
    }

    if let Some(max_risk) = test.max_risk {
        let actual_max = RiskLevel::max_of(outcome.changes.iter().map(|c| c.risk_level));
        if actual_max > max_risk {
            return Ok(TestResult::Failed(format!("risk level {actual_max:?} exceeds fixture max {max_risk:?}")));
        }
    }

    Ok(TestResult::Passed)
}

fn parse_yaml_error(source: serde_yaml::Error) -> Error {
    Error::configuration(format!("failed to parse yaml testcase fixture: {source}"))
}
