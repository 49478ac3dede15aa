//! YAML-driven fixtures and a diff test runner shared across dialect crates.
//!
//! A fixture pairs a `current` and `desired` `DatabaseSchema` with the
//! changes, validation codes, and risk ceiling the differ is expected to
//! produce. [`run_diff_test`] runs the real `DiffEngine` against the pair
//! and checks the result; [`matches_flavor`] lets one YAML document cover
//! several providers while excluding (or requiring) a specific one.

mod yaml_runner;

pub use yaml_runner::{ExpectedChange, TestCase, TestResult, load_test_cases_from_str, matches_flavor, run_diff_test};
