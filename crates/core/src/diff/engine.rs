use crate::model::{DatabaseSchema, ValidationError, ValidationResult};

use super::{compare, compare_remaining, cycle, reserved_words};

#[derive(Debug, Clone)]
pub struct DiffConfig {
    pub cross_schema_reference_enabled: bool,
    pub reserved_words: Vec<String>,
}

impl DiffConfig {
    #[must_use]
    pub fn new(cross_schema_reference_enabled: bool, reserved_words: Vec<String>) -> Self {
        Self { cross_schema_reference_enabled, reserved_words }
    }

    #[must_use]
    pub(super) fn is_reserved(&self, name: &str) -> bool {
        reserved_words::is_reserved(name, &self.reserved_words)
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            cross_schema_reference_enabled: false,
            reserved_words: reserved_words::DEFAULT_RESERVED_WORDS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

#[derive(Debug, Default)]
pub struct DiffEngine;

impl DiffEngine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Structural comparison of `current` against `target` (§4.2). Output is
    /// deterministic for identical inputs: every comparison iterates a
    /// lexicographically sorted key set, never a hash-ordered one.
    #[must_use]
    #[tracing::instrument(skip_all, fields(tables = target.tables.len()))]
    pub fn diff(&self, current: &DatabaseSchema, target: &DatabaseSchema, config: &DiffConfig) -> ValidationResult {
        let mut changes = Vec::new();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        compare::compare_tables(current, target, config, &mut changes, &mut errors, &mut warnings);
        compare_remaining::compare_constraints(current, target, config, &mut changes, &mut errors, &mut warnings);
        compare_remaining::compare_indexes(current, target, &mut changes, &mut warnings);
        compare_remaining::compare_views(current, target, &mut changes, &mut warnings);
        compare_remaining::compare_procedures(current, target, &mut changes, &mut warnings);
        compare_remaining::compare_functions(current, target, &mut changes, &mut warnings);

        for cycle_path in cycle::find_cycles(&changes) {
            errors.push(ValidationError {
                code: "CIRCULAR_DEPENDENCY".to_string(),
                message: format!("circular dependency: {}", cycle_path.join(" -> ")),
                object_reference: cycle_path.first().cloned().unwrap_or_default(),
            });
        }

        // Deterministic output ordering: sort by (object_kind, operation, qualified_name).
        changes.sort_by(|a, b| {
            (a.object_kind as u8, a.operation as u8, &a.qualified_name).cmp(&(
                b.object_kind as u8,
                b.operation as u8,
                &b.qualified_name,
            ))
        });

        ValidationResult { changes, errors, warnings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConstraintKind, NormalizedType, SchemaColumn, SchemaConstraint, SchemaTable, TypeCategory};

    fn column(name: &str, category: TypeCategory, nullable: bool) -> SchemaColumn {
        SchemaColumn {
            name: name.to_string(),
            data_type: NormalizedType::simple(category),
            native_type: String::new(),
            nullable,
            primary_key: false,
            identity: false,
            max_length: None,
            precision: None,
            scale: None,
            default_value: None,
        }
    }

    fn table(name: &str, columns: Vec<SchemaColumn>) -> SchemaTable {
        SchemaTable {
            name: name.to_string(),
            schema_namespace: "dbo".to_string(),
            columns,
            indexes: Vec::new(),
            constraints: Vec::new(),
        }
    }

    #[test]
    fn detects_new_table_and_new_column() {
        let current = DatabaseSchema::empty("sqlserver", "app", "2026-01-01T00:00:00Z");
        let mut target = current.clone();
        target.tables.push(table("orders", vec![column("id", TypeCategory::Integer, false)]));

        let result = DiffEngine::new().diff(&current, &target, &DiffConfig::default());
        assert!(result.is_valid());
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].operation as u8, crate::model::OperationKind::Create as u8);
    }

    #[test]
    fn flags_missing_foreign_key_target_as_error() {
        let current = DatabaseSchema::empty("sqlserver", "app", "2026-01-01T00:00:00Z");
        let mut target = current.clone();
        target.tables.push(table("orders", vec![column("customer_id", TypeCategory::Integer, false)]));
        target.constraints.push(SchemaConstraint {
            name: "fk_orders_customer".to_string(),
            kind: ConstraintKind::ForeignKey,
            table: "orders".to_string(),
            columns: vec!["customer_id".to_string()],
            referenced_table: Some("customers".to_string()),
            referenced_columns: vec!["id".to_string()],
            on_delete: None,
            on_update: None,
            check_expression: None,
        });

        let result = DiffEngine::new().diff(&current, &target, &DiffConfig::default());
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.code == "MISSING_REFERENCED_TABLE"));
    }

    #[test]
    fn output_is_deterministic_across_repeated_diffs() {
        let current = DatabaseSchema::empty("sqlserver", "app", "2026-01-01T00:00:00Z");
        let mut target = current.clone();
        target.tables.push(table("b_table", vec![column("id", TypeCategory::Integer, false)]));
        target.tables.push(table("a_table", vec![column("id", TypeCategory::Integer, false)]));

        let config = DiffConfig::default();
        let first = DiffEngine::new().diff(&current, &target, &config);
        let second = DiffEngine::new().diff(&current, &target, &config);
        assert_eq!(first, second);
    }
}
