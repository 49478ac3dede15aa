use std::collections::BTreeMap;

use crate::model::{
    ConstraintKind, DatabaseSchema, ObjectKind, OperationKind, RiskLevel, SchemaChange,
    SchemaConstraint, SchemaFunction, SchemaIndex, SchemaProcedure, SchemaView, ValidationError,
    ValidationWarning,
};

use super::engine::DiffConfig;

fn change(
    operation: OperationKind,
    object_kind: ObjectKind,
    qualified_name: impl Into<String>,
    schema_namespace: impl Into<String>,
    description: impl Into<String>,
    risk_level: RiskLevel,
) -> SchemaChange {
    SchemaChange {
        operation,
        object_kind,
        qualified_name: qualified_name.into(),
        schema_namespace: schema_namespace.into(),
        description: description.into(),
        risk_level,
        properties: BTreeMap::new(),
        sql_command: String::new(),
        rollback_sql: None,
        dependencies: Vec::new(),
    }
}

fn constraint_key(c: &SchemaConstraint) -> String {
    format!("{}.{}", c.table.to_ascii_lowercase(), c.name.to_ascii_lowercase())
}

/// Splits `"schema.name"` into `(Some(schema), name)`, or `(None, name)` if
/// unqualified (meaning: same schema as the owning table).
fn split_schema_qualified(value: &str) -> (Option<&str>, &str) {
    match value.split_once('.') {
        Some((schema, name)) => (Some(schema), name),
        None => (None, value),
    }
}

pub(super) fn compare_constraints(
    current: &DatabaseSchema,
    target: &DatabaseSchema,
    config: &DiffConfig,
    changes: &mut Vec<SchemaChange>,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let mut keys: Vec<String> = current
        .constraints
        .iter()
        .chain(target.constraints.iter())
        .map(constraint_key)
        .collect();
    keys.sort();
    keys.dedup();

    for key in &keys {
        let current_c = current.constraints.iter().find(|c| &constraint_key(c) == key);
        let target_c = target.constraints.iter().find(|c| &constraint_key(c) == key);

        match (current_c, target_c) {
            (None, Some(target_c)) => create_constraint(target, target_c, config, changes, errors, warnings),
            (Some(current_c), None) => drop_constraint(current, current_c, changes, warnings),
            (Some(_), Some(_)) => {}
            (None, None) => unreachable!(),
        }
    }
}

fn create_constraint(
    target_schema: &DatabaseSchema,
    c: &SchemaConstraint,
    config: &DiffConfig,
    changes: &mut Vec<SchemaChange>,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let risk = match c.kind {
        ConstraintKind::PrimaryKey => RiskLevel::Safe,
        ConstraintKind::Unique | ConstraintKind::ForeignKey | ConstraintKind::Check => RiskLevel::Warning,
    };
    let qualified_name = format!("{}.{}", c.table, c.name);
    let mut op = change(
        OperationKind::Create,
        ObjectKind::Constraint,
        qualified_name.clone(),
        owning_schema_namespace(target_schema, &c.table),
        format!("create constraint `{}` on `{}`", c.name, c.table),
        risk,
    );
    op.set_property("constraint_type", constraint_type_tag(c.kind));
    op.set_json_property("constraint", c);
    if let Some(table) = target_schema.tables.iter().find(|t| t.name.eq_ignore_ascii_case(&c.table)) {
        op.set_json_property("table", table);
    }
    changes.push(op);

    if c.kind == ConstraintKind::ForeignKey {
        validate_foreign_key(target_schema, c, config, errors, warnings);
    }
}

fn owning_schema_namespace(schema: &DatabaseSchema, table: &str) -> String {
    schema
        .tables
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(table))
        .map(|t| t.schema_namespace.clone())
        .unwrap_or_default()
}

fn validate_foreign_key(
    target_schema: &DatabaseSchema,
    c: &SchemaConstraint,
    config: &DiffConfig,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let Some(referenced) = c.referenced_table.as_deref() else { return };
    let owning_namespace = owning_schema_namespace(target_schema, &c.table);
    let (referenced_schema, referenced_name) = split_schema_qualified(referenced);
    let referenced_namespace = referenced_schema.unwrap_or(&owning_namespace);

    let Some(referenced_table) = target_schema
        .tables
        .iter()
        .find(|t| t.schema_namespace.eq_ignore_ascii_case(referenced_namespace) && t.name.eq_ignore_ascii_case(referenced_name))
    else {
        errors.push(ValidationError {
            code: "MISSING_REFERENCED_TABLE".to_string(),
            message: format!("foreign key `{}` references missing table `{}`", c.name, referenced),
            object_reference: format!("{}.{}", c.table, c.name),
        });
        return;
    };

    for column in &c.referenced_columns {
        if referenced_table.column(column).is_none() {
            errors.push(ValidationError {
                code: "MISSING_REFERENCED_COLUMN".to_string(),
                message: format!("foreign key `{}` references missing column `{}.{}`", c.name, referenced, column),
                object_reference: format!("{}.{}", c.table, c.name),
            });
        }
    }

    if !config.cross_schema_reference_enabled && !referenced_namespace.eq_ignore_ascii_case(&owning_namespace) {
        warnings.push(ValidationWarning {
            code: "CROSS_SCHEMA_REFERENCE_DISABLED".to_string(),
            message: format!("foreign key `{}` spans schema namespaces but cross-schema references are disabled", c.name),
            object_reference: format!("{}.{}", c.table, c.name),
            risk_level: Some(RiskLevel::Warning),
        });
    }
}

fn drop_constraint(current_schema: &DatabaseSchema, c: &SchemaConstraint, changes: &mut Vec<SchemaChange>, warnings: &mut Vec<ValidationWarning>) {
    let (risk, warning_code) = match c.kind {
        ConstraintKind::PrimaryKey => (RiskLevel::Risky, Some("PRIMARY_KEY_DROP")),
        ConstraintKind::Unique => (RiskLevel::Warning, None),
        ConstraintKind::ForeignKey | ConstraintKind::Check => (RiskLevel::Safe, None),
    };
    let qualified_name = format!("{}.{}", c.table, c.name);
    let mut op = change(
        OperationKind::Drop,
        ObjectKind::Constraint,
        qualified_name.clone(),
        String::new(),
        format!("drop constraint `{}` from `{}`", c.name, c.table),
        risk,
    );
    op.set_property("constraint_type", constraint_type_tag(c.kind));
    op.set_json_property("constraint", c);
    if let Some(table) = current_schema.tables.iter().find(|t| t.name.eq_ignore_ascii_case(&c.table)) {
        op.set_json_property("table", table);
    }
    changes.push(op);

    if let Some(code) = warning_code {
        warnings.push(ValidationWarning {
            code: code.to_string(),
            message: format!("constraint `{}` ({code}) will be dropped", c.name),
            object_reference: qualified_name,
            risk_level: Some(risk),
        });
    }
}

fn constraint_type_tag(kind: ConstraintKind) -> &'static str {
    match kind {
        ConstraintKind::PrimaryKey => "PK",
        ConstraintKind::Unique => "UQ",
        ConstraintKind::ForeignKey => "FK",
        ConstraintKind::Check => "CK",
    }
}

fn index_key(i: &SchemaIndex) -> String {
    format!("{}.{}", i.table.to_ascii_lowercase(), i.name.to_ascii_lowercase())
}

pub(super) fn compare_indexes(
    current: &DatabaseSchema,
    target: &DatabaseSchema,
    changes: &mut Vec<SchemaChange>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let mut keys: Vec<String> = current.indexes.iter().chain(target.indexes.iter()).map(index_key).collect();
    keys.sort();
    keys.dedup();

    for key in &keys {
        let current_i = current.indexes.iter().find(|i| &index_key(i) == key);
        let target_i = target.indexes.iter().find(|i| &index_key(i) == key);

        match (current_i, target_i) {
            (None, Some(i)) => index_change(OperationKind::Create, i, changes, warnings, "CLUSTERED_INDEX_CREATE"),
            (Some(i), None) => index_change(OperationKind::Drop, i, changes, warnings, "CLUSTERED_INDEX_DROP"),
            (Some(_), Some(_)) => {}
            (None, None) => unreachable!(),
        }
    }
}

fn index_change(
    operation: OperationKind,
    index: &SchemaIndex,
    changes: &mut Vec<SchemaChange>,
    warnings: &mut Vec<ValidationWarning>,
    clustered_warning_code: &str,
) {
    let risk = if index.clustered { RiskLevel::Warning } else { RiskLevel::Safe };
    let verb = if operation == OperationKind::Create { "create" } else { "drop" };
    let mut op = change(
        operation,
        ObjectKind::Index,
        format!("{}.{}", index.table, index.name),
        String::new(),
        format!("{verb} index `{}` on `{}`", index.name, index.table),
        risk,
    );
    op.set_property("is_clustered", index.clustered.to_string());
    op.set_property("is_unique", index.unique.to_string());
    op.set_json_property("index", index);
    changes.push(op);

    if index.clustered {
        warnings.push(ValidationWarning {
            code: clustered_warning_code.to_string(),
            message: format!("index `{}` is clustered", index.name),
            object_reference: format!("{}.{}", index.table, index.name),
            risk_level: Some(RiskLevel::Warning),
        });
    }
}

fn normalized_definition(definition: &str) -> String {
    definition.trim().to_ascii_lowercase()
}

pub(super) fn compare_views(
    current: &DatabaseSchema,
    target: &DatabaseSchema,
    changes: &mut Vec<SchemaChange>,
    warnings: &mut Vec<ValidationWarning>,
) {
    named_object_diff(
        &current.views,
        &target.views,
        |v: &SchemaView| (v.schema_namespace.clone(), v.name.clone()),
        |v| normalized_definition(&v.definition),
        |v: &SchemaView| serde_json::to_string(v).unwrap_or_default(),
        ObjectKind::View,
        RiskLevel::Safe,
        None,
        changes,
        warnings,
    );
}

pub(super) fn compare_procedures(
    current: &DatabaseSchema,
    target: &DatabaseSchema,
    changes: &mut Vec<SchemaChange>,
    warnings: &mut Vec<ValidationWarning>,
) {
    named_object_diff(
        &current.procedures,
        &target.procedures,
        |p: &SchemaProcedure| (p.schema_namespace.clone(), p.name.clone()),
        |p| normalized_definition(&p.definition),
        |p: &SchemaProcedure| serde_json::to_string(p).unwrap_or_default(),
        ObjectKind::Procedure,
        RiskLevel::Safe,
        Some("PROCEDURE_DROP"),
        changes,
        warnings,
    );
}

pub(super) fn compare_functions(
    current: &DatabaseSchema,
    target: &DatabaseSchema,
    changes: &mut Vec<SchemaChange>,
    warnings: &mut Vec<ValidationWarning>,
) {
    named_object_diff(
        &current.functions,
        &target.functions,
        |f: &SchemaFunction| (f.schema_namespace.clone(), f.name.clone()),
        |f| normalized_definition(&f.definition),
        |f: &SchemaFunction| serde_json::to_string(f).unwrap_or_default(),
        ObjectKind::Function,
        RiskLevel::Safe,
        Some("FUNCTION_DROP"),
        changes,
        warnings,
    );
}

/// Shared CREATE/DROP/ALTER-by-definition-diff logic for views, procedures,
/// and functions (§4.2): create is Safe, drop may warn, and a definition
/// change (case-insensitive, trimmed) becomes an ALTER.
#[allow(clippy::too_many_arguments)]
fn named_object_diff<T>(
    current: &[T],
    target: &[T],
    key_of: impl Fn(&T) -> (String, String),
    definition_of: impl Fn(&T) -> String,
    serialize: impl Fn(&T) -> String,
    object_kind: ObjectKind,
    drop_risk: RiskLevel,
    drop_warning_code: Option<&str>,
    changes: &mut Vec<SchemaChange>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let key_string = |t: &T| {
        let (schema, name) = key_of(t);
        format!("{}.{}", schema.to_ascii_lowercase(), name.to_ascii_lowercase())
    };

    let mut keys: Vec<String> = current.iter().chain(target.iter()).map(&key_string).collect();
    keys.sort();
    keys.dedup();

    let noun = object_kind_noun(object_kind);

    for key in &keys {
        let current_obj = current.iter().find(|o| &key_string(o) == key);
        let target_obj = target.iter().find(|o| &key_string(o) == key);

        match (current_obj, target_obj) {
            (None, Some(obj)) => {
                let (schema, name) = key_of(obj);
                let mut op = change(
                    OperationKind::Create,
                    object_kind,
                    format!("{schema}.{name}"),
                    schema,
                    format!("create {noun} `{name}`"),
                    RiskLevel::Safe,
                );
                op.set_property("object", serialize(obj));
                changes.push(op);
            }
            (Some(obj), None) => {
                let (schema, name) = key_of(obj);
                changes.push(change(
                    OperationKind::Drop,
                    object_kind,
                    format!("{schema}.{name}"),
                    schema.clone(),
                    format!("drop {noun} `{name}`"),
                    drop_risk,
                ));
                if let Some(code) = drop_warning_code {
                    warnings.push(ValidationWarning {
                        code: code.to_string(),
                        message: format!("{noun} `{name}` will be dropped"),
                        object_reference: format!("{schema}.{name}"),
                        risk_level: Some(drop_risk),
                    });
                }
            }
            (Some(current_obj), Some(target_obj)) => {
                if definition_of(current_obj) != definition_of(target_obj) {
                    let (schema, name) = key_of(target_obj);
                    let mut op = change(
                        OperationKind::Alter,
                        object_kind,
                        format!("{schema}.{name}"),
                        schema,
                        format!("alter {noun} `{name}` definition"),
                        RiskLevel::Safe,
                    );
                    op.set_property("object", serialize(target_obj));
                    changes.push(op);
                }
            }
            (None, None) => unreachable!(),
        }
    }
}

fn object_kind_noun(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::View => "view",
        ObjectKind::Procedure => "procedure",
        ObjectKind::Function => "function",
        _ => "object",
    }
}
