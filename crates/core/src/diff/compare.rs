use std::collections::BTreeMap;

use crate::model::{
    CategoryCompatibility, DatabaseSchema, NormalizedType, ObjectKind, OperationKind, RiskLevel,
    SchemaChange, SchemaColumn, SchemaTable, ValidationError, ValidationWarning, category_compatibility,
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

pub(super) fn table_key(schema_namespace: &str, name: &str) -> String {
    format!("{}.{}", schema_namespace.to_ascii_lowercase(), name.to_ascii_lowercase())
}

/// Compares tables between `current` and `target`, recursing into columns
/// for tables present in both. Iteration is lexicographic over the merged
/// key set so output is deterministic (§8.1).
pub(super) fn compare_tables(
    current: &DatabaseSchema,
    target: &DatabaseSchema,
    config: &DiffConfig,
    changes: &mut Vec<SchemaChange>,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let mut keys: Vec<String> = current
        .tables
        .iter()
        .chain(target.tables.iter())
        .map(|t| table_key(&t.schema_namespace, &t.name))
        .collect();
    keys.sort();
    keys.dedup();

    for key in keys {
        let current_table = find_table(&current.tables, &key);
        let target_table = find_table(&target.tables, &key);

        match (current_table, target_table) {
            (None, Some(target_table)) => {
                changes.push(create_table_change(target_table));
                if config.is_reserved(&target_table.name) {
                    warnings.push(reserved_word_warning("RESERVED_WORD_TABLE", &target_table.name, &target_table.name));
                }
                for column in &target_table.columns {
                    if config.is_reserved(&column.name) {
                        warnings.push(reserved_word_warning(
                            "RESERVED_WORD_COLUMN",
                            &format!("{}.{}", target_table.name, column.name),
                            &column.name,
                        ));
                    }
                }
            }
            (Some(current_table), None) => {
                changes.push(drop_table_change(current_table));
                warnings.push(ValidationWarning {
                    code: "TABLE_DROP".to_string(),
                    message: format!("table `{}` will be dropped", current_table.name),
                    object_reference: current_table.name.clone(),
                    risk_level: Some(RiskLevel::Risky),
                });
            }
            (Some(current_table), Some(target_table)) => {
                compare_columns(current_table, target_table, config, changes, errors, warnings);
            }
            (None, None) => unreachable!("key derived from at least one side"),
        }
    }
}

fn find_table<'a>(tables: &'a [SchemaTable], key: &str) -> Option<&'a SchemaTable> {
    tables.iter().find(|t| table_key(&t.schema_namespace, &t.name) == key)
}

fn create_table_change(table: &SchemaTable) -> SchemaChange {
    let mut op = change(
        OperationKind::Create,
        ObjectKind::Table,
        table.name.clone(),
        table.schema_namespace.clone(),
        format!("create table `{}`", table.name),
        RiskLevel::Safe,
    );
    op.set_json_property("table", table);
    op
}

fn drop_table_change(table: &SchemaTable) -> SchemaChange {
    change(
        OperationKind::Drop,
        ObjectKind::Table,
        table.name.clone(),
        table.schema_namespace.clone(),
        format!("drop table `{}`", table.name),
        RiskLevel::Risky,
    )
}

fn reserved_word_warning(code: &str, object_reference: &str, name: &str) -> ValidationWarning {
    ValidationWarning {
        code: code.to_string(),
        message: format!("`{name}` is a reserved word for this provider"),
        object_reference: object_reference.to_string(),
        risk_level: Some(RiskLevel::Warning),
    }
}

fn compare_columns(
    current_table: &SchemaTable,
    target_table: &SchemaTable,
    config: &DiffConfig,
    changes: &mut Vec<SchemaChange>,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let mut names: Vec<String> = current_table
        .columns
        .iter()
        .chain(target_table.columns.iter())
        .map(|c| c.name.to_ascii_lowercase())
        .collect();
    names.sort();
    names.dedup();

    for name in names {
        let current_column = current_table.columns.iter().find(|c| c.name.to_ascii_lowercase() == name);
        let target_column = target_table.columns.iter().find(|c| c.name.to_ascii_lowercase() == name);

        match (current_column, target_column) {
            (None, Some(target_column)) => {
                add_column(target_table, target_column, changes, warnings);
                if config.is_reserved(&target_column.name) {
                    warnings.push(reserved_word_warning(
                        "RESERVED_WORD_COLUMN",
                        &format!("{}.{}", target_table.name, target_column.name),
                        &target_column.name,
                    ));
                }
            }
            (Some(current_column), None) => {
                drop_column(current_table, current_column, changes, errors);
            }
            (Some(current_column), Some(target_column)) => {
                alter_column(current_table, current_column, target_column, changes, warnings);
            }
            (None, None) => unreachable!(),
        }
    }
}

fn add_column(
    table: &SchemaTable,
    column: &SchemaColumn,
    changes: &mut Vec<SchemaChange>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let risk = if column.nullable { RiskLevel::Safe } else { RiskLevel::Warning };
    let object_reference = format!("{}.{}", table.name, column.name);
    let mut op = change(
        OperationKind::Alter,
        ObjectKind::Column,
        object_reference.clone(),
        table.schema_namespace.clone(),
        format!("add column `{}` to `{}`", column.name, table.name),
        risk,
    );
    op.set_property("change_type", "add");
    op.set_json_property("column", column);
    op.set_json_property("table", table);
    changes.push(op);

    if !column.nullable && column.default_value.is_none() {
        warnings.push(ValidationWarning {
            code: "NON_NULLABLE_COLUMN_WITHOUT_DEFAULT".to_string(),
            message: format!("column `{}` is non-nullable without a default", column.name),
            object_reference,
            risk_level: Some(RiskLevel::Warning),
        });
    }
}

fn drop_column(
    table: &SchemaTable,
    column: &SchemaColumn,
    changes: &mut Vec<SchemaChange>,
    errors: &mut Vec<ValidationError>,
) {
    let object_reference = format!("{}.{}", table.name, column.name);
    let mut op = change(
        OperationKind::Alter,
        ObjectKind::Column,
        object_reference.clone(),
        table.schema_namespace.clone(),
        format!("drop column `{}` from `{}`", column.name, table.name),
        RiskLevel::Risky,
    );
    op.set_property("change_type", "drop");
    op.set_json_property("column", column);
    op.set_json_property("table", table);
    changes.push(op);

    let is_pk_member = table
        .primary_key()
        .is_some_and(|pk| pk.columns.iter().any(|c| c.eq_ignore_ascii_case(&column.name)));
    if is_pk_member {
        errors.push(ValidationError {
            code: "PRIMARY_KEY_COLUMN_DROP".to_string(),
            message: format!("column `{}` cannot be dropped: it is part of the primary key", column.name),
            object_reference,
        });
    }
}

fn alter_column(
    table: &SchemaTable,
    current: &SchemaColumn,
    target: &SchemaColumn,
    changes: &mut Vec<SchemaChange>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let object_reference = format!("{}.{}", table.name, target.name);

    if current.data_type != target.data_type {
        type_change(table, current, target, &object_reference, changes, warnings);
    }

    if current.nullable && !target.nullable {
        let mut op = change(
            OperationKind::Alter,
            ObjectKind::Column,
            object_reference.clone(),
            table.schema_namespace.clone(),
            format!("alter column `{}` to not null", target.name),
            RiskLevel::Warning,
        );
        op.set_property("change_type", "nullability");
        op.set_json_property("column", target);
        op.set_json_property("previous_column", current);
        op.set_json_property("table", table);
        changes.push(op);

        if target.default_value.is_none() {
            warnings.push(ValidationWarning {
                code: "NULLABLE_TO_NOT_NULL_WITHOUT_DEFAULT".to_string(),
                message: format!("column `{}` becomes not-null without a default", target.name),
                object_reference: object_reference.clone(),
                risk_level: Some(RiskLevel::Warning),
            });
        }
    }

    if let (Some(current_len), Some(target_len)) = (current.max_length, target.max_length)
        && target_len < current_len
    {
        warnings.push(ValidationWarning {
            code: "COLUMN_LENGTH_REDUCTION".to_string(),
            message: format!("column `{}` max length reduced from {current_len} to {target_len}", target.name),
            object_reference,
            risk_level: Some(RiskLevel::Risky),
        });
    }
}

fn type_change(
    table: &SchemaTable,
    current: &SchemaColumn,
    target: &SchemaColumn,
    object_reference: &str,
    changes: &mut Vec<SchemaChange>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let risk = type_change_risk(&current.data_type, &target.data_type);
    let mut op = change(
        OperationKind::Alter,
        ObjectKind::Column,
        object_reference.to_string(),
        table.schema_namespace.clone(),
        format!("alter column `{}` type", target.name),
        risk,
    );
    op.set_property("change_type", "type_change");
    op.set_json_property("column", target);
    op.set_json_property("previous_column", current);
    op.set_json_property("table", table);

    if risk == RiskLevel::Risky || current.data_type.shrinks_into(&target.data_type) {
        op.set_property("potential_data_loss", "true");
    }
    changes.push(op);

    if current.data_type.category == target.data_type.category
        && current.data_type.shrinks_into(&target.data_type)
    {
        warnings.push(ValidationWarning {
            code: "COLUMN_LENGTH_REDUCTION".to_string(),
            message: format!("column `{}` type shrinks within the same category", target.name),
            object_reference: object_reference.to_string(),
            risk_level: Some(RiskLevel::Risky),
        });
    }
}

/// Risk rule for a column type change (§4.2): same category and the new
/// size is greater-or-equal → Safe; same category but smaller → Risky; a
/// cross-category change consults the compatibility matrix.
#[must_use]
pub fn type_change_risk(from: &NormalizedType, to: &NormalizedType) -> RiskLevel {
    if from.category == to.category {
        return if from.shrinks_into(to) { RiskLevel::Risky } else { RiskLevel::Safe };
    }

    match category_compatibility(from.category, to.category) {
        CategoryCompatibility::Safe => RiskLevel::Safe,
        CategoryCompatibility::Warning => RiskLevel::Warning,
        CategoryCompatibility::Risky => RiskLevel::Risky,
    }
}
