use schemectl_core::{
    ObjectKind, OperationKind, ReferentialAction, RenderedStatement, SchemaChange, SchemaColumn,
    SchemaConstraint, SchemaFunction, SchemaIndex, SchemaProcedure, SchemaTable, SchemaView,
    SqlEmitter,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct OracleEmitter;

impl OracleEmitter {
    fn column_def(&self, column: &SchemaColumn) -> String {
        let mut sql = format!("{} {}", self.quote_ident(&column.name), column.native_type);
        if column.identity {
            sql.push_str(" GENERATED BY DEFAULT AS IDENTITY");
        }
        sql.push_str(if column.nullable { " NULL" } else { " NOT NULL" });
        if let Some(default) = &column.default_value {
            sql.push_str(&format!(" DEFAULT {default}"));
        }
        sql
    }

    fn column_list(&self, columns: &[String]) -> String {
        columns.iter().map(|c| self.quote_ident(c)).collect::<Vec<_>>().join(", ")
    }

    fn constraint_clause(&self, c: &SchemaConstraint) -> String {
        use schemectl_core::ConstraintKind;
        match c.kind {
            ConstraintKind::PrimaryKey => format!("PRIMARY KEY ({})", self.column_list(&c.columns)),
            ConstraintKind::Unique => format!("UNIQUE ({})", self.column_list(&c.columns)),
            ConstraintKind::ForeignKey => {
                let mut sql = format!(
                    "FOREIGN KEY ({}) REFERENCES {} ({})",
                    self.column_list(&c.columns),
                    c.referenced_table.as_deref().map(|t| self.quote_ident(t)).unwrap_or_default(),
                    self.column_list(&c.referenced_columns),
                );
                if let Some(action) = c.on_delete {
                    sql.push_str(&format!(" ON DELETE {}", referential_action_sql(action)));
                }
                sql
            }
            ConstraintKind::Check => format!("CHECK ({})", c.check_expression.as_deref().unwrap_or("1=1")),
        }
    }

    fn render_alter_column(&self, change: &SchemaChange, table_name: &str, column_name: &str) -> String {
        let table_q = self.quote_ident(table_name);
        match change.property("change_type") {
            Some("add") => {
                let column = change.decode_property::<SchemaColumn>("column").unwrap_or_else(|| fallback_column(column_name));
                format!("ALTER TABLE {table_q} ADD ({})", self.column_def(&column))
            }
            Some("drop") => format!("ALTER TABLE {table_q} DROP COLUMN {}", self.quote_ident(column_name)),
            Some("type_change" | "nullability") => {
                let column = change.decode_property::<SchemaColumn>("column").unwrap_or_else(|| fallback_column(column_name));
                let null_clause = if column.nullable { "NULL" } else { "NOT NULL" };
                format!("ALTER TABLE {table_q} MODIFY ({} {} {null_clause})", self.quote_ident(&column.name), column.native_type)
            }
            _ => format!("-- unrecognized column change: {}", change.description),
        }
    }
}

fn fallback_column(name: &str) -> SchemaColumn {
    SchemaColumn {
        name: name.to_string(),
        data_type: schemectl_core::NormalizedType::simple(schemectl_core::TypeCategory::Unknown),
        native_type: "VARCHAR2(4000)".to_string(),
        nullable: true,
        primary_key: false,
        identity: false,
        max_length: None,
        precision: None,
        scale: None,
        default_value: None,
    }
}

fn referential_action_sql(action: ReferentialAction) -> &'static str {
    match action {
        ReferentialAction::NoAction | ReferentialAction::Restrict | ReferentialAction::SetDefault => "NO ACTION",
        ReferentialAction::Cascade => "CASCADE",
        ReferentialAction::SetNull => "SET NULL",
    }
}

impl SqlEmitter for OracleEmitter {
    fn quote_ident(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Renders one `SchemaChange`. Prefers a differ-populated `sql_command`;
    /// otherwise synthesizes DDL structurally from the change's JSON-encoded
    /// properties. Oracle has no `DROP TABLE IF EXISTS`, and purges require
    /// an explicit clause, so the fallback drop leaves the object
    /// recoverable from the recycle bin rather than purging it outright.
    fn render(&self, change: &SchemaChange) -> RenderedStatement {
        if !change.sql_command.is_empty() {
            return RenderedStatement { sql: change.sql_command.clone(), rollback_sql: change.rollback_sql.clone(), transactional: false };
        }

        let qualified = self.quote_ident(&change.qualified_name);
        let sql = match (change.operation, change.object_kind) {
            (OperationKind::Create, ObjectKind::Table) => match change.decode_property::<SchemaTable>("table") {
                Some(table) => {
                    let columns: Vec<String> = table.columns.iter().map(|c| self.column_def(c)).collect();
                    format!("CREATE TABLE {qualified} (\n  {}\n)", columns.join(",\n  "))
                }
                None => format!("CREATE TABLE {qualified} ()"),
            },
            (OperationKind::Drop, ObjectKind::Table) => format!("DROP TABLE {qualified}"),

            (OperationKind::Alter, ObjectKind::Column) => {
                let (table_name, column_name) = SchemaChange::split_qualified(&change.qualified_name);
                self.render_alter_column(change, table_name, column_name)
            }

            (OperationKind::Create, ObjectKind::Constraint) => match change.decode_property::<SchemaConstraint>("constraint") {
                Some(c) => format!("ALTER TABLE {} ADD CONSTRAINT {} {}", self.quote_ident(&c.table), self.quote_ident(&c.name), self.constraint_clause(&c)),
                None => format!("-- missing constraint definition: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::Constraint) => {
                let (table_name, constraint_name) = SchemaChange::split_qualified(&change.qualified_name);
                format!("ALTER TABLE {} DROP CONSTRAINT {}", self.quote_ident(table_name), self.quote_ident(constraint_name))
            }

            (OperationKind::Create, ObjectKind::Index) => match change.decode_property::<SchemaIndex>("index") {
                Some(index) => {
                    let unique = if index.unique { "UNIQUE " } else { "" };
                    format!(
                        "CREATE {unique}INDEX {} ON {} ({})",
                        self.quote_ident(&index.name),
                        self.quote_ident(&index.table),
                        self.column_list(&index.columns)
                    )
                }
                None => format!("-- missing index definition: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::Index) => format!("DROP INDEX {qualified}"),

            (OperationKind::Create | OperationKind::Alter, ObjectKind::View) => match change.decode_property::<SchemaView>("object") {
                Some(view) => format!("CREATE OR REPLACE VIEW {qualified} AS {}", view.definition.trim().trim_end_matches(';')),
                None => format!("-- missing view definition: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::View) => format!("DROP VIEW {qualified}"),

            (OperationKind::Create | OperationKind::Alter, ObjectKind::Procedure) => match change.decode_property::<SchemaProcedure>("object") {
                Some(procedure) => format!("CREATE OR REPLACE PROCEDURE {qualified} IS BEGIN {} END;", procedure.definition.trim()),
                None => format!("-- missing procedure definition: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::Procedure) => format!("DROP PROCEDURE {qualified}"),

            (OperationKind::Create | OperationKind::Alter, ObjectKind::Function) => match change.decode_property::<SchemaFunction>("object") {
                Some(function) => {
                    let returns = function.return_type.clone().unwrap_or_else(|| "VARCHAR2".to_string());
                    format!("CREATE OR REPLACE FUNCTION {qualified} RETURN {returns} IS BEGIN {} END;", function.definition.trim())
                }
                None => format!("-- missing function definition: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::Function) => format!("DROP FUNCTION {qualified}"),

            _ => format!("-- unsupported change: {}", change.description),
        };

        RenderedStatement { sql, rollback_sql: None, transactional: false }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use schemectl_core::{NormalizedType, TypeCategory};

    use super::*;

    fn change(operation: OperationKind, object_kind: ObjectKind, name: &str) -> SchemaChange {
        SchemaChange {
            operation,
            object_kind,
            qualified_name: name.to_string(),
            schema_namespace: "APP".to_string(),
            description: String::new(),
            risk_level: schemectl_core::RiskLevel::Risky,
            properties: BTreeMap::new(),
            sql_command: String::new(),
            rollback_sql: None,
            dependencies: Vec::new(),
        }
    }

    #[test]
    fn quotes_identifiers_with_embedded_quotes() {
        assert_eq!(OracleEmitter.quote_ident(r#"weird"name"#), "\"weird\"\"name\"");
    }

    #[test]
    fn renders_drop_table_when_no_sql_command_present() {
        let rendered = OracleEmitter.render(&change(OperationKind::Drop, ObjectKind::Table, "ORDERS"));
        assert_eq!(rendered.sql, "DROP TABLE \"ORDERS\"");
    }

    #[test]
    fn prefers_precomputed_sql_command() {
        let mut c = change(OperationKind::Create, ObjectKind::Table, "ORDERS");
        c.sql_command = "CREATE TABLE ORDERS (ID NUMBER)".to_string();
        let rendered = OracleEmitter.render(&c);
        assert_eq!(rendered.sql, "CREATE TABLE ORDERS (ID NUMBER)");
    }

    #[test]
    fn renders_create_table_from_table_property() {
        let mut c = change(OperationKind::Create, ObjectKind::Table, "WIDGETS");
        let table = SchemaTable {
            name: "WIDGETS".to_string(),
            schema_namespace: "APP".to_string(),
            columns: vec![SchemaColumn {
                name: "ID".to_string(),
                data_type: NormalizedType::simple(TypeCategory::Integer),
                native_type: "NUMBER(10)".to_string(),
                nullable: false,
                primary_key: true,
                identity: true,
                max_length: None,
                precision: Some(10),
                scale: None,
                default_value: None,
            }],
            indexes: Vec::new(),
            constraints: Vec::new(),
        };
        c.set_json_property("table", &table);
        let rendered = OracleEmitter.render(&c);
        assert!(!rendered.sql.trim_start().starts_with("--"));
        assert!(rendered.sql.contains("CREATE TABLE \"WIDGETS\""));
        assert!(rendered.sql.contains("GENERATED BY DEFAULT AS IDENTITY"));
    }

    #[test]
    fn renders_modify_column_with_parenthesized_syntax() {
        let mut c = change(OperationKind::Alter, ObjectKind::Column, "WIDGETS.PRICE");
        c.set_property("change_type", "type_change");
        let column = SchemaColumn {
            name: "PRICE".to_string(),
            data_type: NormalizedType::simple(TypeCategory::Decimal),
            native_type: "NUMBER(10,2)".to_string(),
            nullable: true,
            primary_key: false,
            identity: false,
            max_length: None,
            precision: Some(10),
            scale: Some(2),
            default_value: None,
        };
        c.set_json_property("column", &column);
        let rendered = OracleEmitter.render(&c);
        assert!(!rendered.sql.trim_start().starts_with("--"));
        assert_eq!(rendered.sql, "ALTER TABLE \"WIDGETS\" MODIFY (\"PRICE\" NUMBER(10,2) NULL)");
    }

    #[test]
    fn renders_drop_index_without_on_table_clause() {
        let c = change(OperationKind::Drop, ObjectKind::Index, "IDX_CUSTOMER");
        let rendered = OracleEmitter.render(&c);
        assert!(!rendered.sql.trim_start().starts_with("--"));
        assert_eq!(rendered.sql, "DROP INDEX \"IDX_CUSTOMER\"");
    }
}
