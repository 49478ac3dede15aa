use schemectl_core::{
    ObjectKind, OperationKind, ReferentialAction, RenderedStatement, SchemaChange, SchemaColumn,
    SchemaConstraint, SchemaFunction, SchemaIndex, SchemaProcedure, SchemaTable, SchemaView,
    SqlEmitter,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresEmitter;

impl PostgresEmitter {
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
                if let Some(action) = c.on_update {
                    sql.push_str(&format!(" ON UPDATE {}", referential_action_sql(action)));
                }
                sql
            }
            ConstraintKind::Check => format!("CHECK ({})", c.check_expression.as_deref().unwrap_or("true")),
        }
    }

    fn render_alter_column(&self, change: &SchemaChange, table_name: &str, column_name: &str) -> String {
        let table_q = self.quote_ident(table_name);
        match change.property("change_type") {
            Some("add") => {
                let column = change.decode_property::<SchemaColumn>("column").unwrap_or_else(|| fallback_column(column_name));
                format!("ALTER TABLE {table_q} ADD COLUMN {};", self.column_def(&column))
            }
            Some("drop") => format!("ALTER TABLE {table_q} DROP COLUMN {};", self.quote_ident(column_name)),
            Some("type_change") => {
                let column = change.decode_property::<SchemaColumn>("column").unwrap_or_else(|| fallback_column(column_name));
                format!("ALTER TABLE {table_q} ALTER COLUMN {} TYPE {};", self.quote_ident(column_name), column.native_type)
            }
            Some("nullability") => {
                let column = change.decode_property::<SchemaColumn>("column").unwrap_or_else(|| fallback_column(column_name));
                let clause = if column.nullable { "DROP NOT NULL" } else { "SET NOT NULL" };
                format!("ALTER TABLE {table_q} ALTER COLUMN {} {clause};", self.quote_ident(column_name))
            }
            _ => format!("-- unrecognized column change: {}", change.description),
        }
    }
}

fn fallback_column(name: &str) -> SchemaColumn {
    SchemaColumn {
        name: name.to_string(),
        data_type: schemectl_core::NormalizedType::simple(schemectl_core::TypeCategory::Unknown),
        native_type: "text".to_string(),
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
        ReferentialAction::NoAction => "NO ACTION",
        ReferentialAction::Cascade => "CASCADE",
        ReferentialAction::SetNull => "SET NULL",
        ReferentialAction::SetDefault => "SET DEFAULT",
        ReferentialAction::Restrict => "RESTRICT",
    }
}

impl SqlEmitter for PostgresEmitter {
    fn quote_ident(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Renders one `SchemaChange` as forward + rollback SQL pairs. The sql
    /// emitted here is a structural fallback: a dialect consuming a
    /// differ-produced `SchemaChange` with a populated `sql_command` (e.g.
    /// from the catalog differ) should prefer that field, but a change
    /// assembled without one (custom scripts, tests) still renders.
    fn render(&self, change: &SchemaChange) -> RenderedStatement {
        if !change.sql_command.is_empty() {
            return RenderedStatement {
                sql: change.sql_command.clone(),
                rollback_sql: change.rollback_sql.clone(),
                transactional: change.object_kind != ObjectKind::Index || !change.has_property("is_clustered"),
            };
        }

        let qualified = self.quote_ident(&change.qualified_name);
        let sql = match (change.operation, change.object_kind) {
            (OperationKind::Create, ObjectKind::Table) => {
                let table = change.decode_property::<SchemaTable>("table");
                match table {
                    Some(table) => {
                        let columns: Vec<String> = table.columns.iter().map(|c| self.column_def(c)).collect();
                        format!("CREATE TABLE {qualified} (\n  {}\n);", columns.join(",\n  "))
                    }
                    None => format!("CREATE TABLE {qualified} ();"),
                }
            }
            (OperationKind::Drop, ObjectKind::Table) => format!("DROP TABLE {qualified};"),

            (OperationKind::Alter, ObjectKind::Column) => {
                let (table_name, column_name) = SchemaChange::split_qualified(&change.qualified_name);
                self.render_alter_column(change, table_name, column_name)
            }

            (OperationKind::Create, ObjectKind::Constraint) => match change.decode_property::<SchemaConstraint>("constraint") {
                Some(c) => format!("ALTER TABLE {} ADD CONSTRAINT {} {};", self.quote_ident(&c.table), self.quote_ident(&c.name), self.constraint_clause(&c)),
                None => format!("-- missing constraint definition: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::Constraint) => {
                let (table_name, constraint_name) = SchemaChange::split_qualified(&change.qualified_name);
                format!("ALTER TABLE {} DROP CONSTRAINT {};", self.quote_ident(table_name), self.quote_ident(constraint_name))
            }

            (OperationKind::Create, ObjectKind::Index) => match change.decode_property::<SchemaIndex>("index") {
                Some(index) => {
                    let unique = if index.unique { "UNIQUE " } else { "" };
                    let mut sql = format!(
                        "CREATE {unique}INDEX {} ON {} ({});",
                        self.quote_ident(&index.name),
                        self.quote_ident(&index.table),
                        self.column_list(&index.columns)
                    );
                    if let Some(filter) = &index.filter_expression {
                        sql = format!(
                            "CREATE {unique}INDEX {} ON {} ({}) WHERE {filter};",
                            self.quote_ident(&index.name),
                            self.quote_ident(&index.table),
                            self.column_list(&index.columns)
                        );
                    }
                    sql
                }
                None => format!("-- missing index definition: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::Index) => {
                let (_, index_name) = SchemaChange::split_qualified(&change.qualified_name);
                format!("DROP INDEX {};", self.quote_ident(index_name))
            }

            (OperationKind::Create | OperationKind::Alter, ObjectKind::View) => match change.decode_property::<SchemaView>("object") {
                Some(view) => format!("CREATE OR REPLACE VIEW {qualified} AS {};", view.definition.trim().trim_end_matches(';')),
                None => format!("-- missing view definition: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::View) => format!("DROP VIEW {qualified};"),

            (OperationKind::Create | OperationKind::Alter, ObjectKind::Procedure) => match change.decode_property::<SchemaProcedure>("object") {
                Some(procedure) => format!("CREATE OR REPLACE PROCEDURE {qualified}() LANGUAGE plpgsql AS $$ {} $$;", procedure.definition.trim()),
                None => format!("-- missing procedure definition: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::Procedure) => format!("DROP PROCEDURE {qualified};"),

            (OperationKind::Create | OperationKind::Alter, ObjectKind::Function) => match change.decode_property::<SchemaFunction>("object") {
                Some(function) => {
                    let returns = function.return_type.clone().unwrap_or_else(|| "void".to_string());
                    format!("CREATE OR REPLACE FUNCTION {qualified}() RETURNS {returns} LANGUAGE plpgsql AS $$ {} $$;", function.definition.trim())
                }
                None => format!("-- missing function definition: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::Function) => format!("DROP FUNCTION {qualified};"),

            _ => format!("-- unsupported change: {}", change.description),
        };

        RenderedStatement { sql, rollback_sql: None, transactional: true }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use schemectl_core::{ConstraintKind, NormalizedType, TypeCategory};

    use super::*;

    fn change(operation: OperationKind, object_kind: ObjectKind, name: &str) -> SchemaChange {
        SchemaChange {
            operation,
            object_kind,
            qualified_name: name.to_string(),
            schema_namespace: "public".to_string(),
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
        assert_eq!(PostgresEmitter.quote_ident(r#"weird"name"#), "\"weird\"\"name\"");
    }

    #[test]
    fn renders_drop_table_when_no_sql_command_present() {
        let rendered = PostgresEmitter.render(&change(OperationKind::Drop, ObjectKind::Table, "orders"));
        assert_eq!(rendered.sql, "DROP TABLE \"orders\";");
    }

    #[test]
    fn prefers_precomputed_sql_command() {
        let mut c = change(OperationKind::Create, ObjectKind::Table, "orders");
        c.sql_command = "CREATE TABLE orders (id integer);".to_string();
        let rendered = PostgresEmitter.render(&c);
        assert_eq!(rendered.sql, "CREATE TABLE orders (id integer);");
    }

    #[test]
    fn renders_create_table_from_table_property() {
        let mut c = change(OperationKind::Create, ObjectKind::Table, "widgets");
        let table = SchemaTable {
            name: "widgets".to_string(),
            schema_namespace: "public".to_string(),
            columns: vec![SchemaColumn {
                name: "id".to_string(),
                data_type: NormalizedType::simple(TypeCategory::Integer),
                native_type: "integer".to_string(),
                nullable: false,
                primary_key: true,
                identity: true,
                max_length: None,
                precision: None,
                scale: None,
                default_value: None,
            }],
            indexes: Vec::new(),
            constraints: Vec::new(),
        };
        c.set_json_property("table", &table);
        let rendered = PostgresEmitter.render(&c);
        assert!(!rendered.sql.trim_start().starts_with("--"), "expected real DDL, got: {}", rendered.sql);
        assert!(rendered.sql.contains("CREATE TABLE \"widgets\""));
        assert!(rendered.sql.contains("GENERATED BY DEFAULT AS IDENTITY"));
    }

    #[test]
    fn renders_add_column_from_column_property() {
        let mut c = change(OperationKind::Alter, ObjectKind::Column, "widgets.price");
        c.set_property("change_type", "add");
        c.set_json_property(
            "column",
            &SchemaColumn {
                name: "price".to_string(),
                data_type: NormalizedType::simple(TypeCategory::Decimal),
                native_type: "numeric(10,2)".to_string(),
                nullable: false,
                primary_key: false,
                identity: false,
                max_length: None,
                precision: Some(10),
                scale: Some(2),
                default_value: Some("0".to_string()),
            },
        );
        let rendered = PostgresEmitter.render(&c);
        assert!(!rendered.sql.trim_start().starts_with("--"));
        assert_eq!(rendered.sql, "ALTER TABLE \"widgets\" ADD COLUMN \"price\" numeric(10,2) NOT NULL DEFAULT 0;");
    }

    #[test]
    fn renders_create_constraint_foreign_key() {
        let mut c = change(OperationKind::Create, ObjectKind::Constraint, "orders.fk_customer");
        c.set_json_property(
            "constraint",
            &SchemaConstraint {
                name: "fk_customer".to_string(),
                kind: ConstraintKind::ForeignKey,
                table: "orders".to_string(),
                columns: vec!["customer_id".to_string()],
                referenced_table: Some("customers".to_string()),
                referenced_columns: vec!["id".to_string()],
                on_delete: Some(ReferentialAction::Cascade),
                on_update: None,
                check_expression: None,
            },
        );
        let rendered = PostgresEmitter.render(&c);
        assert!(!rendered.sql.trim_start().starts_with("--"));
        assert!(rendered.sql.contains("FOREIGN KEY (\"customer_id\") REFERENCES \"customers\" (\"id\") ON DELETE CASCADE"));
    }

    #[test]
    fn renders_create_index_with_filter() {
        let mut c = change(OperationKind::Create, ObjectKind::Index, "orders.idx_active");
        c.set_json_property(
            "index",
            &SchemaIndex {
                name: "idx_active".to_string(),
                table: "orders".to_string(),
                columns: vec!["status".to_string()],
                unique: false,
                clustered: false,
                filter_expression: Some("status = 'active'".to_string()),
            },
        );
        let rendered = PostgresEmitter.render(&c);
        assert!(!rendered.sql.trim_start().starts_with("--"));
        assert_eq!(rendered.sql, "CREATE INDEX \"idx_active\" ON \"orders\" (\"status\") WHERE status = 'active';");
    }
}
