use schemectl_core::{
    ObjectKind, OperationKind, ReferentialAction, RenderedStatement, SchemaChange, SchemaColumn,
    SchemaConstraint, SchemaFunction, SchemaIndex, SchemaProcedure, SchemaTable, SchemaView,
    SqlEmitter,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlEmitter;

impl MysqlEmitter {
    fn column_def(&self, column: &SchemaColumn) -> String {
        let mut sql = format!("{} {}", self.quote_ident(&column.name), column.native_type);
        sql.push_str(if column.nullable { " NULL" } else { " NOT NULL" });
        if column.identity {
            sql.push_str(" AUTO_INCREMENT");
        }
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
            Some("type_change" | "nullability") => {
                let column = change.decode_property::<SchemaColumn>("column").unwrap_or_else(|| fallback_column(column_name));
                format!("ALTER TABLE {table_q} MODIFY COLUMN {};", self.column_def(&column))
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

impl SqlEmitter for MysqlEmitter {
    fn quote_ident(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    /// Renders one `SchemaChange` as forward + rollback SQL. Prefers a
    /// differ-populated `sql_command`; otherwise synthesizes DDL structurally
    /// from the change's JSON-encoded properties (custom scripts, tests).
    fn render(&self, change: &SchemaChange) -> RenderedStatement {
        if !change.sql_command.is_empty() {
            return RenderedStatement {
                sql: change.sql_command.clone(),
                rollback_sql: change.rollback_sql.clone(),
                transactional: !matches!(change.object_kind, ObjectKind::Table | ObjectKind::Index),
            };
        }

        let qualified = self.quote_ident(&change.qualified_name);
        let sql = match (change.operation, change.object_kind) {
            (OperationKind::Create, ObjectKind::Table) => match change.decode_property::<SchemaTable>("table") {
                Some(table) => {
                    let columns: Vec<String> = table.columns.iter().map(|c| self.column_def(c)).collect();
                    format!("CREATE TABLE {qualified} (\n  {}\n);", columns.join(",\n  "))
                }
                None => format!("CREATE TABLE {qualified} ();"),
            },
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
                if change.property("constraint_type") == Some("FK") {
                    format!("ALTER TABLE {} DROP FOREIGN KEY {};", self.quote_ident(table_name), self.quote_ident(constraint_name))
                } else {
                    format!("ALTER TABLE {} DROP CONSTRAINT {};", self.quote_ident(table_name), self.quote_ident(constraint_name))
                }
            }

            (OperationKind::Create, ObjectKind::Index) => match change.decode_property::<SchemaIndex>("index") {
                Some(index) => {
                    let unique = if index.unique { "UNIQUE " } else { "" };
                    format!(
                        "CREATE {unique}INDEX {} ON {} ({});",
                        self.quote_ident(&index.name),
                        self.quote_ident(&index.table),
                        self.column_list(&index.columns)
                    )
                }
                None => format!("-- missing index definition: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::Index) => {
                let (table_name, index_name) = SchemaChange::split_qualified(&change.qualified_name);
                let owning_table = if table_name.is_empty() { change.property("table").unwrap_or(index_name) } else { table_name };
                format!("DROP INDEX {} ON {};", self.quote_ident(index_name), self.quote_ident(owning_table))
            }

            (OperationKind::Create | OperationKind::Alter, ObjectKind::View) => match change.decode_property::<SchemaView>("object") {
                Some(view) => format!("CREATE OR REPLACE VIEW {qualified} AS {};", view.definition.trim().trim_end_matches(';')),
                None => format!("-- missing view definition: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::View) => format!("DROP VIEW {qualified};"),

            (OperationKind::Create | OperationKind::Alter, ObjectKind::Procedure) => match change.decode_property::<SchemaProcedure>("object") {
                Some(procedure) => format!("CREATE PROCEDURE {qualified}() BEGIN {} END;", procedure.definition.trim()),
                None => format!("-- missing procedure definition: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::Procedure) => format!("DROP PROCEDURE {qualified};"),

            (OperationKind::Create | OperationKind::Alter, ObjectKind::Function) => match change.decode_property::<SchemaFunction>("object") {
                Some(function) => {
                    let returns = function.return_type.clone().unwrap_or_else(|| "CHAR(1)".to_string());
                    format!("CREATE FUNCTION {qualified}() RETURNS {returns} DETERMINISTIC BEGIN {} END;", function.definition.trim())
                }
                None => format!("-- missing function definition: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::Function) => format!("DROP FUNCTION {qualified};"),

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
            schema_namespace: "app".to_string(),
            description: String::new(),
            risk_level: schemectl_core::RiskLevel::Risky,
            properties: BTreeMap::new(),
            sql_command: String::new(),
            rollback_sql: None,
            dependencies: Vec::new(),
        }
    }

    #[test]
    fn quotes_identifiers_with_embedded_backticks() {
        assert_eq!(MysqlEmitter.quote_ident("weird`name"), "`weird``name`");
    }

    #[test]
    fn renders_drop_table_when_no_sql_command_present() {
        let rendered = MysqlEmitter.render(&change(OperationKind::Drop, ObjectKind::Table, "orders"));
        assert_eq!(rendered.sql, "DROP TABLE `orders`;");
    }

    #[test]
    fn prefers_precomputed_sql_command() {
        let mut c = change(OperationKind::Create, ObjectKind::Table, "orders");
        c.sql_command = "CREATE TABLE orders (id int);".to_string();
        let rendered = MysqlEmitter.render(&c);
        assert_eq!(rendered.sql, "CREATE TABLE orders (id int);");
        assert!(!rendered.transactional);
    }

    #[test]
    fn renders_create_table_from_table_property() {
        let mut c = change(OperationKind::Create, ObjectKind::Table, "widgets");
        let table = SchemaTable {
            name: "widgets".to_string(),
            schema_namespace: "app".to_string(),
            columns: vec![SchemaColumn {
                name: "id".to_string(),
                data_type: NormalizedType::simple(TypeCategory::Integer),
                native_type: "int".to_string(),
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
        let rendered = MysqlEmitter.render(&c);
        assert!(!rendered.sql.trim_start().starts_with("--"));
        assert!(rendered.sql.contains("CREATE TABLE `widgets`"));
        assert!(rendered.sql.contains("AUTO_INCREMENT"));
    }

    #[test]
    fn renders_drop_index_with_on_table_clause() {
        let c = change(OperationKind::Drop, ObjectKind::Index, "orders.idx_customer");
        let rendered = MysqlEmitter.render(&c);
        assert!(!rendered.sql.trim_start().starts_with("--"));
        assert_eq!(rendered.sql, "DROP INDEX `idx_customer` ON `orders`;");
    }
}
