use schemectl_core::{
    ObjectKind, OperationKind, ReferentialAction, RenderedStatement, SchemaChange, SchemaColumn,
    SchemaConstraint, SchemaFunction, SchemaIndex, SchemaProcedure, SchemaTable, SchemaView,
    SqlEmitter,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct MssqlEmitter;

impl MssqlEmitter {
    fn column_def(&self, column: &SchemaColumn) -> String {
        let mut sql = format!("{} {}", self.quote_ident(&column.name), column.native_type);
        if column.identity {
            sql.push_str(" IDENTITY(1,1)");
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
            ConstraintKind::Check => format!("CHECK ({})", c.check_expression.as_deref().unwrap_or("1=1")),
        }
    }

    fn render_alter_column(&self, change: &SchemaChange, table_name: &str, column_name: &str) -> String {
        let table_q = self.quote_ident(table_name);
        match change.property("change_type") {
            Some("add") => {
                let column = change.decode_property::<SchemaColumn>("column").unwrap_or_else(|| fallback_column(column_name));
                format!("ALTER TABLE {table_q} ADD {};", self.column_def(&column))
            }
            Some("drop") => format!("ALTER TABLE {table_q} DROP COLUMN {};", self.quote_ident(column_name)),
            Some("type_change" | "nullability") => {
                let column = change.decode_property::<SchemaColumn>("column").unwrap_or_else(|| fallback_column(column_name));
                let mut sql = format!(
                    "ALTER TABLE {table_q} ALTER COLUMN {} {}",
                    self.quote_ident(&column.name),
                    column.native_type
                );
                sql.push_str(if column.nullable { " NULL" } else { " NOT NULL" });
                sql.push(';');
                sql
            }
            _ => format!("-- unrecognized column change: {}", change.description),
        }
    }
}

fn fallback_column(name: &str) -> SchemaColumn {
    SchemaColumn {
        name: name.to_string(),
        data_type: schemectl_core::NormalizedType::simple(schemectl_core::TypeCategory::Unknown),
        native_type: "nvarchar(max)".to_string(),
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
        ReferentialAction::Restrict => "NO ACTION",
    }
}

impl SqlEmitter for MssqlEmitter {
    fn quote_ident(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    /// Renders one `SchemaChange` as forward + rollback SQL. Prefers a
    /// differ-populated `sql_command`; otherwise synthesizes DDL structurally
    /// from the change's JSON-encoded properties (custom scripts, tests).
    fn render(&self, change: &SchemaChange) -> RenderedStatement {
        if !change.sql_command.is_empty() {
            return RenderedStatement {
                sql: change.sql_command.clone(),
                rollback_sql: change.rollback_sql.clone(),
                transactional: change.object_kind != ObjectKind::Index,
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
                format!("ALTER TABLE {} DROP CONSTRAINT {};", self.quote_ident(table_name), self.quote_ident(constraint_name))
            }

            (OperationKind::Create, ObjectKind::Index) => match change.decode_property::<SchemaIndex>("index") {
                Some(index) => {
                    let unique = if index.unique { "UNIQUE " } else { "" };
                    let mut sql = format!(
                        "CREATE {unique}INDEX {} ON {} ({})",
                        self.quote_ident(&index.name),
                        self.quote_ident(&index.table),
                        self.column_list(&index.columns)
                    );
                    if let Some(filter) = &index.filter_expression {
                        sql.push_str(&format!(" WHERE {filter}"));
                    }
                    sql.push(';');
                    sql
                }
                None => format!("-- missing index definition: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::Index) => {
                let (table_name, index_name) = SchemaChange::split_qualified(&change.qualified_name);
                let owning_table = if table_name.is_empty() { change.property("table").unwrap_or(index_name) } else { table_name };
                format!("DROP INDEX {} ON {};", self.quote_ident(index_name), self.quote_ident(owning_table))
            }

            (OperationKind::Create | OperationKind::Alter, ObjectKind::View) => match change.decode_property::<SchemaView>("object") {
                Some(view) => format!("CREATE OR ALTER VIEW {qualified} AS {};", view.definition.trim().trim_end_matches(';')),
                None => format!("-- missing view definition: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::View) => format!("DROP VIEW {qualified};"),

            (OperationKind::Create | OperationKind::Alter, ObjectKind::Procedure) => match change.decode_property::<SchemaProcedure>("object") {
                Some(procedure) => format!("CREATE OR ALTER PROCEDURE {qualified} AS BEGIN {} END;", procedure.definition.trim()),
                None => format!("-- missing procedure definition: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::Procedure) => format!("DROP PROCEDURE {qualified};"),

            (OperationKind::Create | OperationKind::Alter, ObjectKind::Function) => match change.decode_property::<SchemaFunction>("object") {
                Some(function) => {
                    let returns = function.return_type.clone().unwrap_or_else(|| "nvarchar(max)".to_string());
                    format!("CREATE OR ALTER FUNCTION {qualified}() RETURNS {returns} AS BEGIN {} END;", function.definition.trim())
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

    use schemectl_core::{NormalizedType, TypeCategory};

    use super::*;

    fn change(operation: OperationKind, object_kind: ObjectKind, name: &str) -> SchemaChange {
        SchemaChange {
            operation,
            object_kind,
            qualified_name: name.to_string(),
            schema_namespace: "dbo".to_string(),
            description: String::new(),
            risk_level: schemectl_core::RiskLevel::Risky,
            properties: BTreeMap::new(),
            sql_command: String::new(),
            rollback_sql: None,
            dependencies: Vec::new(),
        }
    }

    #[test]
    fn quotes_identifiers_with_brackets() {
        assert_eq!(MssqlEmitter.quote_ident("weird]name"), "[weird]]name]");
    }

    #[test]
    fn renders_drop_table_when_no_sql_command_present() {
        let rendered = MssqlEmitter.render(&change(OperationKind::Drop, ObjectKind::Table, "Orders"));
        assert_eq!(rendered.sql, "DROP TABLE [Orders];");
    }

    #[test]
    fn prefers_precomputed_sql_command() {
        let mut c = change(OperationKind::Create, ObjectKind::Table, "Orders");
        c.sql_command = "CREATE TABLE Orders (Id int);".to_string();
        let rendered = MssqlEmitter.render(&c);
        assert_eq!(rendered.sql, "CREATE TABLE Orders (Id int);");
    }

    #[test]
    fn renders_create_table_from_table_property() {
        let mut c = change(OperationKind::Create, ObjectKind::Table, "Widgets");
        let table = SchemaTable {
            name: "Widgets".to_string(),
            schema_namespace: "dbo".to_string(),
            columns: vec![SchemaColumn {
                name: "Id".to_string(),
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
        let rendered = MssqlEmitter.render(&c);
        assert!(!rendered.sql.trim_start().starts_with("--"));
        assert!(rendered.sql.contains("CREATE TABLE [Widgets]"));
        assert!(rendered.sql.contains("IDENTITY(1,1)"));
    }

    #[test]
    fn renders_alter_column_type_change_with_nullability() {
        let mut c = change(OperationKind::Alter, ObjectKind::Column, "Widgets.Price");
        c.set_property("change_type", "type_change");
        let column = SchemaColumn {
            name: "Price".to_string(),
            data_type: NormalizedType::simple(TypeCategory::Decimal),
            native_type: "decimal(10,2)".to_string(),
            nullable: true,
            primary_key: false,
            identity: false,
            max_length: None,
            precision: Some(10),
            scale: Some(2),
            default_value: None,
        };
        c.set_json_property("column", &column);
        let rendered = MssqlEmitter.render(&c);
        assert!(!rendered.sql.trim_start().starts_with("--"));
        assert_eq!(rendered.sql, "ALTER TABLE [Widgets] ALTER COLUMN [Price] decimal(10,2) NULL;");
    }

    #[test]
    fn renders_drop_index_with_on_table_clause() {
        let c = change(OperationKind::Drop, ObjectKind::Index, "Orders.IX_Customer");
        let rendered = MssqlEmitter.render(&c);
        assert!(!rendered.sql.trim_start().starts_with("--"));
        assert_eq!(rendered.sql, "DROP INDEX [IX_Customer] ON [Orders];");
    }

    #[test]
    fn renders_create_or_alter_view() {
        let mut c = change(OperationKind::Create, ObjectKind::View, "ActiveOrders");
        let view = SchemaView { name: "ActiveOrders".to_string(), schema_namespace: "dbo".to_string(), definition: "SELECT * FROM Orders WHERE Active = 1".to_string() };
        c.set_json_property("object", &view);
        let rendered = MssqlEmitter.render(&c);
        assert!(!rendered.sql.trim_start().starts_with("--"));
        assert!(rendered.sql.starts_with("CREATE OR ALTER VIEW [ActiveOrders]"));
    }
}
