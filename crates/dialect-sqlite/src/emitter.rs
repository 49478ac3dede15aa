use schemectl_core::{
    ConstraintKind, ObjectKind, OperationKind, RenderedStatement, SchemaChange, SchemaColumn,
    SchemaConstraint, SchemaFunction, SchemaIndex, SchemaProcedure, SchemaTable, SchemaView,
    SqlEmitter,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteEmitter;

impl SqliteEmitter {
    fn column_def(&self, column: &SchemaColumn) -> String {
        let mut sql = format!("{} {}", self.quote_ident(&column.name), column.native_type);
        if column.identity {
            sql.push_str(" PRIMARY KEY AUTOINCREMENT");
        } else if !column.nullable {
            sql.push_str(" NOT NULL");
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
        match c.kind {
            ConstraintKind::PrimaryKey => format!("PRIMARY KEY ({})", self.column_list(&c.columns)),
            ConstraintKind::Unique => format!("UNIQUE ({})", self.column_list(&c.columns)),
            ConstraintKind::ForeignKey => format!(
                "FOREIGN KEY ({}) REFERENCES {} ({})",
                self.column_list(&c.columns),
                c.referenced_table.as_deref().map(|t| self.quote_ident(t)).unwrap_or_default(),
                self.column_list(&c.referenced_columns),
            ),
            ConstraintKind::Check => format!("CHECK ({})", c.check_expression.as_deref().unwrap_or("1")),
        }
    }

    /// A single-column, autoincrementing primary key is declared inline on
    /// the column (`INTEGER PRIMARY KEY AUTOINCREMENT`), the only form
    /// SQLite accepts for `AUTOINCREMENT`; every other primary key, and
    /// every other constraint kind, is a table-level clause.
    fn table_level_constraints(&self, table: &SchemaTable, exclude: Option<&str>) -> Vec<String> {
        table
            .constraints
            .iter()
            .filter(|c| Some(c.name.as_str()) != exclude)
            .filter(|c| {
                !(c.kind == ConstraintKind::PrimaryKey
                    && c.columns.len() == 1
                    && table.column(&c.columns[0]).is_some_and(|col| col.identity))
            })
            .map(|c| self.constraint_clause(c))
            .collect()
    }

    /// Renders a `CREATE TABLE` body from a table definition, substituting
    /// `replacement` for the column of the same name if present and
    /// excluding `exclude_constraint` by name, for use both in plain
    /// `CREATE TABLE` and in rebuild-via-temp-table scripts.
    fn table_body(&self, table: &SchemaTable, replacement: Option<&SchemaColumn>, exclude_constraint: Option<&str>) -> String {
        let columns: Vec<String> = table
            .columns
            .iter()
            .map(|c| match replacement {
                Some(r) if r.name.eq_ignore_ascii_case(&c.name) => self.column_def(r),
                _ => self.column_def(c),
            })
            .collect();
        let mut parts = columns;
        parts.extend(self.table_level_constraints(table, exclude_constraint));
        parts.join(",\n  ")
    }

    fn rebuild_script(&self, table: &SchemaTable, replacement: Option<&SchemaColumn>, dropped_column: Option<&str>, exclude_constraint: Option<&str>) -> String {
        let name = self.quote_ident(&table.name);
        let tmp_name = self.quote_ident(&format!("tmp_rebuild_{}", table.name));
        let body = self.table_body(table, replacement, exclude_constraint);
        let select_columns: Vec<&str> = table
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .filter(|n| dropped_column != Some(*n))
            .collect();
        let insert_columns: Vec<String> = select_columns.iter().map(|c| self.quote_ident(c)).collect();
        format!(
            "CREATE TABLE {tmp_name} (\n  {body}\n);\nINSERT INTO {tmp_name} ({cols}) SELECT {cols} FROM {name};\nDROP TABLE {name};\nALTER TABLE {tmp_name} RENAME TO {name};",
            cols = insert_columns.join(", ")
        )
    }

    fn render_alter_column(&self, change: &SchemaChange, table_name: &str, column_name: &str) -> String {
        let table_q = self.quote_ident(table_name);
        match change.property("change_type") {
            Some("add") => {
                let column = change.decode_property::<SchemaColumn>("column").unwrap_or_else(|| fallback_column(column_name));
                format!("ALTER TABLE {table_q} ADD COLUMN {};", self.column_def(&column))
            }
            Some("drop") => format!("ALTER TABLE {table_q} DROP COLUMN {};", self.quote_ident(column_name)),
            Some("type_change" | "nullability") => match change.decode_property::<SchemaTable>("table") {
                Some(table) => {
                    let column = change.decode_property::<SchemaColumn>("column");
                    self.rebuild_script(&table, column.as_ref(), None, None)
                }
                None => format!("-- missing table definition for rebuild: {}", change.description),
            },
            _ => format!("-- unrecognized column change: {}", change.description),
        }
    }
}

fn fallback_column(name: &str) -> SchemaColumn {
    SchemaColumn {
        name: name.to_string(),
        data_type: schemectl_core::NormalizedType::simple(schemectl_core::TypeCategory::Unknown),
        native_type: "TEXT".to_string(),
        nullable: true,
        primary_key: false,
        identity: false,
        max_length: None,
        precision: None,
        scale: None,
        default_value: None,
    }
}

impl SqlEmitter for SqliteEmitter {
    fn quote_ident(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Renders one `SchemaChange`. SQLite's `ALTER TABLE` is limited (no
    /// `ALTER COLUMN`, no constraint changes at all), so anything beyond a
    /// plain add/drop column is synthesized as a rebuild-via-temp-table
    /// script from the change's JSON-encoded `table`/`column` properties. A
    /// differ-populated `sql_command` is always preferred when present.
    fn render(&self, change: &SchemaChange) -> RenderedStatement {
        if !change.sql_command.is_empty() {
            return RenderedStatement { sql: change.sql_command.clone(), rollback_sql: change.rollback_sql.clone(), transactional: true };
        }

        let qualified = self.quote_ident(&change.qualified_name);
        let sql = match (change.operation, change.object_kind) {
            (OperationKind::Create, ObjectKind::Table) => match change.decode_property::<SchemaTable>("table") {
                Some(table) => format!("CREATE TABLE {qualified} (\n  {}\n);", self.table_body(&table, None, None)),
                None => format!("CREATE TABLE {qualified} ();"),
            },
            (OperationKind::Drop, ObjectKind::Table) => format!("DROP TABLE {qualified};"),

            (OperationKind::Alter, ObjectKind::Column) => {
                let (table_name, column_name) = SchemaChange::split_qualified(&change.qualified_name);
                self.render_alter_column(change, table_name, column_name)
            }

            (OperationKind::Create, ObjectKind::Constraint) => match change.decode_property::<SchemaTable>("table") {
                Some(table) => self.rebuild_script(&table, None, None, None),
                None => format!("-- missing table definition for rebuild: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::Constraint) => {
                let (_, constraint_name) = SchemaChange::split_qualified(&change.qualified_name);
                match change.decode_property::<SchemaTable>("table") {
                    Some(table) => self.rebuild_script(&table, None, None, Some(constraint_name)),
                    None => format!("-- missing table definition for rebuild: {}", change.description),
                }
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
            (OperationKind::Drop, ObjectKind::Index) => format!("DROP INDEX {qualified};"),

            (OperationKind::Create | OperationKind::Alter, ObjectKind::View) => match change.decode_property::<SchemaView>("object") {
                Some(view) => format!("DROP VIEW IF EXISTS {qualified};\nCREATE VIEW {qualified} AS {};", view.definition.trim().trim_end_matches(';')),
                None => format!("-- missing view definition: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::View) => format!("DROP VIEW {qualified};"),

            (OperationKind::Create | OperationKind::Alter, ObjectKind::Procedure) => match change.decode_property::<SchemaProcedure>("object") {
                Some(procedure) => format!("-- SQLite has no stored procedures; recorded as a note: {}", procedure.definition.trim()),
                None => format!("-- missing procedure definition: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::Procedure) => format!("-- SQLite has no stored procedures to drop: {qualified}"),

            (OperationKind::Create | OperationKind::Alter, ObjectKind::Function) => match change.decode_property::<SchemaFunction>("object") {
                Some(function) => format!("-- SQLite user-defined functions are registered by the host application, not DDL: {}", function.definition.trim()),
                None => format!("-- missing function definition: {}", change.description),
            },
            (OperationKind::Drop, ObjectKind::Function) => format!("-- SQLite user-defined functions are registered by the host application, not DDL: {qualified}"),

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
            schema_namespace: "main".to_string(),
            description: String::new(),
            risk_level: schemectl_core::RiskLevel::Risky,
            properties: BTreeMap::new(),
            sql_command: String::new(),
            rollback_sql: None,
            dependencies: Vec::new(),
        }
    }

    fn sample_table() -> SchemaTable {
        SchemaTable {
            name: "orders".to_string(),
            schema_namespace: "main".to_string(),
            columns: vec![
                SchemaColumn {
                    name: "id".to_string(),
                    data_type: NormalizedType::simple(TypeCategory::Integer),
                    native_type: "INTEGER".to_string(),
                    nullable: false,
                    primary_key: true,
                    identity: true,
                    max_length: None,
                    precision: None,
                    scale: None,
                    default_value: None,
                },
                SchemaColumn {
                    name: "status".to_string(),
                    data_type: NormalizedType::simple(TypeCategory::Text),
                    native_type: "TEXT".to_string(),
                    nullable: true,
                    primary_key: false,
                    identity: false,
                    max_length: None,
                    precision: None,
                    scale: None,
                    default_value: None,
                },
            ],
            indexes: Vec::new(),
            constraints: Vec::new(),
        }
    }

    #[test]
    fn quotes_identifiers_with_embedded_quotes() {
        assert_eq!(SqliteEmitter.quote_ident(r#"weird"name"#), "\"weird\"\"name\"");
    }

    #[test]
    fn renders_drop_index_when_no_sql_command_present() {
        let rendered = SqliteEmitter.render(&change(OperationKind::Drop, ObjectKind::Index, "idx_orders_customer"));
        assert_eq!(rendered.sql, "DROP INDEX \"idx_orders_customer\";");
    }

    #[test]
    fn prefers_precomputed_rebuild_script() {
        let mut c = change(OperationKind::Alter, ObjectKind::Column, "orders.status");
        c.sql_command = "ALTER TABLE orders RENAME TO orders_old; CREATE TABLE orders (...);".to_string();
        let rendered = SqliteEmitter.render(&c);
        assert!(rendered.sql.starts_with("ALTER TABLE orders RENAME TO orders_old"));
    }

    #[test]
    fn renders_create_table_from_table_property() {
        let mut c = change(OperationKind::Create, ObjectKind::Table, "orders");
        c.set_json_property("table", &sample_table());
        let rendered = SqliteEmitter.render(&c);
        assert!(!rendered.sql.trim_start().starts_with("--"));
        assert!(rendered.sql.contains("CREATE TABLE \"orders\""));
        assert!(rendered.sql.contains("PRIMARY KEY AUTOINCREMENT"));
    }

    #[test]
    fn renders_add_column_natively() {
        let mut c = change(OperationKind::Alter, ObjectKind::Column, "orders.note");
        c.set_property("change_type", "add");
        let column = SchemaColumn {
            name: "note".to_string(),
            data_type: NormalizedType::simple(TypeCategory::Text),
            native_type: "TEXT".to_string(),
            nullable: true,
            primary_key: false,
            identity: false,
            max_length: None,
            precision: None,
            scale: None,
            default_value: None,
        };
        c.set_json_property("column", &column);
        let rendered = SqliteEmitter.render(&c);
        assert!(!rendered.sql.trim_start().starts_with("--"));
        assert_eq!(rendered.sql, "ALTER TABLE \"orders\" ADD COLUMN \"note\" TEXT;");
    }

    #[test]
    fn renders_type_change_as_rebuild_script() {
        let mut c = change(OperationKind::Alter, ObjectKind::Column, "orders.status");
        c.set_property("change_type", "type_change");
        c.set_json_property("table", &sample_table());
        let new_status = SchemaColumn {
            name: "status".to_string(),
            data_type: NormalizedType::simple(TypeCategory::Integer),
            native_type: "INTEGER".to_string(),
            nullable: false,
            primary_key: false,
            identity: false,
            max_length: None,
            precision: None,
            scale: None,
            default_value: None,
        };
        c.set_json_property("column", &new_status);
        let rendered = SqliteEmitter.render(&c);
        assert!(!rendered.sql.trim_start().starts_with("--"));
        assert!(rendered.sql.contains("CREATE TABLE \"tmp_rebuild_orders\""));
        assert!(rendered.sql.contains("\"status\" INTEGER NOT NULL"));
        assert!(rendered.sql.contains("INSERT INTO \"tmp_rebuild_orders\""));
        assert!(rendered.sql.contains("DROP TABLE \"orders\";"));
        assert!(rendered.sql.contains("ALTER TABLE \"tmp_rebuild_orders\" RENAME TO \"orders\";"));
    }

    #[test]
    fn renders_drop_constraint_as_rebuild_script_excluding_it() {
        let mut table = sample_table();
        table.constraints.push(SchemaConstraint {
            name: "uq_status".to_string(),
            kind: ConstraintKind::Unique,
            table: "orders".to_string(),
            columns: vec!["status".to_string()],
            referenced_table: None,
            referenced_columns: Vec::new(),
            on_delete: None,
            on_update: None,
            check_expression: None,
        });
        let mut c = change(OperationKind::Drop, ObjectKind::Constraint, "orders.uq_status");
        c.set_json_property("table", &table);
        let rendered = SqliteEmitter.render(&c);
        assert!(!rendered.sql.trim_start().starts_with("--"));
        assert!(!rendered.sql.contains("UNIQUE"));
        assert!(rendered.sql.contains("CREATE TABLE \"tmp_rebuild_orders\""));
    }
}
