use std::sync::Mutex;

use rusqlite::Connection;
use schemectl_core::{
    BackupConfig, BackupRequest, ConnectionConfig, ConnectionStringBuilder, ConstraintKind,
    DatabaseSchema, Error, ProviderAdapter, QueryResult, QueryRow, ReferentialAction, Result,
    SchemaColumn, SchemaConstraint, SchemaIndex, SchemaTable, SchemaView,
};

use crate::{backup, datatype, introspect_queries as q};

pub struct SqliteAdapter {
    conn: Mutex<Connection>,
}

impl SqliteAdapter {
    /// Opens the database file directly — SQLite has no server to dial, so
    /// the `ConnectionConfig::database` field is the file path.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn = Connection::open(&config.database).map_err(|e| Error::connectivity("sqlite", e))?;
        let version: String = conn.query_row(q::SHOW_SERVER_VERSION, [], |row| row.get(0)).map_err(query_error(q::SHOW_SERVER_VERSION))?;
        tracing::debug!(server_version = %version, "opened sqlite database");
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock().map_err(|_| Error::connectivity("sqlite", std::io::Error::other("connection mutex poisoned")))?;
        f(&conn)
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn table_info(conn: &Connection, table: &str) -> Result<Vec<SchemaColumn>> {
    let sql = q::TABLE_INFO.replace("%s", &quote_ident(table));
    let mut stmt = conn.prepare(&sql).map_err(|e| execution_error(&sql, e))?;
    let primary_keys: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
    let mut pk_order: Vec<(i64, String)> = Vec::new();
    let rows = stmt
        .query_map([], |row| {
            let name: String = row.get("name")?;
            let native_type: String = row.get("type")?;
            let notnull: bool = row.get::<_, i64>("notnull")? != 0;
            let default_value: Option<String> = row.get("dflt_value")?;
            let pk: i64 = row.get("pk")?;
            Ok((name, native_type, notnull, default_value, pk))
        })
        .map_err(|e| execution_error(&sql, e))?;

    let mut columns = Vec::new();
    for row in rows {
        let (name, native_type, notnull, default_value, pk) = row.map_err(|e| execution_error(&sql, e))?;
        if pk > 0 {
            pk_order.push((pk, name.clone()));
        }
        let data_type = datatype::normalize(&native_type);
        columns.push(SchemaColumn {
            max_length: data_type.size,
            precision: data_type.precision,
            scale: data_type.scale,
            data_type,
            native_type,
            nullable: !notnull,
            primary_key: pk > 0,
            identity: false,
            default_value,
            name,
        });
    }
    let _ = primary_keys;
    Ok(columns)
}

fn primary_key_constraint(conn: &Connection, table: &str) -> Result<Option<SchemaConstraint>> {
    let sql = q::TABLE_INFO.replace("%s", &quote_ident(table));
    let mut stmt = conn.prepare(&sql).map_err(|e| execution_error(&sql, e))?;
    let rows = stmt
        .query_map([], |row| {
            let name: String = row.get("name")?;
            let pk: i64 = row.get("pk")?;
            Ok((pk, name))
        })
        .map_err(|e| execution_error(&sql, e))?;

    let mut ordered: Vec<(i64, String)> = Vec::new();
    for row in rows {
        let (pk, name) = row.map_err(|e| execution_error(&sql, e))?;
        if pk > 0 {
            ordered.push((pk, name));
        }
    }
    if ordered.is_empty() {
        return Ok(None);
    }
    ordered.sort_by_key(|(pk, _)| *pk);
    let columns: Vec<String> = ordered.into_iter().map(|(_, name)| name).collect();
    Ok(Some(SchemaConstraint {
        name: format!("pk_{table}"),
        kind: ConstraintKind::PrimaryKey,
        table: table.to_string(),
        columns,
        referenced_table: None,
        referenced_columns: Vec::new(),
        on_delete: None,
        on_update: None,
        check_expression: None,
    }))
}

fn foreign_keys(conn: &Connection, table: &str) -> Result<Vec<SchemaConstraint>> {
    let sql = q::FOREIGN_KEY_LIST.replace("%s", &quote_ident(table));
    let mut stmt = conn.prepare(&sql).map_err(|e| execution_error(&sql, e))?;
    let rows = stmt
        .query_map([], |row| {
            let id: i64 = row.get("id")?;
            let referenced_table: String = row.get("table")?;
            let from: String = row.get("from")?;
            let to: String = row.get("to")?;
            let on_update: String = row.get("on_update")?;
            let on_delete: String = row.get("on_delete")?;
            Ok((id, referenced_table, from, to, on_update, on_delete))
        })
        .map_err(|e| execution_error(&sql, e))?;

    let mut by_id: std::collections::BTreeMap<i64, (String, Vec<String>, Vec<String>, String, String)> = std::collections::BTreeMap::new();
    for row in rows {
        let (id, referenced_table, from, to, on_update, on_delete) = row.map_err(|e| execution_error(&sql, e))?;
        let entry = by_id.entry(id).or_insert_with(|| (referenced_table, Vec::new(), Vec::new(), on_update, on_delete));
        entry.1.push(from);
        entry.2.push(to);
    }

    Ok(by_id
        .into_iter()
        .map(|(id, (referenced_table, columns, referenced_columns, on_update, on_delete))| SchemaConstraint {
            name: format!("fk_{table}_{id}"),
            kind: ConstraintKind::ForeignKey,
            table: table.to_string(),
            columns,
            referenced_table: Some(referenced_table),
            referenced_columns,
            on_delete: referential_action(&on_delete),
            on_update: referential_action(&on_update),
            check_expression: None,
        })
        .collect())
}

fn referential_action(tag: &str) -> Option<ReferentialAction> {
    match tag.to_ascii_uppercase().as_str() {
        "NO ACTION" => Some(ReferentialAction::NoAction),
        "CASCADE" => Some(ReferentialAction::Cascade),
        "SET NULL" => Some(ReferentialAction::SetNull),
        "SET DEFAULT" => Some(ReferentialAction::SetDefault),
        "RESTRICT" => Some(ReferentialAction::Restrict),
        _ => None,
    }
}

fn indexes(conn: &Connection, table: &str) -> Result<Vec<SchemaIndex>> {
    let list_sql = q::INDEX_LIST.replace("%s", &quote_ident(table));
    let mut stmt = conn.prepare(&list_sql).map_err(|e| execution_error(&list_sql, e))?;
    let index_names: Vec<(String, bool, String)> = stmt
        .query_map([], |row| {
            let name: String = row.get("name")?;
            let unique: bool = row.get::<_, i64>("unique")? != 0;
            let origin: String = row.get("origin")?;
            Ok((name, unique, origin))
        })
        .map_err(|e| execution_error(&list_sql, e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| execution_error(&list_sql, e))?;

    let mut result = Vec::new();
    for (name, unique, origin) in index_names {
        if origin == "pk" {
            continue;
        }
        let info_sql = q::INDEX_INFO.replace("%s", &quote_ident(&name));
        let mut info_stmt = conn.prepare(&info_sql).map_err(|e| execution_error(&info_sql, e))?;
        let columns: Vec<String> = info_stmt
            .query_map([], |row| row.get::<_, Option<String>>("name"))
            .map_err(|e| execution_error(&info_sql, e))?
            .filter_map(std::result::Result::ok)
            .flatten()
            .collect();
        result.push(SchemaIndex { name, table: table.to_string(), columns, unique, clustered: false, filter_expression: None });
    }
    Ok(result)
}

impl ProviderAdapter for SqliteAdapter {
    fn introspect(&mut self, _schema_namespace: &str) -> Result<DatabaseSchema> {
        self.with_conn(|conn| {
            let mut schema = DatabaseSchema::empty("sqlite", "", chrono_now());

            let mut stmt = conn.prepare(q::TABLE_NAMES).map_err(|e| execution_error(q::TABLE_NAMES, e))?;
            let table_names: Vec<String> = stmt
                .query_map([], |row| row.get(0))
                .map_err(|e| execution_error(q::TABLE_NAMES, e))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| execution_error(q::TABLE_NAMES, e))?;
            drop(stmt);

            for name in table_names {
                let columns = table_info(conn, &name)?;
                let mut constraints: Vec<SchemaConstraint> = primary_key_constraint(conn, &name)?.into_iter().collect();
                constraints.extend(foreign_keys(conn, &name)?);
                let indexes = indexes(conn, &name)?;
                schema.tables.push(SchemaTable { name, schema_namespace: "main".to_string(), columns, indexes, constraints });
            }

            let mut view_stmt = conn.prepare(q::VIEWS).map_err(|e| execution_error(q::VIEWS, e))?;
            let views: Vec<(String, String)> = view_stmt
                .query_map([], |row| Ok((row.get(0)?, row.get::<_, Option<String>>(1)?.unwrap_or_default())))
                .map_err(|e| execution_error(q::VIEWS, e))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| execution_error(q::VIEWS, e))?;
            for (name, definition) in views {
                schema.views.push(SchemaView { name, schema_namespace: "main".to_string(), definition });
            }

            Ok(schema)
        })
    }

    fn execute(&mut self, sql: &str) -> Result<u64> {
        self.with_conn(|conn| conn.execute(sql, []).map(|n| n as u64).map_err(|e| execution_error(sql, e)))
    }

    fn query(&mut self, sql: &str) -> Result<QueryResult> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql).map_err(|e| execution_error(sql, e))?;
            let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
            let column_count = columns.len();
            let rows = stmt
                .query_map([], |row| {
                    Ok(QueryRow { values: (0..column_count).map(|i| row.get::<_, Option<String>>(i).unwrap_or_default()).collect() })
                })
                .map_err(|e| execution_error(sql, e))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| execution_error(sql, e))?;
            Ok(QueryResult { columns, rows })
        })
    }

    fn test_connection(&mut self) -> bool {
        self.with_conn(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).map(|_| ()).map_err(|e| execution_error("SELECT 1", e))).is_ok()
    }

    fn create_backup(&mut self, request: &BackupRequest, config: &BackupConfig) -> Result<()> {
        self.with_conn(|conn| backup::copy_database_file(conn.path(), request, config))
    }

    fn verify_backup(&self, path: &str) -> Result<bool> {
        backup::verify_header(path)
    }

    fn restore(&mut self, path: &str) -> Result<()> {
        self.with_conn(|conn| backup::restore_database_file(conn.path(), path))
    }
}

pub struct SqliteConnectionStringBuilder;

impl ConnectionStringBuilder for SqliteConnectionStringBuilder {
    fn build_connection_string(&self, config: &ConnectionConfig) -> String {
        format!("sqlite:{}", config.database)
    }
}

fn query_error(sql: &'static str) -> impl Fn(rusqlite::Error) -> Error {
    move |e| execution_error(sql, e)
}

fn execution_error(sql: &str, source: rusqlite::Error) -> Error {
    let message = source.to_string();
    let transient = schemectl_core::classify_transient(&message, None);
    if transient == schemectl_core::TransientKind::None {
        Error::connectivity("sqlite", source)
    } else {
        Error::transient(sql, 1, source)
    }
}

fn chrono_now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_sqlite_file_connection_string() {
        let config = ConnectionConfig {
            server: String::new(),
            port: None,
            database: "/var/data/app.db".to_string(),
            username: String::new(),
            password: None,
            integrated_auth: false,
            schema_namespace: "main".to_string(),
            extra: std::collections::BTreeMap::new(),
        };
        assert_eq!(SqliteConnectionStringBuilder.build_connection_string(&config), "sqlite:/var/data/app.db");
    }

    #[test]
    fn maps_referential_action_tags() {
        assert_eq!(referential_action("CASCADE"), Some(ReferentialAction::Cascade));
        assert_eq!(referential_action("no action"), Some(ReferentialAction::NoAction));
        assert_eq!(referential_action("bogus"), None);
    }
}
