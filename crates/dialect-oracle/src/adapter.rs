use std::collections::BTreeSet;
use std::sync::Mutex;

use oracle::{Connection, Row};
use schemectl_core::{
    BackupConfig, BackupRequest, ConnectionConfig, ConnectionStringBuilder, ConstraintKind,
    DatabaseSchema, Error, ProviderAdapter, QueryResult, QueryRow, ReferentialAction, Result,
    SchemaColumn, SchemaConstraint, SchemaFunction, SchemaIndex, SchemaProcedure, SchemaTable,
    SchemaView,
};

use crate::{backup, datatype, introspect_queries as q};

pub struct OracleAdapter {
    conn: Mutex<Connection>,
}

impl OracleAdapter {
    /// Opens a connection via OCI, matching the connection surface the
    /// `oracle` crate exposes directly (`Connection::connect(user, pass,
    /// connect_string)`): the connect string is `host:port/service_name`.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        let connect_string = format!("{}:{}/{}", config.server, config.port.unwrap_or(1521), config.database);
        let conn = Connection::connect(&config.username, config.password.as_deref().unwrap_or_default(), &connect_string)
            .map_err(|e| Error::connectivity("oracle", e))?;
        let version: String = conn.query_row_as(q::SHOW_SERVER_VERSION, &[]).map_err(query_error(q::SHOW_SERVER_VERSION))?;
        tracing::debug!(server_version = %version, "connected to oracle");
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock().map_err(|_| Error::connectivity("oracle", std::io::Error::other("connection mutex poisoned")))?;
        f(&conn)
    }
}

fn get_string(row: &Row, column: &str) -> String {
    row.get::<_, Option<String>>(column).ok().flatten().unwrap_or_default()
}

fn get_opt_string(row: &Row, column: &str) -> Option<String> {
    row.get::<_, Option<String>>(column).ok().flatten()
}

fn get_opt_u32(row: &Row, column: &str) -> Option<u32> {
    row.get::<_, Option<i64>>(column).ok().flatten().and_then(|v| u32::try_from(v).ok())
}

fn decode_column(row: &Row, identity_columns: &BTreeSet<String>) -> SchemaColumn {
    let name = get_string(row, "column_name");
    let data_type = get_string(row, "data_type");
    let normalized = datatype::with_dimensions(
        datatype::normalize(&data_type),
        get_opt_u32(row, "data_precision"),
        get_opt_u32(row, "data_scale"),
        get_opt_u32(row, "char_length"),
    );
    SchemaColumn {
        identity: identity_columns.contains(&name),
        name,
        max_length: normalized.size,
        precision: normalized.precision,
        scale: normalized.scale,
        data_type: normalized,
        native_type: data_type,
        nullable: get_string(row, "nullable") == "Y",
        primary_key: false,
        default_value: get_opt_string(row, "data_default"),
    }
}

fn constraint_kind(tag: &str) -> Option<ConstraintKind> {
    match tag {
        "P" => Some(ConstraintKind::PrimaryKey),
        "U" => Some(ConstraintKind::Unique),
        "R" => Some(ConstraintKind::ForeignKey),
        "C" => Some(ConstraintKind::Check),
        _ => None,
    }
}

fn referential_action(tag: &str) -> Option<ReferentialAction> {
    match tag {
        "NO ACTION" => Some(ReferentialAction::NoAction),
        "CASCADE" => Some(ReferentialAction::Cascade),
        "SET NULL" => Some(ReferentialAction::SetNull),
        _ => None,
    }
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.map(|s| s.split(',').map(|part| part.trim().to_string()).collect()).unwrap_or_default()
}

fn decode_constraint(conn: &Connection, row: &Row, table: &str) -> Result<Option<SchemaConstraint>> {
    let Some(kind) = constraint_kind(&get_string(row, "constraint_type")) else { return Ok(None) };
    let name = get_string(row, "constraint_name");
    let referenced_table = get_opt_string(row, "r_table_name");
    let referenced_owner = get_opt_string(row, "r_owner");

    let referenced_columns = if kind == ConstraintKind::ForeignKey {
        match &referenced_owner {
            Some(owner) => query_column_list(conn, q::FOREIGN_KEY_COLUMNS, owner, &name)?,
            None => Vec::new(),
        }
    } else {
        Vec::new()
    };

    Ok(Some(SchemaConstraint {
        name,
        kind,
        table: table.to_string(),
        columns: split_list(get_opt_string(row, "columns")),
        referenced_table: referenced_table.map(|t| match &referenced_owner {
            Some(owner) => format!("{owner}.{t}"),
            None => t,
        }),
        referenced_columns,
        on_delete: get_opt_string(row, "delete_rule").and_then(|v| referential_action(&v)),
        on_update: None,
        check_expression: None,
    }))
}

fn query_column_list(conn: &Connection, sql: &str, p1: &str, p2: &str) -> Result<Vec<String>> {
    let rows = conn.query(sql, &[&p1, &p2]).map_err(|e| execution_error(sql, e))?;
    rows.into_iter()
        .map(|row| row.map_err(|e| execution_error(sql, e)).map(|r| get_string(&r, "column_name")))
        .collect()
}

fn decode_index(row: &Row, table: &str) -> SchemaIndex {
    SchemaIndex {
        name: get_string(row, "index_name"),
        table: table.to_string(),
        columns: split_list(get_opt_string(row, "columns")),
        unique: get_string(row, "uniqueness") == "UNIQUE",
        clustered: false,
        filter_expression: None,
    }
}

fn source_text(conn: &Connection, owner: &str, name: &str) -> Result<String> {
    let rows = conn.query(q::SOURCE_TEXT, &[&owner, &name]).map_err(query_error(q::SOURCE_TEXT))?;
    let mut lines = Vec::new();
    for row in rows {
        let row = row.map_err(query_error(q::SOURCE_TEXT))?;
        lines.push(get_string(&row, "text"));
    }
    Ok(lines.concat())
}

impl ProviderAdapter for OracleAdapter {
    fn introspect(&mut self, schema_namespace: &str) -> Result<DatabaseSchema> {
        self.with_conn(|conn| {
            let mut schema = DatabaseSchema::empty("oracle", "", chrono_now());
            let owner = schema_namespace.to_ascii_uppercase();

            let table_rows = conn.query(q::TABLE_NAMES, &[&owner]).map_err(query_error(q::TABLE_NAMES))?;
            for table_row in table_rows {
                let table_row = table_row.map_err(query_error(q::TABLE_NAMES))?;
                let name = get_string(&table_row, "table_name");

                let identity_rows = conn.query(q::IDENTITY_COLUMNS, &[&owner, &name]).map_err(query_error(q::IDENTITY_COLUMNS))?;
                let mut identity_columns = BTreeSet::new();
                for row in identity_rows {
                    identity_columns.insert(get_string(&row.map_err(query_error(q::IDENTITY_COLUMNS))?, "column_name"));
                }

                let column_rows = conn.query(q::TABLE_COLUMNS, &[&owner, &name]).map_err(query_error(q::TABLE_COLUMNS))?;
                let mut columns = Vec::new();
                for row in column_rows {
                    columns.push(decode_column(&row.map_err(query_error(q::TABLE_COLUMNS))?, &identity_columns));
                }

                let constraint_rows = conn.query(q::TABLE_CONSTRAINTS, &[&owner, &name]).map_err(query_error(q::TABLE_CONSTRAINTS))?;
                let mut constraints = Vec::new();
                for row in constraint_rows {
                    if let Some(c) = decode_constraint(conn, &row.map_err(query_error(q::TABLE_CONSTRAINTS))?, &name)? {
                        constraints.push(c);
                    }
                }

                let index_rows = conn.query(q::TABLE_INDEXES, &[&owner, &name]).map_err(query_error(q::TABLE_INDEXES))?;
                let mut indexes = Vec::new();
                for row in index_rows {
                    indexes.push(decode_index(&row.map_err(query_error(q::TABLE_INDEXES))?, &name));
                }

                schema.tables.push(SchemaTable { name, schema_namespace: schema_namespace.to_string(), columns, indexes, constraints });
            }

            let view_rows = conn.query(q::VIEWS, &[&owner]).map_err(query_error(q::VIEWS))?;
            for row in view_rows {
                let row = row.map_err(query_error(q::VIEWS))?;
                schema.views.push(SchemaView { name: get_string(&row, "view_name"), schema_namespace: schema_namespace.to_string(), definition: get_string(&row, "text") });
            }

            let procedure_rows = conn.query(q::PROCEDURES, &[&owner]).map_err(query_error(q::PROCEDURES))?;
            for row in procedure_rows {
                let row = row.map_err(query_error(q::PROCEDURES))?;
                let name = get_string(&row, "object_name");
                let definition = source_text(conn, &owner, &name)?;
                schema.procedures.push(SchemaProcedure { name, schema_namespace: schema_namespace.to_string(), definition });
            }

            let function_rows = conn.query(q::FUNCTIONS, &[&owner]).map_err(query_error(q::FUNCTIONS))?;
            for row in function_rows {
                let row = row.map_err(query_error(q::FUNCTIONS))?;
                let name = get_string(&row, "object_name");
                let definition = source_text(conn, &owner, &name)?;
                schema.functions.push(SchemaFunction { name, schema_namespace: schema_namespace.to_string(), definition, return_type: None, parameters: Vec::new() });
            }

            Ok(schema)
        })
    }

    fn execute(&mut self, sql: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let stmt = conn.execute(sql, &[]).map_err(|e| execution_error(sql, e))?;
            Ok(stmt.row_count().unwrap_or(0))
        })
    }

    fn query(&mut self, sql: &str) -> Result<QueryResult> {
        self.with_conn(|conn| {
            let rows = conn.query(sql, &[]).map_err(|e| execution_error(sql, e))?;
            let columns: Vec<String> = rows.column_info().iter().map(|c| c.name().to_string()).collect();
            let mut result_rows = Vec::new();
            for row in rows {
                let row = row.map_err(|e| execution_error(sql, e))?;
                result_rows.push(QueryRow { values: (0..columns.len()).map(|i| row.get::<usize, Option<String>>(i).ok().flatten()).collect() });
            }
            Ok(QueryResult { columns, rows: result_rows })
        })
    }

    fn test_connection(&mut self) -> bool {
        self.with_conn(|conn| conn.execute("SELECT 1 FROM dual", &[]).map(|_| ()).map_err(|e| execution_error("SELECT 1 FROM dual", e))).is_ok()
    }

    /// Oracle has no explicit `BEGIN`; a transaction is implicitly open from
    /// the first DML statement and ends at commit/rollback.
    fn begin_transaction(&mut self) -> Result<()> {
        Ok(())
    }

    fn create_backup(&mut self, request: &BackupRequest, config: &BackupConfig) -> Result<()> {
        backup::run_expdp(request, config)
    }

    fn verify_backup(&self, path: &str) -> Result<bool> {
        backup::verify_dump_header(path)
    }

    fn restore(&mut self, path: &str) -> Result<()> {
        backup::run_impdp(path)
    }
}

pub struct OracleConnectionStringBuilder;

impl ConnectionStringBuilder for OracleConnectionStringBuilder {
    fn build_connection_string(&self, config: &ConnectionConfig) -> String {
        format!(
            "{}/{}@{}:{}/{}",
            config.username,
            config.password.as_deref().unwrap_or(""),
            config.server,
            config.port.unwrap_or(1521),
            config.database
        )
    }
}

fn query_error(sql: &'static str) -> impl Fn(oracle::Error) -> Error {
    move |e| execution_error(sql, e)
}

fn execution_error(sql: &str, source: oracle::Error) -> Error {
    let message = source.to_string();
    let transient = schemectl_core::classify_transient(&message, None);
    if transient == schemectl_core::TransientKind::None {
        Error::connectivity("oracle", source)
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
    use std::collections::BTreeMap;

    fn config() -> ConnectionConfig {
        ConnectionConfig {
            server: "db.internal".to_string(),
            port: Some(1522),
            database: "ORCLPDB".to_string(),
            username: "app_user".to_string(),
            password: Some("secret".to_string()),
            integrated_auth: false,
            schema_namespace: "APP".to_string(),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn builds_easy_connect_string() {
        let s = OracleConnectionStringBuilder.build_connection_string(&config());
        assert_eq!(s, "app_user/secret@db.internal:1522/ORCLPDB");
    }

    #[test]
    fn decodes_constraint_kind_tags() {
        assert_eq!(constraint_kind("P"), Some(ConstraintKind::PrimaryKey));
        assert_eq!(constraint_kind("R"), Some(ConstraintKind::ForeignKey));
        assert_eq!(constraint_kind("X"), None);
    }
}
