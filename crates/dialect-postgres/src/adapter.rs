use std::sync::Mutex;

use postgres::{Client, NoTls, Row};
use schemectl_core::{
    BackupConfig, BackupRequest, ConnectionConfig, ConnectionStringBuilder, ConstraintKind,
    DatabaseSchema, Error, ProviderAdapter, QueryResult, QueryRow, ReferentialAction, Result,
    SchemaColumn, SchemaConstraint, SchemaFunction, SchemaIndex, SchemaProcedure, SchemaTable,
    SchemaView,
};

use crate::{backup, datatype, introspect_queries as q};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5432;

pub struct PostgresAdapter {
    client: Mutex<Client>,
}

impl PostgresAdapter {
    /// Opens a connection using the same `postgres::Config` builder pattern
    /// the dialect has always used, generalized to the shared
    /// `ConnectionConfig`.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        let mut pg_config = postgres::Config::new();
        pg_config.host(if config.server.is_empty() { DEFAULT_HOST } else { &config.server });
        pg_config.port(config.port.unwrap_or(DEFAULT_PORT));
        pg_config.user(&config.username);
        if let Some(password) = &config.password {
            pg_config.password(password);
        }
        pg_config.dbname(&config.database);

        let mut client = pg_config.connect(NoTls).map_err(|e| Error::connectivity("postgresql", e))?;
        let version_row = client.query_one(q::SHOW_SERVER_VERSION, &[]).map_err(query_error(q::SHOW_SERVER_VERSION))?;
        let raw_version: String = version_row.get(0);
        tracing::debug!(server_version = %raw_version, "connected to postgres");
        Ok(Self { client: Mutex::new(client) })
    }

    fn with_client<T>(&self, f: impl FnOnce(&mut Client) -> Result<T>) -> Result<T> {
        let mut client = self.client.lock().map_err(|_| Error::connectivity("postgresql", std::io::Error::other("connection mutex poisoned")))?;
        f(&mut client)
    }
}

fn decode_column(row: &Row) -> SchemaColumn {
    let native_type: String = row.get("data_type");
    let data_type = datatype::normalize(&native_type);
    SchemaColumn {
        name: row.get("column_name"),
        max_length: data_type.size,
        precision: data_type.precision,
        scale: data_type.scale,
        data_type,
        native_type,
        nullable: row.get("nullable"),
        primary_key: false,
        identity: row.get("identity"),
        default_value: row.get("default_expr"),
    }
}

fn constraint_kind(tag: &str) -> Option<ConstraintKind> {
    match tag {
        "p" => Some(ConstraintKind::PrimaryKey),
        "u" => Some(ConstraintKind::Unique),
        "f" => Some(ConstraintKind::ForeignKey),
        "c" => Some(ConstraintKind::Check),
        _ => None,
    }
}

fn referential_action(tag: &str) -> Option<ReferentialAction> {
    match tag {
        "a" => Some(ReferentialAction::NoAction),
        "c" => Some(ReferentialAction::Cascade),
        "n" => Some(ReferentialAction::SetNull),
        "d" => Some(ReferentialAction::SetDefault),
        "r" => Some(ReferentialAction::Restrict),
        _ => None,
    }
}

fn decode_constraint(row: &Row, table: &str) -> Option<SchemaConstraint> {
    let kind = constraint_kind(row.get("constraint_type"))?;
    let referenced_table: Option<String> = row.get("referenced_table");
    let referenced_schema: Option<String> = row.get("referenced_schema");
    Some(SchemaConstraint {
        name: row.get("constraint_name"),
        kind,
        table: table.to_string(),
        columns: row.get("columns"),
        referenced_table: referenced_table.map(|t| match &referenced_schema {
            Some(schema) => format!("{schema}.{t}"),
            None => t,
        }),
        referenced_columns: row.get("referenced_columns"),
        on_delete: row.get::<_, Option<String>>("on_delete").and_then(|v| referential_action(&v)),
        on_update: row.get::<_, Option<String>>("on_update").and_then(|v| referential_action(&v)),
        check_expression: if kind == ConstraintKind::Check { Some(row.get("definition")) } else { None },
    })
}

fn decode_index(row: &Row, table: &str) -> SchemaIndex {
    SchemaIndex {
        name: row.get("index_name"),
        table: table.to_string(),
        columns: row.get("columns"),
        unique: row.get("is_unique"),
        clustered: row.get("is_clustered"),
        filter_expression: None,
    }
}

impl ProviderAdapter for PostgresAdapter {
    fn introspect(&mut self, schema_namespace: &str) -> Result<DatabaseSchema> {
        self.with_client(|client| {
            let mut schema = DatabaseSchema::empty("postgresql", "", chrono_now());

            let table_rows = client.query(q::TABLE_NAMES, &[&schema_namespace]).map_err(query_error(q::TABLE_NAMES))?;
            for table_row in &table_rows {
                let name: String = table_row.get("table_name");

                let column_rows = client.query(q::TABLE_COLUMNS, &[&schema_namespace, &name]).map_err(query_error(q::TABLE_COLUMNS))?;
                let columns: Vec<SchemaColumn> = column_rows.iter().map(decode_column).collect();

                let constraint_rows = client.query(q::TABLE_CONSTRAINTS, &[&schema_namespace, &name]).map_err(query_error(q::TABLE_CONSTRAINTS))?;
                let constraints: Vec<SchemaConstraint> = constraint_rows.iter().filter_map(|r| decode_constraint(r, &name)).collect();

                let index_rows = client.query(q::TABLE_INDEXES, &[&schema_namespace, &name]).map_err(query_error(q::TABLE_INDEXES))?;
                let indexes: Vec<SchemaIndex> = index_rows.iter().map(|r| decode_index(r, &name)).collect();

                schema.tables.push(SchemaTable { name, schema_namespace: schema_namespace.to_string(), columns, indexes, constraints });
            }

            let view_rows = client.query(q::VIEWS, &[&schema_namespace]).map_err(query_error(q::VIEWS))?;
            for row in &view_rows {
                schema.views.push(SchemaView {
                    name: row.get("table_name"),
                    schema_namespace: schema_namespace.to_string(),
                    definition: row.get::<_, Option<String>>("view_definition").unwrap_or_default(),
                });
            }

            let routine_rows = client.query(q::ROUTINES, &[&schema_namespace]).map_err(query_error(q::ROUTINES))?;
            for row in &routine_rows {
                let routine_type: String = row.get("routine_type");
                let name: String = row.get("routine_name");
                let definition: String = row.get::<_, Option<String>>("routine_definition").unwrap_or_default();
                if routine_type == "FUNCTION" {
                    schema.functions.push(SchemaFunction {
                        name,
                        schema_namespace: schema_namespace.to_string(),
                        definition,
                        return_type: row.get("data_type"),
                        parameters: Vec::new(),
                    });
                } else {
                    schema.procedures.push(SchemaProcedure { name, schema_namespace: schema_namespace.to_string(), definition });
                }
            }

            Ok(schema)
        })
    }

    fn execute(&mut self, sql: &str) -> Result<u64> {
        self.with_client(|client| client.execute(sql, &[]).map_err(|e| execution_error(sql, e)))
    }

    fn query(&mut self, sql: &str) -> Result<QueryResult> {
        self.with_client(|client| {
            let rows = client.query(sql, &[]).map_err(|e| execution_error(sql, e))?;
            let columns: Vec<String> = rows.first().map(|r| r.columns().iter().map(|c| c.name().to_string()).collect()).unwrap_or_default();
            let result_rows = rows
                .iter()
                .map(|row| QueryRow { values: (0..row.len()).map(|i| row.try_get::<_, Option<String>>(i).unwrap_or_default()).collect() })
                .collect();
            Ok(QueryResult { columns, rows: result_rows })
        })
    }

    fn test_connection(&mut self) -> bool {
        self.with_client(|client| client.execute("SELECT 1", &[]).map_err(|e| execution_error("SELECT 1", e))).is_ok()
    }

    fn create_backup(&mut self, request: &BackupRequest, config: &BackupConfig) -> Result<()> {
        backup::run_pg_dump(request, config)
    }

    fn verify_backup(&self, path: &str) -> Result<bool> {
        backup::verify_with_pg_restore_list(path)
    }

    fn restore(&mut self, path: &str) -> Result<()> {
        backup::run_psql_restore(path)
    }
}

pub struct PostgresConnectionStringBuilder;

impl ConnectionStringBuilder for PostgresConnectionStringBuilder {
    fn build_connection_string(&self, config: &ConnectionConfig) -> String {
        let host = if config.server.is_empty() { DEFAULT_HOST } else { config.server.as_str() };
        let port = config.port.unwrap_or(DEFAULT_PORT);
        let mut parts = vec![
            format!("host={host}"),
            format!("port={port}"),
            format!("dbname={}", config.database),
            format!("user={}", config.username),
        ];
        if let Some(password) = &config.password {
            parts.push(format!("password={password}"));
        }
        if let Some(ssl_mode) = config.extra.get("ssl_mode") {
            parts.push(format!("sslmode={ssl_mode}"));
        }
        parts.join(" ")
    }
}

fn query_error(sql: &'static str) -> impl Fn(postgres::Error) -> Error {
    move |e| execution_error(sql, e)
}

fn execution_error(sql: &str, source: postgres::Error) -> Error {
    let message = source.to_string();
    let transient = schemectl_core::classify_transient(&message, None);
    if transient == schemectl_core::TransientKind::None {
        Error::connectivity("postgresql", source)
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
            port: Some(5433),
            database: "app".to_string(),
            username: "app_user".to_string(),
            password: Some("secret".to_string()),
            integrated_auth: false,
            schema_namespace: "public".to_string(),
            extra: BTreeMap::from([("ssl_mode".to_string(), "require".to_string())]),
        }
    }

    #[test]
    fn builds_libpq_style_connection_string() {
        let s = PostgresConnectionStringBuilder.build_connection_string(&config());
        assert_eq!(s, "host=db.internal port=5433 dbname=app user=app_user password=secret sslmode=require");
    }

    #[test]
    fn decodes_constraint_kind_tags() {
        assert_eq!(constraint_kind("p"), Some(ConstraintKind::PrimaryKey));
        assert_eq!(constraint_kind("f"), Some(ConstraintKind::ForeignKey));
        assert_eq!(constraint_kind("x"), None);
    }
}
