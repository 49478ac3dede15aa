use std::sync::Mutex;

use futures_util::TryStreamExt;
use schemectl_core::{
    BackupConfig, BackupRequest, ConnectionConfig, ConnectionStringBuilder, ConstraintKind,
    DatabaseSchema, Error, ProviderAdapter, QueryResult, QueryRow, ReferentialAction, Result,
    SchemaColumn, SchemaConstraint, SchemaFunction, SchemaIndex, SchemaProcedure, SchemaTable,
    SchemaView,
};
use tiberius::{AuthMethod, Client, Config, QueryItem, Row};
use tokio::{
    net::TcpStream,
    runtime::{Builder, Runtime},
};
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::{backup, datatype, introspect_queries as q};

type TdsClient = Client<Compat<TcpStream>>;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 1433;

pub(crate) struct LiveState {
    runtime: Runtime,
    client: TdsClient,
}

pub(crate) fn execute_admin_sql(state: &mut LiveState, sql: &str) -> Result<()> {
    let LiveState { runtime, client } = state;
    runtime.block_on(async { client.execute(sql, &[]).await.map(|_| ()).map_err(|e| execution_error(sql, e)) })
}

pub struct MssqlAdapter {
    state: Mutex<LiveState>,
}

impl MssqlAdapter {
    /// Bridges `tiberius`'s async client to the synchronous `ProviderAdapter`
    /// surface the way the dialect always has — one `current_thread` runtime
    /// owned per adapter, driven via `block_on`.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build().map_err(|e| Error::connectivity("mssql", e))?;
        let mut tds_config = Config::new();
        let host = if config.server.is_empty() { DEFAULT_HOST } else { &config.server };
        tds_config.host(host);
        tds_config.port(config.port.unwrap_or(DEFAULT_PORT));
        tds_config.database(&config.database);
        if config.integrated_auth {
            return Err(Error::configuration("mssql integrated authentication requires a platform-specific SSPI client, not available over this rustls-only transport"));
        }
        tds_config.authentication(AuthMethod::sql_server(&config.username, config.password.as_deref().unwrap_or_default()));
        tds_config.trust_cert();

        let client = runtime.block_on(async {
            let tcp = TcpStream::connect(tds_config.get_addr()).await.map_err(|e| Error::connectivity("mssql", e))?;
            tcp.set_nodelay(true).map_err(|e| Error::connectivity("mssql", e))?;
            Client::connect(tds_config, tcp.compat_write()).await.map_err(|e| Error::connectivity("mssql", e))
        })?;

        let mut state = LiveState { runtime, client };
        let version = query_scalar(&mut state, q::SHOW_SERVER_VERSION, &[])?;
        tracing::debug!(server_version = %version, "connected to sql server");
        Ok(Self { state: Mutex::new(state) })
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut LiveState) -> Result<T>) -> Result<T> {
        let mut state = self.state.lock().map_err(|_| Error::connectivity("mssql", std::io::Error::other("connection mutex poisoned")))?;
        f(&mut state)
    }
}

fn query_rows(state: &mut LiveState, sql: &str, params: &[&str]) -> Result<Vec<Row>> {
    let LiveState { runtime, client } = state;
    runtime.block_on(async {
        let params: Vec<&dyn tiberius::ToSql> = params.iter().map(|p| p as &dyn tiberius::ToSql).collect();
        let mut stream = client.query(sql, &params).await.map_err(|e| execution_error(sql, e))?;
        let mut rows = Vec::new();
        while let Some(item) = stream.try_next().await.map_err(|e| execution_error(sql, e))? {
            if let QueryItem::Row(row) = item {
                rows.push(row);
            }
        }
        Ok(rows)
    })
}

fn query_scalar(state: &mut LiveState, sql: &str, params: &[&str]) -> Result<String> {
    let rows = query_rows(state, sql, params)?;
    rows.first()
        .and_then(|row| row.get::<&str, usize>(0))
        .map(str::to_string)
        .ok_or_else(|| execution_error(sql, std::io::Error::other("query returned no rows")))
}

fn get_string(row: &Row, column: &str) -> String {
    row.get::<&str, _>(column).unwrap_or_default().to_string()
}

fn get_opt_string(row: &Row, column: &str) -> Option<String> {
    row.get::<&str, _>(column).map(str::to_string)
}

fn get_bool(row: &Row, column: &str) -> bool {
    row.get::<bool, _>(column).unwrap_or(false)
}

fn decode_column(row: &Row) -> SchemaColumn {
    let native_type = get_string(row, "data_type");
    let max_length = row.get::<i16, _>("max_length").unwrap_or(0);
    let precision = row.get::<u8, _>("col_precision").unwrap_or(0);
    let scale = row.get::<u8, _>("col_scale").unwrap_or(0);
    let normalized = datatype::with_dimensions(datatype::normalize(&native_type), &native_type, max_length, precision, scale);
    SchemaColumn {
        name: get_string(row, "column_name"),
        max_length: normalized.size,
        precision: normalized.precision,
        scale: normalized.scale,
        data_type: normalized,
        native_type,
        nullable: get_bool(row, "nullable"),
        primary_key: false,
        identity: get_bool(row, "identity"),
        default_value: get_opt_string(row, "default_expr"),
    }
}

fn constraint_kind(tag: &str) -> Option<ConstraintKind> {
    match tag.trim() {
        "PK" => Some(ConstraintKind::PrimaryKey),
        "UQ" => Some(ConstraintKind::Unique),
        _ => None,
    }
}

fn referential_action(tag: &str) -> Option<ReferentialAction> {
    match tag {
        "NO_ACTION" => Some(ReferentialAction::NoAction),
        "CASCADE" => Some(ReferentialAction::Cascade),
        "SET_NULL" => Some(ReferentialAction::SetNull),
        "SET_DEFAULT" => Some(ReferentialAction::SetDefault),
        _ => None,
    }
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.map(|s| s.split(',').map(|part| part.trim().to_string()).collect()).unwrap_or_default()
}

fn decode_key_constraint(row: &Row, table: &str) -> Option<SchemaConstraint> {
    let kind = constraint_kind(&get_string(row, "constraint_type"))?;
    Some(SchemaConstraint {
        name: get_string(row, "constraint_name"),
        kind,
        table: table.to_string(),
        columns: split_list(get_opt_string(row, "columns")),
        referenced_table: None,
        referenced_columns: Vec::new(),
        on_delete: None,
        on_update: None,
        check_expression: None,
    })
}

fn decode_foreign_key(row: &Row, table: &str) -> SchemaConstraint {
    let referenced_schema = get_string(row, "referenced_schema");
    let referenced_table = get_string(row, "referenced_table");
    SchemaConstraint {
        name: get_string(row, "constraint_name"),
        kind: ConstraintKind::ForeignKey,
        table: table.to_string(),
        columns: split_list(get_opt_string(row, "columns")),
        referenced_table: Some(format!("{referenced_schema}.{referenced_table}")),
        referenced_columns: split_list(get_opt_string(row, "referenced_columns")),
        on_delete: referential_action(&get_string(row, "on_delete")),
        on_update: referential_action(&get_string(row, "on_update")),
        check_expression: None,
    }
}

fn decode_index(row: &Row, table: &str) -> SchemaIndex {
    SchemaIndex {
        name: get_string(row, "index_name"),
        table: table.to_string(),
        columns: split_list(get_opt_string(row, "columns")),
        unique: get_bool(row, "is_unique"),
        clustered: get_bool(row, "is_clustered"),
        filter_expression: None,
    }
}

impl ProviderAdapter for MssqlAdapter {
    fn introspect(&mut self, schema_namespace: &str) -> Result<DatabaseSchema> {
        self.with_state(|state| {
            let mut schema = DatabaseSchema::empty("mssql", "", chrono_now());

            let table_rows = query_rows(state, q::TABLE_NAMES, &[schema_namespace])?;
            for table_row in &table_rows {
                let name = get_string(table_row, "table_name");

                let column_rows = query_rows(state, q::TABLE_COLUMNS, &[schema_namespace, &name])?;
                let columns: Vec<SchemaColumn> = column_rows.iter().map(decode_column).collect();

                let mut constraints: Vec<SchemaConstraint> = query_rows(state, q::TABLE_CONSTRAINTS, &[schema_namespace, &name])?
                    .iter()
                    .filter_map(|r| decode_key_constraint(r, &name))
                    .collect();
                constraints.extend(query_rows(state, q::FOREIGN_KEYS, &[schema_namespace, &name])?.iter().map(|r| decode_foreign_key(r, &name)));

                let indexes: Vec<SchemaIndex> = query_rows(state, q::TABLE_INDEXES, &[schema_namespace, &name])?.iter().map(|r| decode_index(r, &name)).collect();

                schema.tables.push(SchemaTable { name, schema_namespace: schema_namespace.to_string(), columns, indexes, constraints });
            }

            for row in &query_rows(state, q::VIEWS, &[schema_namespace])? {
                schema.views.push(SchemaView {
                    name: get_string(row, "table_name"),
                    schema_namespace: schema_namespace.to_string(),
                    definition: get_opt_string(row, "view_definition").unwrap_or_default(),
                });
            }

            for row in &query_rows(state, q::ROUTINES, &[schema_namespace])? {
                let routine_type = get_string(row, "routine_type");
                let name = get_string(row, "routine_name");
                let definition = get_opt_string(row, "routine_definition").unwrap_or_default();
                if routine_type == "FUNCTION" {
                    schema.functions.push(SchemaFunction {
                        name,
                        schema_namespace: schema_namespace.to_string(),
                        definition,
                        return_type: get_opt_string(row, "data_type"),
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
        self.with_state(|state| {
            let LiveState { runtime, client } = state;
            runtime.block_on(async {
                let result = client.execute(sql, &[]).await.map_err(|e| execution_error(sql, e))?;
                Ok(result.rows_affected().iter().sum())
            })
        })
    }

    fn query(&mut self, sql: &str) -> Result<QueryResult> {
        self.with_state(|state| {
            let rows = query_rows(state, sql, &[])?;
            let columns: Vec<String> = rows.first().map(|r| r.columns().iter().map(|c| c.name().to_string()).collect()).unwrap_or_default();
            let result_rows = rows
                .iter()
                .map(|row| QueryRow { values: (0..columns.len()).map(|i| row.get::<&str, usize>(i).map(str::to_string)).collect() })
                .collect();
            Ok(QueryResult { columns, rows: result_rows })
        })
    }

    fn test_connection(&mut self) -> bool {
        self.with_state(|state| query_scalar(state, "SELECT 1", &[])).is_ok()
    }

    /// SQL Server has no bare `BEGIN` transaction statement; `BEGIN` alone
    /// starts a batch, not a transaction.
    fn begin_transaction(&mut self) -> Result<()> {
        self.execute("BEGIN TRANSACTION").map(|_| ())
    }

    fn create_backup(&mut self, request: &BackupRequest, config: &BackupConfig) -> Result<()> {
        self.with_state(|state| backup::run_backup_database(state, request, config))
    }

    fn verify_backup(&self, path: &str) -> Result<bool> {
        if !schemectl_core::has_content(std::path::Path::new(path)) {
            return Ok(false);
        }
        self.with_state(|state| backup::run_verify_only(state, path))
    }

    fn restore(&mut self, path: &str) -> Result<()> {
        self.with_state(|state| backup::run_restore_database(state, path))
    }
}

pub struct MssqlConnectionStringBuilder;

impl ConnectionStringBuilder for MssqlConnectionStringBuilder {
    fn build_connection_string(&self, config: &ConnectionConfig) -> String {
        let host = if config.server.is_empty() { DEFAULT_HOST } else { config.server.as_str() };
        let port = config.port.unwrap_or(DEFAULT_PORT);
        if config.integrated_auth {
            return format!("Server={host},{port};Database={};Integrated Security=true;", config.database);
        }
        format!(
            "Server={host},{port};Database={};User Id={};Password={};",
            config.database,
            config.username,
            config.password.as_deref().unwrap_or("")
        )
    }
}

fn execution_error<E>(sql: &str, source: E) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    let message = source.to_string();
    let transient = schemectl_core::classify_transient(&message, None);
    if transient == schemectl_core::TransientKind::None {
        Error::connectivity("mssql", source)
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
            port: Some(1434),
            database: "app".to_string(),
            username: "app_user".to_string(),
            password: Some("secret".to_string()),
            integrated_auth: false,
            schema_namespace: "dbo".to_string(),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn builds_sql_server_style_connection_string() {
        let s = MssqlConnectionStringBuilder.build_connection_string(&config());
        assert_eq!(s, "Server=db.internal,1434;Database=app;User Id=app_user;Password=secret;");
    }

    #[test]
    fn builds_integrated_auth_connection_string() {
        let mut c = config();
        c.integrated_auth = true;
        let s = MssqlConnectionStringBuilder.build_connection_string(&c);
        assert_eq!(s, "Server=db.internal,1434;Database=app;Integrated Security=true;");
    }

    #[test]
    fn decodes_constraint_kind_tags() {
        assert_eq!(constraint_kind("PK"), Some(ConstraintKind::PrimaryKey));
        assert_eq!(constraint_kind("UQ"), Some(ConstraintKind::Unique));
        assert_eq!(constraint_kind("CHECK"), None);
    }
}
