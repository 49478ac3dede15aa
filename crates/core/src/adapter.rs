use std::{thread, time::Duration};

use crate::{
    config::{BackupConfig, ConnectionConfig, RetryConfig},
    error::{Error, Result},
    model::DatabaseSchema,
};

#[derive(Debug, Clone)]
pub struct QueryRow {
    pub values: Vec<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<QueryRow>,
}

#[derive(Debug, Clone)]
pub struct BackupRequest {
    pub backup_path: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientKind {
    Timeout,
    Network,
    Deadlock,
    ProviderSpecific,
    None,
}

/// Classifies a provider's raw error message/code into the transient
/// taxonomy from §4.1: timeout, network, deadlock, or a provider-specific
/// code (SQL Server 1205/1222/8645/8651; PG/MySQL substring match).
#[must_use]
pub fn classify_transient(message: &str, sql_server_code: Option<i32>) -> TransientKind {
    if let Some(code) = sql_server_code
        && matches!(code, 1205 | 1222 | 8645 | 8651)
    {
        return TransientKind::ProviderSpecific;
    }
    let lower = message.to_ascii_lowercase();
    if lower.contains("timeout") {
        TransientKind::Timeout
    } else if lower.contains("deadlock") || lower.contains("lock") {
        TransientKind::Deadlock
    } else if lower.contains("network") || lower.contains("connection reset") {
        TransientKind::Network
    } else {
        TransientKind::None
    }
}

/// Runs `op` up to `retry.retry_attempts` times with linear backoff
/// (`retry_interval_sec * attempt`), retrying only while `classify` reports
/// a transient kind. `label` identifies the operation in the final error.
pub fn with_retry<T>(
    label: &str,
    retry: &RetryConfig,
    max_attempts: u32,
    mut op: impl FnMut(u32) -> std::result::Result<T, (String, Option<i32>)>,
) -> Result<T> {
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err((message, sql_server_code)) => {
                let transient = classify_transient(&message, sql_server_code);
                if transient == TransientKind::None || attempt >= max_attempts {
                    return Err(Error::transient(label, attempt, message));
                }
                let backoff = Duration::from_secs(u64::from(retry.retry_interval_sec * attempt));
                thread::sleep(backoff);
                attempt += 1;
            }
        }
    }
}

/// Per-engine contract: connect, introspect, execute SQL, and back up one
/// database. A dialect crate supplies exactly one implementation.
///
/// ```rust
/// use schemectl_core::{
///     BackupConfig, BackupRequest, ConnectionConfig, DatabaseSchema, ProviderAdapter,
///     QueryResult, Result,
/// };
///
/// struct ExampleAdapter;
///
/// impl ProviderAdapter for ExampleAdapter {
///     fn introspect(&mut self, _schema_namespace: &str) -> Result<DatabaseSchema> {
///         Ok(DatabaseSchema::empty("example", "db", "2026-01-01T00:00:00Z"))
///     }
///
///     fn execute(&mut self, _sql: &str) -> Result<u64> {
///         Ok(0)
///     }
///
///     fn query(&mut self, _sql: &str) -> Result<QueryResult> {
///         Ok(QueryResult { columns: Vec::new(), rows: Vec::new() })
///     }
///
///     fn test_connection(&mut self) -> bool {
///         true
///     }
///
///     fn create_backup(&mut self, _request: &BackupRequest, _config: &BackupConfig) -> Result<()> {
///         Ok(())
///     }
///
///     fn verify_backup(&self, _path: &str) -> Result<bool> {
///         Ok(true)
///     }
///
///     fn restore(&mut self, _path: &str) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// let mut adapter = ExampleAdapter;
/// assert!(adapter.test_connection());
/// ```
pub trait ProviderAdapter {
    fn introspect(&mut self, schema_namespace: &str) -> Result<DatabaseSchema>;
    fn execute(&mut self, sql: &str) -> Result<u64>;
    fn query(&mut self, sql: &str) -> Result<QueryResult>;
    fn test_connection(&mut self) -> bool;

    fn begin_transaction(&mut self) -> Result<()> {
        self.execute("BEGIN").map(|_| ())
    }
    fn commit(&mut self) -> Result<()> {
        self.execute("COMMIT").map(|_| ())
    }
    fn rollback(&mut self) -> Result<()> {
        self.execute("ROLLBACK").map(|_| ())
    }

    fn create_backup(&mut self, request: &BackupRequest, config: &BackupConfig) -> Result<()>;
    fn verify_backup(&self, path: &str) -> Result<bool>;
    fn restore(&mut self, path: &str) -> Result<()>;
}

/// Builds a provider's connection string deterministically from config.
/// Implemented per dialect crate (not part of `ProviderAdapter` since it is
/// a pure function of `ConnectionConfig`, needed before a connection exists).
pub trait ConnectionStringBuilder {
    fn build_connection_string(&self, config: &ConnectionConfig) -> String;
}
