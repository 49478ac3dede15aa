use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One of the five supported engines (§6 "Database selector").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    SqlServer,
    Postgresql,
    Mysql,
    Oracle,
    Sqlite,
}

impl ProviderKind {
    #[must_use]
    pub fn default_schema_namespace(self, database: &str, username: &str) -> String {
        match self {
            Self::SqlServer => "dbo".to_string(),
            Self::Postgresql => "public".to_string(),
            Self::Mysql => database.to_string(),
            Self::Oracle => username.to_uppercase(),
            Self::Sqlite => String::new(),
        }
    }

    #[must_use]
    pub fn default_port(self) -> Option<u16> {
        match self {
            Self::SqlServer => Some(1433),
            Self::Postgresql => Some(5432),
            Self::Mysql => Some(3306),
            Self::Oracle => Some(1521),
            Self::Sqlite => None,
        }
    }

    #[must_use]
    pub fn backup_extension(self) -> &'static str {
        match self {
            Self::SqlServer => ".bak",
            Self::Postgresql | Self::Mysql => ".sql",
            Self::Oracle => ".dmp",
            Self::Sqlite => ".db",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Beta,
    Prod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    Validate,
    Execute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    Loose,
    Normal,
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub server: String,
    pub port: Option<u16>,
    pub database: String,
    pub username: String,
    pub password: Option<String>,
    pub integrated_auth: bool,
    pub schema_namespace: String,
    /// Provider-specific knobs: SQL Server encrypt/trust/instance, PG ssl
    /// mode/search-path/application-name, MySQL ssl mode/charset, Oracle
    /// service name, SQLite file-path/journal-mode/synchronous.
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RetryConfig {
    pub connection_timeout_sec: u32,
    pub command_timeout_sec: u32,
    pub retry_attempts: u32,
    pub retry_interval_sec: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BackupConfig {
    pub backup_before_deployment: bool,
    pub backup_directory: String,
    pub retention_days: u32,
    pub restore_point_label: String,
    pub sql_server_backup_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub provider: ProviderKind,
    pub connection: ConnectionConfig,
    pub retry: RetryConfig,
    pub mode: OperationMode,
    pub no_op: bool,
    pub skip_backup: bool,
    pub environment: Environment,
    pub vertical: Option<String>,
    pub validation_level: ValidationLevel,
    pub cross_schema_reference_enabled: bool,
    pub custom_scripts_path: Option<String>,
    pub backup: BackupConfig,
    pub bypass_approval: bool,
}

impl DeploymentConfig {
    /// §4.6 step 1: prerequisite validation that does not require a
    /// connection. Returns every violation found rather than the first, so
    /// a CI pipeline can fix everything in one pass.
    pub fn validate_prerequisites(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.connection.database.trim().is_empty() {
            errors.push("database name must be set".to_string());
        }
        if matches!(self.environment, Environment::Beta | Environment::Prod)
            && self.vertical.as_deref().unwrap_or("").trim().is_empty()
        {
            errors.push("vertical is required for beta/prod environments".to_string());
        }
        if self.mode == OperationMode::Execute && self.no_op {
            errors.push("execute mode cannot be combined with no_op".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    #[must_use]
    pub fn approval_bypassed(&self) -> bool {
        self.environment == Environment::Dev
            || self.bypass_approval
            || self.mode == OperationMode::Validate
            || self.no_op
    }
}
