//! Feature-gated dispatch from a `ProviderKind` to its dialect crate. Each
//! arm only compiles when the matching Cargo feature is enabled; a provider
//! whose feature is off is reported as a configuration error rather than a
//! compile failure, so partial builds (e.g. sqlite-only) stay usable.

use schemectl_core::{ConnectionConfig, Error, ProviderAdapter, ProviderKind, Result, SqlEmitter};

pub fn connect(provider: ProviderKind, config: &ConnectionConfig) -> Result<Box<dyn ProviderAdapter>> {
    match provider {
        #[cfg(feature = "postgres")]
        ProviderKind::Postgresql => Ok(Box::new(schemectl_dialect_postgres::PostgresAdapter::connect(config)?)),
        #[cfg(feature = "mysql")]
        ProviderKind::Mysql => Ok(Box::new(schemectl_dialect_mysql::MysqlAdapter::connect(config)?)),
        #[cfg(feature = "sqlite")]
        ProviderKind::Sqlite => Ok(Box::new(schemectl_dialect_sqlite::SqliteAdapter::connect(config)?)),
        #[cfg(feature = "mssql")]
        ProviderKind::SqlServer => Ok(Box::new(schemectl_dialect_mssql::MssqlAdapter::connect(config)?)),
        #[cfg(feature = "oracle")]
        ProviderKind::Oracle => Ok(Box::new(schemectl_dialect_oracle::OracleAdapter::connect(config)?)),
        #[allow(unreachable_patterns)]
        other => Err(Error::configuration(format!("{other:?} support was not compiled into this binary"))),
    }
}

pub fn emitter(provider: ProviderKind) -> Result<Box<dyn SqlEmitter>> {
    match provider {
        #[cfg(feature = "postgres")]
        ProviderKind::Postgresql => Ok(Box::new(schemectl_dialect_postgres::PostgresEmitter)),
        #[cfg(feature = "mysql")]
        ProviderKind::Mysql => Ok(Box::new(schemectl_dialect_mysql::MysqlEmitter)),
        #[cfg(feature = "sqlite")]
        ProviderKind::Sqlite => Ok(Box::new(schemectl_dialect_sqlite::SqliteEmitter)),
        #[cfg(feature = "mssql")]
        ProviderKind::SqlServer => Ok(Box::new(schemectl_dialect_mssql::MssqlEmitter)),
        #[cfg(feature = "oracle")]
        ProviderKind::Oracle => Ok(Box::new(schemectl_dialect_oracle::OracleEmitter)),
        #[allow(unreachable_patterns)]
        other => Err(Error::configuration(format!("{other:?} support was not compiled into this binary"))),
    }
}
