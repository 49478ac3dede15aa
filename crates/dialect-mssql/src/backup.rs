use schemectl_core::{BackupConfig, BackupRequest, Error, Result};

use crate::adapter::LiveState;

/// Issues a native `BACKUP DATABASE` statement instead of shelling out — SQL
/// Server writes backups itself, so there is no external tool here (§4.7).
pub(crate) fn run_backup_database(state: &mut LiveState, request: &BackupRequest, config: &BackupConfig) -> Result<()> {
    let backup_type = config.sql_server_backup_type.as_deref().unwrap_or("DATABASE");
    let sql = format!(
        "BACKUP {backup_type} TO DISK = N'{}' WITH NOFORMAT, NAME = N'{}';",
        escape_literal(&request.backup_path),
        escape_literal(&request.label)
    );
    execute(state, &sql)
}

pub(crate) fn run_restore_database(state: &mut LiveState, path: &str) -> Result<()> {
    let sql = format!("RESTORE DATABASE FROM DISK = N'{}' WITH REPLACE;", escape_literal(path));
    execute(state, &sql)
}

/// `RESTORE VERIFYONLY` checks the backup set is complete and readable
/// without actually restoring it (§4.7).
pub(crate) fn run_verify_only(state: &mut LiveState, path: &str) -> Result<bool> {
    let sql = format!("RESTORE VERIFYONLY FROM DISK = N'{}';", escape_literal(path));
    Ok(execute(state, &sql).is_ok())
}

fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

fn execute(state: &mut LiveState, sql: &str) -> Result<()> {
    crate::adapter::execute_admin_sql(state, sql).map_err(|e| Error::Backup { message: e.to_string(), source: None })
}
