use std::process::Command;

use schemectl_core::{BackupConfig, BackupRequest, Error, Result};

/// Shells out to `pg_dump` the way the backup config names a restore point.
/// `pg_dump`'s exit status and stderr map directly onto `Error::ExternalTool`
/// (§4.7).
pub(crate) fn run_pg_dump(request: &BackupRequest, _config: &BackupConfig) -> Result<()> {
    let output = Command::new("pg_dump").arg("-f").arg(&request.backup_path).arg("--format=plain").output().map_err(|e| Error::Backup { message: format!("failed to spawn pg_dump: {e}"), source: Some(Box::new(e)) })?;

    if !output.status.success() {
        return Err(Error::ExternalTool {
            tool: "pg_dump".to_string(),
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}

/// Verifies a backup is readable by the provider's native tooling rather
/// than just checking the file exists (§4.7): `pg_restore --list` parses
/// the archive's table of contents and fails on a truncated or corrupt
/// dump.
pub(crate) fn verify_with_pg_restore_list(path: &str) -> Result<bool> {
    if !schemectl_core::has_content(std::path::Path::new(path)) {
        return Ok(false);
    }
    let output = Command::new("pg_restore").arg("--list").arg(path).output().map_err(|e| Error::Backup { message: format!("failed to spawn pg_restore: {e}"), source: Some(Box::new(e)) })?;
    Ok(output.status.success())
}

pub(crate) fn run_psql_restore(path: &str) -> Result<()> {
    let output = Command::new("psql").arg("-f").arg(path).output().map_err(|e| Error::Backup { message: format!("failed to spawn psql: {e}"), source: Some(Box::new(e)) })?;

    if !output.status.success() {
        return Err(Error::ExternalTool {
            tool: "psql".to_string(),
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}
