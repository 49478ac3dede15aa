use std::path::Path;

use schemectl_core::{BackupConfig, BackupRequest, Error, Result};

/// SQLite has no server-side dump tool; a backup is a consistent copy of the
/// database file itself (§4.7). The connection is not locked during the
/// copy — callers are expected to quiesce writers (or run inside a
/// transaction) before calling this.
pub(crate) fn copy_database_file(source: Option<&str>, request: &BackupRequest, _config: &BackupConfig) -> Result<()> {
    let source = source.ok_or_else(|| Error::Backup { message: "sqlite connection has no backing file to copy".to_string(), source: None })?;
    std::fs::copy(source, &request.backup_path).map_err(|e| Error::Backup { message: format!("failed to copy database file: {e}"), source: Some(Box::new(e)) })?;
    Ok(())
}

const SQLITE_HEADER: &[u8; 16] = b"SQLite format 3\0";

/// A copied database file can be truncated mid-write; checking the fixed
/// 16-byte header SQLite stamps on every database file catches that even
/// when the copy produced a non-empty file (§4.7).
pub(crate) fn verify_header(path: &str) -> Result<bool> {
    let mut file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(_) => return Ok(false),
    };
    use std::io::Read;
    let mut header = [0u8; 16];
    if file.read_exact(&mut header).is_err() {
        return Ok(false);
    }
    Ok(&header == SQLITE_HEADER)
}

pub(crate) fn restore_database_file(target: Option<&str>, backup_path: &str) -> Result<()> {
    let target = target.ok_or_else(|| Error::Backup { message: "sqlite connection has no backing file to restore into".to_string(), source: None })?;
    if !Path::new(backup_path).exists() {
        return Err(Error::Backup { message: format!("backup file `{backup_path}` does not exist"), source: None });
    }
    std::fs::copy(backup_path, target).map_err(|e| Error::Backup { message: format!("failed to restore database file: {e}"), source: Some(Box::new(e)) })?;
    Ok(())
}
