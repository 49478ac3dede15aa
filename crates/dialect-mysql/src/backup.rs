use std::process::Command;

use schemectl_core::{BackupConfig, BackupRequest, Error, Result};

/// Shells out to `mysqldump`, writing to the path the backup config names.
/// Exit status and stderr map directly onto `Error::ExternalTool` (§4.7).
pub(crate) fn run_mysqldump(request: &BackupRequest, _config: &BackupConfig) -> Result<()> {
    let output = Command::new("mysqldump")
        .arg("--result-file")
        .arg(&request.backup_path)
        .arg("--all-databases")
        .output()
        .map_err(|e| Error::Backup { message: format!("failed to spawn mysqldump: {e}"), source: Some(Box::new(e)) })?;

    if !output.status.success() {
        return Err(Error::ExternalTool {
            tool: "mysqldump".to_string(),
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}

/// `mysqldump` output has no reliable binary signature to probe, so verify
/// by scanning for the markers a valid dump always contains (§4.7).
pub(crate) fn verify_dump_markers(path: &str) -> Result<bool> {
    if !schemectl_core::has_content(std::path::Path::new(path)) {
        return Ok(false);
    }
    let content = std::fs::read_to_string(path).map_err(|e| Error::Backup { message: format!("failed to read backup file: {e}"), source: Some(Box::new(e)) })?;
    let markers = ["CREATE TABLE", "INSERT INTO", "-- MySQL dump"];
    Ok(markers.iter().any(|m| content.contains(m)))
}

pub(crate) fn run_mysql_restore(path: &str) -> Result<()> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(format!("mysql < {path}"))
        .output()
        .map_err(|e| Error::Backup { message: format!("failed to spawn mysql: {e}"), source: Some(Box::new(e)) })?;

    if !output.status.success() {
        return Err(Error::ExternalTool {
            tool: "mysql".to_string(),
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn accepts_a_dump_containing_create_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "-- MySQL dump 10.13\nCREATE TABLE orders (id int);\n").unwrap();
        assert!(verify_dump_markers(file.path().to_str().unwrap()).unwrap());
    }

    #[test]
    fn rejects_a_dump_with_no_recognizable_markers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not a sql dump at all").unwrap();
        assert!(!verify_dump_markers(file.path().to_str().unwrap()).unwrap());
    }

    #[test]
    fn rejects_an_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(!verify_dump_markers(file.path().to_str().unwrap()).unwrap());
    }
}
