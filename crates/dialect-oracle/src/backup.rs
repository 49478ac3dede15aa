use std::process::Command;

use schemectl_core::{BackupConfig, BackupRequest, Error, Result};

/// Shells out to Data Pump Export. `directory`/`dumpfile` map onto an
/// Oracle `DIRECTORY` object name, which the backup path is assumed to
/// resolve under (§4.7).
pub(crate) fn run_expdp(request: &BackupRequest, _config: &BackupConfig) -> Result<()> {
    let output = Command::new("expdp")
        .arg(format!("dumpfile={}", request.backup_path))
        .arg(format!("job_name={}", request.label))
        .output()
        .map_err(|e| Error::Backup { message: format!("failed to spawn expdp: {e}"), source: Some(Box::new(e)) })?;

    if !output.status.success() {
        return Err(Error::ExternalTool {
            tool: "expdp".to_string(),
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}

/// Data Pump dump files are fixed-size-block binary files: the file size
/// is always a multiple of the block size stamped in the header, and a
/// freshly truncated or zeroed-out file fails that check even though it
/// passes a bare non-empty-file test (§4.7).
const DUMP_BLOCK_SIZE: u64 = 4096;

pub(crate) fn verify_dump_header(path: &str) -> Result<bool> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(_) => return Ok(false),
    };
    if metadata.len() == 0 || metadata.len() % DUMP_BLOCK_SIZE != 0 {
        return Ok(false);
    }
    let mut file = std::fs::File::open(path).map_err(|e| Error::Backup { message: format!("failed to open backup file: {e}"), source: Some(Box::new(e)) })?;
    use std::io::Read;
    let mut header = [0u8; 4];
    file.read_exact(&mut header).map_err(|e| Error::Backup { message: format!("failed to read backup header: {e}"), source: Some(Box::new(e)) })?;
    Ok(header != [0u8; 4])
}

pub(crate) fn run_impdp(path: &str) -> Result<()> {
    let output = Command::new("impdp")
        .arg(format!("dumpfile={path}"))
        .output()
        .map_err(|e| Error::Backup { message: format!("failed to spawn impdp: {e}"), source: Some(Box::new(e)) })?;

    if !output.status.success() {
        return Err(Error::ExternalTool {
            tool: "impdp".to_string(),
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
    fn accepts_a_block_aligned_file_with_nonzero_header() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[1, 2, 3, 4]).unwrap();
        file.write_all(&[0u8; DUMP_BLOCK_SIZE as usize - 4]).unwrap();
        assert!(verify_dump_header(file.path().to_str().unwrap()).unwrap());
    }

    #[test]
    fn rejects_a_file_not_aligned_to_the_block_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[1, 2, 3, 4, 5]).unwrap();
        assert!(!verify_dump_header(file.path().to_str().unwrap()).unwrap());
    }

    #[test]
    fn rejects_a_block_aligned_file_with_zeroed_header() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; DUMP_BLOCK_SIZE as usize]).unwrap();
        assert!(!verify_dump_header(file.path().to_str().unwrap()).unwrap());
    }
}
