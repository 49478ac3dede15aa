use std::{fs, path::{Path, PathBuf}, time::SystemTime};

use chrono::{DateTime, Utc};

use crate::config::ProviderKind;

/// Computes `<BACKUP_DIRECTORY>/<env>/<vertical?>/<db>_<label>_<yyyyMMdd_HHmmss><ext>`
/// (§4.7). Pure function of its inputs; the caller supplies `now` so the
/// result is reproducible in tests.
#[must_use]
pub fn compute_backup_path(
    backup_directory: &str,
    env: &str,
    vertical: Option<&str>,
    database: &str,
    label: &str,
    provider: ProviderKind,
    now: DateTime<Utc>,
) -> PathBuf {
    let mut path = PathBuf::from(backup_directory);
    path.push(env);
    if let Some(vertical) = vertical {
        if !vertical.is_empty() {
            path.push(vertical);
        }
    }
    let timestamp = now.format("%Y%m%d_%H%M%S");
    let file_name = format!("{database}_{label}_{timestamp}{}", provider.backup_extension());
    path.push(file_name);
    path
}

/// §4.7 retention: delete files in `directory` whose modified time is older
/// than `retention_days`. Failures to remove an individual file are
/// collected rather than propagated — retention cleanup is best-effort and
/// never fails the deployment.
pub fn enforce_retention(directory: &Path, retention_days: u32, now: SystemTime) -> Vec<String> {
    let mut failures = Vec::new();
    let Ok(entries) = fs::read_dir(directory) else { return failures };
    let max_age = std::time::Duration::from_secs(u64::from(retention_days) * 24 * 60 * 60);

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(metadata) = entry.metadata() else { continue };
        let Ok(modified) = metadata.modified() else { continue };
        let Ok(age) = now.duration_since(modified) else { continue };
        if age > max_age
            && let Err(err) = fs::remove_file(&path)
        {
            failures.push(format!("{}: {err}", path.display()));
        }
    }

    failures
}

/// Minimal per-provider backup-file sniff shared by dialect crates' verify
/// implementations before they run the provider-native check (§4.7): a
/// non-empty file is required in every case.
#[must_use]
pub fn has_content(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_path_matches_contract() {
        let now = DateTime::parse_from_rfc3339("2026-07-31T12:34:56Z").unwrap().with_timezone(&Utc);
        let path = compute_backup_path("/backups", "prod", Some("acme"), "orders_db", "predeploy", ProviderKind::Postgresql, now);
        assert_eq!(path, PathBuf::from("/backups/prod/acme/orders_db_predeploy_20260731_123456.sql"));
    }

    #[test]
    fn backup_path_omits_empty_vertical() {
        let now = DateTime::parse_from_rfc3339("2026-07-31T12:34:56Z").unwrap().with_timezone(&Utc);
        let path = compute_backup_path("/backups", "dev", None, "orders_db", "predeploy", ProviderKind::Sqlite, now);
        assert_eq!(path, PathBuf::from("/backups/dev/orders_db_predeploy_20260731_123456.db"));
    }
}
