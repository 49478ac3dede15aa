use std::path::Path;

use schemectl_core::{DeploymentConfig, Error, Result};

/// Environment variables a config file author would rather not commit. Set,
/// they override whatever the file carries; unset, the file value stands.
const PASSWORD_ENV: &str = "SCHEMECTL_DB_PASSWORD";
const USERNAME_ENV: &str = "SCHEMECTL_DB_USERNAME";

/// Loads a `DeploymentConfig` from a `.yaml`/`.yml` or `.json` file, then
/// applies environment-variable overrides for the two fields a CI pipeline
/// is least likely to want checked into the config file.
pub fn load(path: &Path) -> Result<DeploymentConfig> {
    let body = std::fs::read_to_string(path)
        .map_err(|e| Error::configuration(format!("cannot read config file {}: {e}", path.display())))?;

    let mut config = parse(path, &body)?;
    apply_env_overrides(&mut config);
    Ok(config)
}

fn parse(path: &Path, body: &str) -> Result<DeploymentConfig> {
    let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(body).map_err(|e| Error::configuration(format!("invalid json config {}: {e}", path.display())))
    } else {
        serde_yaml::from_str(body).map_err(|e| Error::configuration(format!("invalid yaml config {}: {e}", path.display())))
    }
}

fn apply_env_overrides(config: &mut DeploymentConfig) {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        config.connection.password = Some(password);
    }
    if let Ok(username) = std::env::var(USERNAME_ENV) {
        config.connection.username = username;
    }
}

/// Loads a `DatabaseSchema` snapshot from the same two formats.
pub fn load_desired_schema(path: &Path) -> Result<schemectl_core::DatabaseSchema> {
    let body = std::fs::read_to_string(path)
        .map_err(|e| Error::configuration(format!("cannot read desired schema file {}: {e}", path.display())))?;

    let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&body).map_err(|e| Error::configuration(format!("invalid json desired schema {}: {e}", path.display())))
    } else {
        serde_yaml::from_str(&body).map_err(|e| Error::configuration(format!("invalid yaml desired schema {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_temp(name: &str, body: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        dir
    }

    const MINIMAL_CONFIG_YAML: &str = r#"
provider: postgresql
connection:
  server: localhost
  port: 5432
  database: app
  username: app
  password: null
  integrated_auth: false
  schema_namespace: public
  extra: {}
retry:
  connection_timeout_sec: 30
  command_timeout_sec: 30
  retry_attempts: 3
  retry_interval_sec: 2
mode: validate
no_op: false
skip_backup: false
environment: dev
vertical: null
validation_level: normal
cross_schema_reference_enabled: false
custom_scripts_path: null
backup:
  backup_before_deployment: false
  backup_directory: /tmp
  retention_days: 7
  restore_point_label: predeploy
  sql_server_backup_type: null
bypass_approval: false
"#;

    #[test]
    fn loads_a_yaml_config_file() {
        let dir = write_temp("config.yaml", MINIMAL_CONFIG_YAML);
        let config = load(&dir.path().join("config.yaml")).expect("config should load");
        assert_eq!(config.connection.database, "app");
    }

    #[test]
    fn env_var_overrides_beat_the_file_value() {
        let dir = write_temp("config.yaml", MINIMAL_CONFIG_YAML);
        // SAFETY: test is single-threaded w.r.t. this env var and restores it immediately.
        unsafe { std::env::set_var(PASSWORD_ENV, "from-env") };
        let config = load(&dir.path().join("config.yaml")).expect("config should load");
        unsafe { std::env::remove_var(PASSWORD_ENV) };
        assert_eq!(config.connection.password.as_deref(), Some("from-env"));
    }

    #[test]
    fn rejects_a_config_file_that_is_not_valid_yaml() {
        let dir = write_temp("config.yaml", "not: [valid");
        assert!(load(&dir.path().join("config.yaml")).is_err());
    }
}
