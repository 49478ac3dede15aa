use std::{fs, process::Command};

use tempfile::tempdir;

fn run_schemectl(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_schemectl")).args(args).output().unwrap_or_else(|error| panic!("failed to run schemectl: {error}"))
}

fn write_config(dir: &std::path::Path, db_path: &std::path::Path) -> std::path::PathBuf {
    let config_path = dir.join("config.yaml");
    let body = format!(
        r#"
provider: sqlite
connection:
  server: ""
  port: null
  database: {database}
  username: ""
  password: null
  integrated_auth: false
  schema_namespace: ""
  extra: {{}}
retry:
  connection_timeout_sec: 5
  command_timeout_sec: 5
  retry_attempts: 1
  retry_interval_sec: 1
mode: validate
no_op: false
skip_backup: true
environment: dev
vertical: null
validation_level: normal
cross_schema_reference_enabled: false
custom_scripts_path: null
backup:
  backup_before_deployment: false
  backup_directory: {tmp}
  retention_days: 1
  restore_point_label: predeploy
  sql_server_backup_type: null
bypass_approval: true
"#,
        database = db_path.display(),
        tmp = dir.display(),
    );
    fs::write(&config_path, body).unwrap();
    config_path
}

const EMPTY_SCHEMA: &str = r#"
provider: sqlite
database_name: ""
analyzed_at: "2026-01-01T00:00:00Z"
tables: []
views: []
indexes: []
constraints: []
procedures: []
functions: []
"#;

const ONE_TABLE_SCHEMA: &str = r#"
provider: sqlite
database_name: ""
analyzed_at: "2026-01-01T00:00:00Z"
tables:
  - name: widgets
    schema_namespace: ""
    columns:
      - name: id
        data_type: { category: Integer }
        native_type: INTEGER
        nullable: false
        primary_key: true
        identity: true
    indexes: []
    constraints: []
views: []
indexes: []
constraints: []
procedures: []
functions: []
"#;

#[test]
fn validate_against_a_fresh_database_reports_zero_risk_and_writes_fixed_outputs() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("app.db");

    let config_path = write_config(dir.path(), &db_path);
    let schema_path = dir.path().join("desired.yaml");
    fs::write(&schema_path, EMPTY_SCHEMA).unwrap();

    let output_dir = dir.path().join("out");
    let output = run_schemectl(&[
        "validate",
        "--config",
        config_path.to_str().unwrap(),
        "--desired-schema",
        schema_path.to_str().unwrap(),
        "--output-dir",
        output_dir.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    for name in ["schema-analysis.json", "validation-report.json", "tag-patterns.json", "approval-request.json", "DEPLOYMENT_SUMMARY.md", "pipeline-tools.log"] {
        assert!(output_dir.join(name).exists(), "missing output file {name}");
    }
    assert!(!output_dir.join("deployment-plan.json").exists(), "validate should not build a plan");
}

#[test]
fn plan_against_a_new_table_produces_a_safe_create_table_phase() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("app.db");

    let config_path = write_config(dir.path(), &db_path);
    let schema_path = dir.path().join("desired.yaml");
    fs::write(&schema_path, ONE_TABLE_SCHEMA).unwrap();

    let output_dir = dir.path().join("out");
    let output = run_schemectl(&[
        "plan",
        "--config",
        config_path.to_str().unwrap(),
        "--desired-schema",
        schema_path.to_str().unwrap(),
        "--output-dir",
        output_dir.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let plan_json = fs::read_to_string(output_dir.join("deployment-plan.json")).unwrap();
    assert!(plan_json.contains("widgets"));

    let compiled_sql = fs::read_to_string(output_dir.join("compiled-deployment.sql")).unwrap();
    assert!(compiled_sql.to_uppercase().contains("CREATE TABLE"));
    let first_statement = compiled_sql.lines().find(|line| !line.trim().is_empty()).unwrap_or_default();
    assert!(!first_statement.trim_start().starts_with("--"), "expected real DDL, got a comment fallback: {compiled_sql}");
}
