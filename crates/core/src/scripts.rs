use std::{collections::BTreeMap, fs, path::Path};

use regex::Regex;
use std::sync::OnceLock;

use crate::{
    diff::find_cycles,
    error::{Error, Result},
    model::{CustomScript, ObjectKind, OperationKind, RiskLevel, SchemaChange, ScriptKind},
};

/// Risky/warning token sets for §4.4 custom-script risk rating. Matched
/// case-insensitively against the script body minus its header comment.
const RISKY_TOKENS: [&str; 19] = [
    "DROP TABLE", "DROP COLUMN", "TRUNCATE", "DROP DATABASE", "DROP INDEX", "DELETE FROM", "EXEC",
    "EXECUTE", "XP_", "SP_", "BULK", "OPENROWSET", "OPENDATASOURCE", "SHUTDOWN", "RESTORE",
    "BACKUP", "DBCC", "KILL", "WAITFOR",
];
const WARNING_TOKENS: [&str; 6] = ["ALTER TABLE", "UPDATE ", "ALTER COLUMN", "GRANT", "REVOKE", "CREATE INDEX"];

/// Content the engine's managed transaction cannot wrap (DDL that commits
/// implicitly, or provider maintenance commands) (§4.7/§4.8).
const NON_TRANSACTIONAL_TOKENS: [&str; 6] = ["CREATE INDEX", "DROP INDEX", "BACKUP", "RESTORE", "DBCC", "CHECKPOINT"];

/// Constructs that make a script unsafe to run inside the engine's managed
/// transaction/retry loop and must be rejected outright (§4.4 validation).
const FORBIDDEN_CONSTRUCTS: [&str; 6] = ["DROP DATABASE", "SHUTDOWN", "XP_CMDSHELL", "FORMAT", "OPENROWSET", "BULK INSERT"];

fn dependency_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:FROM|JOIN|INTO|UPDATE|REFERENCES|EXEC(?:UTE)?)\s+\[?([A-Za-z_][\w.]*)\]?").unwrap()
    })
}

fn header_field_regex(field: &str) -> Regex {
    Regex::new(&format!(r"(?im)^\s*--\s*{field}\s*:\s*(.+?)\s*$")).unwrap()
}

/// Classifies by filename first, falling back to a content sniff (§4.4).
fn classify(file_name: &str, body: &str) -> ScriptKind {
    let lower = file_name.to_ascii_lowercase();
    if lower.contains("proc") || lower.contains("sp_") {
        return ScriptKind::Procedure;
    }
    if lower.contains("func") || lower.contains("fn_") {
        return ScriptKind::Function;
    }
    if lower.contains("view") {
        return ScriptKind::View;
    }
    if lower.contains("trigger") {
        return ScriptKind::Trigger;
    }
    if lower.contains("index") || lower.contains("idx") {
        return ScriptKind::Index;
    }
    if lower.contains("migration") || lower.contains("migrate") {
        return ScriptKind::Migration;
    }
    if lower.contains("seed") || lower.contains("data") {
        return ScriptKind::Data;
    }

    let upper = body.to_ascii_uppercase();
    if upper.contains("CREATE PROCEDURE") || upper.contains("CREATE PROC ") {
        ScriptKind::Procedure
    } else if upper.contains("CREATE FUNCTION") {
        ScriptKind::Function
    } else if upper.contains("CREATE VIEW") {
        ScriptKind::View
    } else if upper.contains("CREATE TRIGGER") {
        ScriptKind::Trigger
    } else if upper.contains("CREATE INDEX") {
        ScriptKind::Index
    } else if upper.contains("INSERT INTO") || upper.contains("UPDATE ") || upper.contains("DELETE FROM") {
        ScriptKind::Dml
    } else if upper.contains("CREATE TABLE") || upper.contains("ALTER TABLE") || upper.contains("DROP TABLE") {
        ScriptKind::Ddl
    } else {
        ScriptKind::Custom
    }
}

/// `DELETE`/`UPDATE` with no `WHERE` clause touches every row in the table,
/// so it is escalated to Risky even though the bare token would otherwise
/// only warrant a Warning (§4.8).
fn unqualified_bulk_mutation(upper: &str) -> bool {
    (upper.contains("DELETE FROM") || upper.contains("UPDATE ")) && !upper.contains("WHERE")
}

fn rate_risk(body: &str) -> RiskLevel {
    let upper = body.to_ascii_uppercase();
    if RISKY_TOKENS.iter().any(|t| upper.contains(t)) || unqualified_bulk_mutation(&upper) {
        RiskLevel::Risky
    } else if WARNING_TOKENS.iter().any(|t| upper.contains(t)) {
        RiskLevel::Warning
    } else {
        RiskLevel::Safe
    }
}

/// Computed independently of `risk_level`: a script can be Risky (e.g. an
/// unqualified `UPDATE`) yet still run inside the engine's transaction, and
/// a Safe one (`CREATE INDEX`) may still need to run outside it (§4.8).
fn compute_transactional(upper: &str) -> bool {
    !NON_TRANSACTIONAL_TOKENS.iter().any(|t| upper.contains(t))
}

fn compute_retryable(upper: &str) -> bool {
    upper.contains("IF EXISTS") || upper.contains("IF NOT EXISTS") || upper.contains("MERGE") || upper.contains("UPSERT")
}

fn extract_dependencies(body: &str) -> Vec<String> {
    let mut deps: Vec<String> = dependency_regex()
        .captures_iter(body)
        .map(|c| c[1].to_string())
        .collect();
    deps.sort();
    deps.dedup();
    deps
}

fn header_field(body: &str, field: &str) -> Option<String> {
    header_field_regex(field).captures(body).map(|c| c[1].trim().to_string())
}

/// Parses one script's leading `-- Field: value` header comment block and
/// risk-rates/classifies its body (§4.4).
#[must_use]
pub fn parse_script(file_path: &str, body: &str) -> CustomScript {
    let file_name = Path::new(file_path).file_name().and_then(|s| s.to_str()).unwrap_or(file_path);
    let kind = classify(file_name, body);
    let execution_order = header_field(body, "(?:Order|ExecutionOrder)")
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(0);
    let pinned_phase = header_field(body, "Phase").and_then(|v| v.parse::<u8>().ok());
    let schema_namespace = header_field(body, "Schema");
    let rollback_script = header_field(body, "Rollback");
    let risk_level = rate_risk(body);
    let upper = body.to_ascii_uppercase();

    CustomScript {
        file_path: file_path.to_string(),
        name: file_name.trim_end_matches(".sql").to_string(),
        kind,
        content: body.to_string(),
        risk_level,
        execution_order,
        transactional: compute_transactional(&upper),
        retryable: compute_retryable(&upper),
        dependencies: extract_dependencies(body),
        rollback_script,
        schema_namespace,
        pinned_phase,
    }
}

/// Balanced-parens/quotes and forbidden-construct check (§4.4). Returns
/// every violation rather than the first.
#[must_use]
pub fn validate_script(script: &CustomScript) -> Vec<String> {
    let mut errors = Vec::new();
    let mut depth: i32 = 0;
    let mut in_single_quote = false;
    let mut chars = script.content.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' if !in_single_quote => in_single_quote = true,
            '\'' if in_single_quote => {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                } else {
                    in_single_quote = false;
                }
            }
            '(' if !in_single_quote => depth += 1,
            ')' if !in_single_quote => depth -= 1,
            _ => {}
        }
    }
    if depth != 0 {
        errors.push(format!("{}: unbalanced parentheses", script.file_path));
    }
    if in_single_quote {
        errors.push(format!("{}: unterminated string literal", script.file_path));
    }

    let upper = script.content.to_ascii_uppercase();
    for construct in FORBIDDEN_CONSTRUCTS {
        if upper.contains(construct) {
            errors.push(format!("{}: forbidden construct `{construct}`", script.file_path));
        }
    }

    errors
}

/// Blacklists provider-specific syntax the target engine cannot run, a
/// best-effort textual check ahead of execution (§4.4).
#[must_use]
pub fn provider_incompatibilities(script: &CustomScript, provider: &str) -> Vec<String> {
    let upper = script.content.to_ascii_uppercase();
    let mut errors = Vec::new();
    let incompatible = match provider {
        "sqlite" => vec!["CREATE PROCEDURE", "CREATE TRIGGER", "BEGIN TRANSACTION ISOLATION"],
        "sqlserver" => vec!["RETURNING", "SERIAL"],
        "postgresql" => vec!["IDENTITY(", "TOP ("],
        _ => Vec::new(),
    };
    for construct in incompatible {
        if upper.contains(construct) {
            errors.push(format!("{}: `{construct}` is not supported on {provider}", script.file_path));
        }
    }
    errors
}

/// Scans `directory` for `*.sql` files, parsing and validating each. Scripts
/// that fail validation are reported in `errors` rather than silently
/// dropped (§4.4).
pub fn ingest_directory(directory: &Path) -> Result<(Vec<CustomScript>, Vec<String>)> {
    let mut scripts = Vec::new();
    let mut errors = Vec::new();

    let entries = fs::read_dir(directory)
        .map_err(|e| Error::configuration(format!("cannot read custom scripts directory {}: {e}", directory.display())))?;

    let mut paths: Vec<_> = entries.flatten().map(|e| e.path()).filter(|p| p.extension().is_some_and(|ext| ext == "sql")).collect();
    paths.sort();

    for path in paths {
        let body = fs::read_to_string(&path)
            .map_err(|e| Error::configuration(format!("cannot read script {}: {e}", path.display())))?;
        let script = parse_script(&path.to_string_lossy(), &body);
        let violations = validate_script(&script);
        if violations.is_empty() {
            scripts.push(script);
        } else {
            errors.extend(violations);
        }
    }

    Ok((scripts, errors))
}

/// Converts custom scripts into `SchemaChange`s so they can flow through the
/// planner's phase assignment and cycle check alongside catalog-diff changes.
#[must_use]
pub fn scripts_to_changes(scripts: &[CustomScript]) -> Vec<SchemaChange> {
    scripts
        .iter()
        .map(|script| SchemaChange {
            operation: OperationKind::Alter,
            object_kind: ObjectKind::CustomScript,
            qualified_name: script.name.clone(),
            schema_namespace: script.schema_namespace.clone().unwrap_or_default(),
            description: format!("custom script `{}`", script.name),
            risk_level: script.risk_level,
            properties: BTreeMap::from([("pinned_phase".to_string(), script.target_phase().to_string())]),
            sql_command: script.content.clone(),
            rollback_sql: script.rollback_script.clone(),
            dependencies: script.dependencies.clone(),
        })
        .collect()
}

/// Dependency-cycle check over custom scripts, reusing the catalog differ's
/// DFS (§4.4 + §9 design note: one cycle-finding algorithm for both).
#[must_use]
pub fn find_script_cycles(scripts: &[CustomScript]) -> Vec<Vec<String>> {
    find_cycles(&scripts_to_changes(scripts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_filename() {
        assert_eq!(classify("sp_recalc_totals.sql", ""), ScriptKind::Procedure);
        assert_eq!(classify("001_migrate_orders.sql", ""), ScriptKind::Migration);
    }

    #[test]
    fn classifies_by_content_when_filename_is_generic() {
        assert_eq!(classify("change_017.sql", "CREATE VIEW v_orders AS SELECT 1"), ScriptKind::View);
    }

    #[test]
    fn rates_drop_table_as_risky() {
        assert_eq!(rate_risk("DROP TABLE orders"), RiskLevel::Risky);
    }

    #[test]
    fn extracts_dependencies_from_joins_and_references() {
        let body = "SELECT * FROM orders o JOIN customers c ON 1=1; ALTER TABLE orders ADD CONSTRAINT fk REFERENCES regions(id)";
        let deps = extract_dependencies(body);
        assert!(deps.contains(&"orders".to_string()));
        assert!(deps.contains(&"customers".to_string()));
        assert!(deps.contains(&"regions".to_string()));
    }

    #[test]
    fn parses_header_metadata() {
        let body = "-- Description: backfill totals\n-- Author: ops\n-- Order: 5\nUPDATE orders SET total = 0 WHERE id = 1";
        let script = parse_script("005_backfill.sql", body);
        assert_eq!(script.execution_order, 5);
        assert_eq!(script.risk_level, RiskLevel::Warning);
    }

    #[test]
    fn plain_insert_is_safe() {
        let script = parse_script("seed.sql", "INSERT INTO orders (id, total) VALUES (1, 10)");
        assert_eq!(script.risk_level, RiskLevel::Safe);
    }

    #[test]
    fn update_without_where_is_risky() {
        let script = parse_script("bulk.sql", "UPDATE orders SET total = 0");
        assert_eq!(script.risk_level, RiskLevel::Risky);
    }

    #[test]
    fn delete_without_where_is_risky() {
        let script = parse_script("purge.sql", "DELETE FROM orders");
        assert_eq!(script.risk_level, RiskLevel::Risky);
    }

    #[test]
    fn rates_newly_added_risky_tokens() {
        for token_script in ["EXEC sp_recalc", "xp_cmdshell 'dir'", "BULK INSERT orders FROM 'x'", "WAITFOR DELAY '00:00:05'"] {
            assert_eq!(rate_risk(token_script), RiskLevel::Risky, "expected risky for: {token_script}");
        }
    }

    #[test]
    fn transactional_and_retryable_are_independent_of_risk_level() {
        let risky_but_transactional = parse_script("bulk.sql", "UPDATE orders SET total = 0");
        assert_eq!(risky_but_transactional.risk_level, RiskLevel::Risky);
        assert!(risky_but_transactional.transactional);
        assert!(!risky_but_transactional.retryable);

        let safe_but_non_transactional = parse_script("idx.sql", "CREATE INDEX idx_orders_total ON orders (total)");
        assert_eq!(safe_but_non_transactional.risk_level, RiskLevel::Warning);
        assert!(!safe_but_non_transactional.transactional);

        let retryable = parse_script("upsert.sql", "MERGE INTO orders USING staging ON orders.id = staging.id WHEN MATCHED THEN UPDATE SET total = staging.total");
        assert!(retryable.retryable);
    }

    #[test]
    fn rejects_unbalanced_parentheses() {
        let script = parse_script("bad.sql", "SELECT (1 + 2 FROM orders");
        assert!(!validate_script(&script).is_empty());
    }

    #[test]
    fn rejects_forbidden_constructs() {
        let script = parse_script("bad.sql", "DROP DATABASE orders");
        let errors = validate_script(&script);
        assert!(errors.iter().any(|e| e.contains("forbidden construct")));
    }

    #[test]
    fn detects_circular_script_dependencies() {
        let a = parse_script("a.sql", "SELECT * FROM b");
        let b = parse_script("b.sql", "SELECT * FROM a");
        assert!(!find_script_cycles(&[a, b]).is_empty());
    }
}
