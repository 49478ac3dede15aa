use crate::{
    config::{DeploymentConfig, Environment},
    model::{ObjectKind, OperationKind, RiskAssessment, RiskFactor, RiskLevel, SchemaChange, ValidationResult},
};

const WARNING_VOLUME_THRESHOLD: usize = 5;
const TABLE_OP_VOLUME_THRESHOLD: usize = 10;
const INDEX_OP_VOLUME_THRESHOLD: usize = 20;
const TYPE_CHANGE_VOLUME_THRESHOLD: usize = 5;

/// Rolls up the change list, validation result, and deployment config into
/// an overall verdict (§4.3). Pure function: no I/O, no mutable state.
#[must_use]
#[tracing::instrument(skip_all)]
pub fn assess(validation: &ValidationResult, config: &DeploymentConfig) -> RiskAssessment {
    let changes = &validation.changes;
    let safe_count = changes.iter().filter(|c| c.risk_level == RiskLevel::Safe).count();
    let warning_count = changes.iter().filter(|c| c.risk_level == RiskLevel::Warning).count();
    let risky_count = changes.iter().filter(|c| c.risk_level == RiskLevel::Risky).count();

    let mut factors = Vec::new();
    collect_change_factors(changes, &mut factors);
    collect_validation_factors(validation, &mut factors);
    collect_environment_factors(config, &mut factors);
    collect_volume_factors(changes, warning_count, &mut factors);

    let overall_risk_level = overall_level(&factors, risky_count, warning_count);
    let requires_approval = overall_risk_level >= RiskLevel::Warning;
    let requires_dual_approval = overall_risk_level == RiskLevel::Risky;

    RiskAssessment {
        safe_count,
        warning_count,
        risky_count,
        factors,
        overall_risk_level,
        requires_approval,
        requires_dual_approval,
    }
}

fn overall_level(factors: &[RiskFactor], risky_count: usize, warning_count: usize) -> RiskLevel {
    if risky_count > 0 || factors.iter().any(|f| f.risk_level == RiskLevel::Risky) {
        RiskLevel::Risky
    } else if warning_count > 0 || factors.iter().any(|f| f.risk_level == RiskLevel::Warning) {
        RiskLevel::Warning
    } else {
        RiskLevel::Safe
    }
}

fn factor(name: &str, description: impl Into<String>, category: &str, level: RiskLevel, affected: Vec<String>) -> RiskFactor {
    RiskFactor {
        name: name.to_string(),
        description: description.into(),
        category: category.to_string(),
        risk_level: level,
        affected_objects: affected,
    }
}

fn collect_change_factors(changes: &[SchemaChange], factors: &mut Vec<RiskFactor>) {
    if changes.iter().any(|c| c.risk_level == RiskLevel::Risky) {
        factors.push(factor(
            "High-Risk Operations",
            "one or more operations are classified Risky",
            "risk",
            RiskLevel::Risky,
            affected(changes.iter().filter(|c| c.risk_level == RiskLevel::Risky)),
        ));
    }

    let table_drops: Vec<&SchemaChange> = changes
        .iter()
        .filter(|c| c.operation == OperationKind::Drop && c.object_kind == ObjectKind::Table)
        .collect();
    if !table_drops.is_empty() {
        let mut f = factor(
            "Table Drop Operation",
            "one or more tables will be dropped",
            "data_loss",
            RiskLevel::Risky,
            affected(table_drops.into_iter()),
        );
        f.description.push_str(" (data_loss=true, reversible=false)");
        factors.push(f);
    }

    let data_loss: Vec<&SchemaChange> = changes.iter().filter(|c| c.has_property("potential_data_loss")).collect();
    if !data_loss.is_empty() {
        factors.push(factor(
            "Data Type Change with Potential Loss",
            "column type changes may truncate or lose data",
            "data_loss",
            RiskLevel::Risky,
            affected(data_loss.iter().copied()),
        ));
        factors.push(factor(
            "Potential Data Loss Operations",
            format!("{} operation(s) flagged potential_data_loss", data_loss.len()),
            "data_loss",
            RiskLevel::Risky,
            affected(data_loss.into_iter()),
        ));
    }

    let clustered_creates: Vec<&SchemaChange> = changes
        .iter()
        .filter(|c| c.operation == OperationKind::Create && c.object_kind == ObjectKind::Index && c.has_property("is_clustered"))
        .collect();
    if !clustered_creates.is_empty() {
        factors.push(factor(
            "Clustered Index Creation",
            "one or more clustered indexes will be created",
            "performance",
            RiskLevel::Warning,
            affected(clustered_creates.into_iter()),
        ));
    }

    let pk_drops: Vec<&SchemaChange> = changes
        .iter()
        .filter(|c| c.operation == OperationKind::Drop && c.object_kind == ObjectKind::Constraint && c.property("constraint_type") == Some("PK"))
        .collect();
    if !pk_drops.is_empty() {
        factors.push(factor(
            "Primary Key Constraint Drop",
            "one or more primary keys will be dropped",
            "integrity",
            RiskLevel::Warning,
            affected(pk_drops.into_iter()),
        ));
    }

    let non_nullable_adds: Vec<&SchemaChange> = changes
        .iter()
        .filter(|c| {
            c.operation == OperationKind::Alter
                && c.object_kind == ObjectKind::Column
                && c.property("change_type") == Some("add")
                && c.risk_level == RiskLevel::Warning
        })
        .collect();
    if !non_nullable_adds.is_empty() {
        factors.push(factor(
            "Non-Nullable Columns Without Defaults",
            "one or more non-nullable columns are added without a default",
            "data_integrity",
            RiskLevel::Warning,
            affected(non_nullable_adds.into_iter()),
        ));
    }

    let fk_changes: Vec<&SchemaChange> = changes
        .iter()
        .filter(|c| c.object_kind == ObjectKind::Constraint && c.property("constraint_type") == Some("FK"))
        .collect();
    if !fk_changes.is_empty() {
        factors.push(factor(
            "Foreign Key Constraint Changes",
            "one or more foreign keys are created or dropped",
            "integrity",
            RiskLevel::Warning,
            affected(fk_changes.into_iter()),
        ));
    }

    let dependent_drops: Vec<&SchemaChange> = changes
        .iter()
        .filter(|c| c.operation == OperationKind::Drop && matches!(c.object_kind, ObjectKind::View | ObjectKind::Procedure))
        .collect();
    if !dependent_drops.is_empty() {
        factors.push(factor(
            "Dependent Object Drops",
            "one or more views/procedures will be dropped",
            "dependency",
            RiskLevel::Warning,
            affected(dependent_drops.into_iter()),
        ));
    }
}

fn collect_validation_factors(validation: &ValidationResult, factors: &mut Vec<RiskFactor>) {
    if !validation.errors.is_empty() {
        let mut f = factor(
            "Schema Validation Errors",
            format!("{} validation error(s) block deployment", validation.errors.len()),
            "validation",
            RiskLevel::Risky,
            validation.errors.iter().map(|e| e.object_reference.clone()).collect(),
        );
        f.description.push_str(" (deployment_blocking=true)");
        factors.push(f);
    }

    let risky_warnings: Vec<&str> = validation
        .warnings
        .iter()
        .filter(|w| w.risk_level == Some(RiskLevel::Risky))
        .map(|w| w.object_reference.as_str())
        .collect();
    if !risky_warnings.is_empty() {
        factors.push(factor(
            "High-Risk Validation Warnings",
            format!("{} warning(s) carry Risky severity", risky_warnings.len()),
            "validation",
            RiskLevel::Warning,
            risky_warnings.into_iter().map(str::to_string).collect(),
        ));
    }
}

fn collect_environment_factors(config: &DeploymentConfig, factors: &mut Vec<RiskFactor>) {
    if config.environment == Environment::Prod {
        factors.push(factor(
            "Production Environment Deployment",
            "target environment is production",
            "environment",
            RiskLevel::Warning,
            Vec::new(),
        ));
        if config.skip_backup {
            factors.push(factor(
                "Production Deployment Without Backup",
                "backup is skipped for a production deployment",
                "environment",
                RiskLevel::Risky,
                Vec::new(),
            ));
        }
    }

    if config.environment == Environment::Beta && config.vertical.as_deref().unwrap_or("").trim().is_empty() {
        factors.push(factor(
            "Beta Deployment Missing Vertical",
            "beta deployments should declare a vertical",
            "environment",
            RiskLevel::Warning,
            Vec::new(),
        ));
    }
}

fn collect_volume_factors(changes: &[SchemaChange], warning_count: usize, factors: &mut Vec<RiskFactor>) {
    if warning_count > WARNING_VOLUME_THRESHOLD {
        factors.push(factor(
            "High Volume Warning Operations",
            format!("{warning_count} warning-level operations"),
            "volume",
            RiskLevel::Warning,
            Vec::new(),
        ));
    }

    let table_ops = changes.iter().filter(|c| c.object_kind == ObjectKind::Table).count();
    if table_ops > TABLE_OP_VOLUME_THRESHOLD {
        factors.push(factor("High Volume Table Operations", format!("{table_ops} table operations"), "volume", RiskLevel::Warning, Vec::new()));
    }

    let index_ops = changes.iter().filter(|c| c.object_kind == ObjectKind::Index).count();
    if index_ops > INDEX_OP_VOLUME_THRESHOLD {
        factors.push(factor("High Volume Index Operations", format!("{index_ops} index operations"), "volume", RiskLevel::Warning, Vec::new()));
    }

    let type_changes = changes.iter().filter(|c| c.property("change_type") == Some("type_change")).count();
    if type_changes > TYPE_CHANGE_VOLUME_THRESHOLD {
        factors.push(factor("High Volume Data Type Changes", format!("{type_changes} type changes"), "volume", RiskLevel::Warning, Vec::new()));
    }
}

fn affected<'a>(changes: impl Iterator<Item = &'a SchemaChange>) -> Vec<String> {
    changes.map(|c| c.qualified_name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::config::{BackupConfig, ConnectionConfig, OperationMode, ProviderKind, RetryConfig, ValidationLevel};
    use crate::model::ValidationResult;

    fn config(environment: Environment, skip_backup: bool) -> DeploymentConfig {
        DeploymentConfig {
            provider: ProviderKind::Postgresql,
            connection: ConnectionConfig {
                server: "localhost".to_string(),
                port: None,
                database: "app".to_string(),
                username: "app".to_string(),
                password: None,
                integrated_auth: false,
                schema_namespace: "public".to_string(),
                extra: BTreeMap::new(),
            },
            retry: RetryConfig::default(),
            mode: OperationMode::Execute,
            no_op: false,
            skip_backup,
            environment,
            vertical: Some("acme".to_string()),
            validation_level: ValidationLevel::Normal,
            cross_schema_reference_enabled: false,
            custom_scripts_path: None,
            backup: BackupConfig::default(),
            bypass_approval: false,
        }
    }

    fn change(object_kind: ObjectKind, operation: OperationKind, risk_level: RiskLevel) -> SchemaChange {
        SchemaChange {
            operation,
            object_kind,
            qualified_name: "orders".to_string(),
            schema_namespace: "public".to_string(),
            description: String::new(),
            risk_level,
            properties: BTreeMap::new(),
            sql_command: String::new(),
            rollback_sql: None,
            dependencies: Vec::new(),
        }
    }

    #[test]
    fn safe_changes_require_no_approval() {
        let validation = ValidationResult { changes: vec![change(ObjectKind::Table, OperationKind::Create, RiskLevel::Safe)], errors: vec![], warnings: vec![] };
        let assessment = assess(&validation, &config(Environment::Dev, false));
        assert_eq!(assessment.overall_risk_level, RiskLevel::Safe);
        assert!(!assessment.requires_approval);
    }

    #[test]
    fn table_drop_forces_risky_with_dual_approval() {
        let validation = ValidationResult { changes: vec![change(ObjectKind::Table, OperationKind::Drop, RiskLevel::Risky)], errors: vec![], warnings: vec![] };
        let assessment = assess(&validation, &config(Environment::Prod, false));
        assert_eq!(assessment.overall_risk_level, RiskLevel::Risky);
        assert!(assessment.requires_dual_approval);
        assert!(assessment.factors.iter().any(|f| f.name == "Table Drop Operation"));
    }

    #[test]
    fn prod_deployment_without_backup_is_flagged() {
        let validation = ValidationResult { changes: vec![], errors: vec![], warnings: vec![] };
        let assessment = assess(&validation, &config(Environment::Prod, true));
        assert!(assessment.factors.iter().any(|f| f.name == "Production Deployment Without Backup"));
        assert_eq!(assessment.overall_risk_level, RiskLevel::Risky);
    }
}
