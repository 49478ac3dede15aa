//! Orchestrates the diff -> risk -> plan -> render -> (execute) flow shared
//! by the three subcommands. `validate` stops after risk assessment,
//! `plan` additionally builds and renders the deployment plan, `deploy`
//! additionally backs up and executes it.

use std::path::Path;

use schemectl_core::{
    CustomScript, DeploymentConfig, DeploymentPlan, DeploymentResult, DiffConfig, DiffEngine,
    Error, Planner, ProviderKind, Result, RiskAssessment, ValidationResult,
};

use crate::{config_loader, dialects};

pub struct PipelineOutcome {
    pub config: DeploymentConfig,
    pub validation: ValidationResult,
    pub risk: RiskAssessment,
    pub plan: Option<DeploymentPlan>,
    pub rendered: Option<(String, String)>,
    pub deployment: Option<DeploymentResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    Plan,
    Deploy,
}

/// Maps a provider to the lowercase tag `provider_incompatibilities` and the
/// error taxonomy's `provider` field expect.
pub fn provider_tag(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::SqlServer => "sqlserver",
        ProviderKind::Postgresql => "postgresql",
        ProviderKind::Mysql => "mysql",
        ProviderKind::Oracle => "oracle",
        ProviderKind::Sqlite => "sqlite",
    }
}

fn load_scripts(config: &DeploymentConfig) -> Result<(Vec<CustomScript>, Vec<String>)> {
    let Some(dir) = &config.custom_scripts_path else { return Ok((Vec::new(), Vec::new())) };
    let (scripts, mut errors) = schemectl_core::ingest_directory(Path::new(dir))?;

    for script in &scripts {
        errors.extend(schemectl_core::provider_incompatibilities(script, provider_tag(config.provider)));
    }
    for cycle in schemectl_core::find_script_cycles(&scripts) {
        errors.push(format!("circular custom-script dependency: {}", cycle.join(" -> ")));
    }

    Ok((scripts, errors))
}

#[tracing::instrument(skip_all, fields(stage = ?stage))]
pub fn run(stage: Stage, config_path: &Path, desired_schema_path: &Path) -> Result<PipelineOutcome> {
    let config = config_loader::load(config_path)?;
    config.validate_prerequisites().map_err(|errors| Error::Validation { errors })?;

    let desired = config_loader::load_desired_schema(desired_schema_path)?;

    let mut adapter = dialects::connect(config.provider, &config.connection)?;
    if !adapter.test_connection() {
        return Err(Error::connectivity(provider_tag(config.provider), std::io::Error::other("test_connection reported the database unreachable")));
    }
    let current = adapter.introspect(&config.connection.schema_namespace)?;

    let diff_config = DiffConfig { cross_schema_reference_enabled: config.cross_schema_reference_enabled, ..DiffConfig::default() };
    let mut validation = DiffEngine::new().diff(&current, &desired, &diff_config);

    let (scripts, script_errors) = load_scripts(&config)?;
    if !script_errors.is_empty() {
        return Err(Error::Validation { errors: script_errors });
    }

    let risk_input = {
        let mut merged = validation.clone();
        merged.changes.extend(schemectl_core::scripts_to_changes(&scripts));
        merged
    };
    let risk = schemectl_core::assess(&risk_input, &config);

    if stage == Stage::Validate {
        return Ok(PipelineOutcome { config, validation, risk, plan: None, rendered: None, deployment: None });
    }

    let mut plan = Planner::new().build(std::mem::take(&mut validation.changes), &scripts);
    render_plan_sql(&mut plan, config.provider)?;
    let rendered = render_scripts(&plan);

    if stage == Stage::Plan {
        return Ok(PipelineOutcome { config, validation, risk, plan: Some(plan), rendered: Some(rendered), deployment: None });
    }

    if risk.requires_approval && !config.approval_bypassed() {
        return Err(Error::RiskPolicy { phase: "deployment".to_string(), reason: "plan requires approval and approval bypass is not enabled".to_string() });
    }

    if config.backup.backup_before_deployment && !config.skip_backup {
        run_backup(adapter.as_mut(), &config)?;
    }

    let deployment = schemectl_core::Executor::new(adapter.as_mut(), &config).execute_plan(&plan)?;

    Ok(PipelineOutcome { config, validation, risk, plan: Some(plan), rendered: Some(rendered), deployment: Some(deployment) })
}

fn render_plan_sql(plan: &mut DeploymentPlan, provider: ProviderKind) -> Result<()> {
    let emitter = dialects::emitter(provider)?;
    for phase in &mut plan.phases {
        for op in &mut phase.operations {
            if op.sql_command.is_empty() {
                let rendered = emitter.render(op);
                op.sql_command = rendered.sql;
                op.rollback_sql = rendered.rollback_sql;
            }
        }
    }
    Ok(())
}

fn render_scripts(plan: &DeploymentPlan) -> (String, String) {
    let statements: Vec<_> = plan
        .non_empty_phases()
        .flat_map(|phase| &phase.operations)
        .map(|op| schemectl_core::RenderedStatement { sql: op.sql_command.clone(), rollback_sql: op.rollback_sql.clone(), transactional: true })
        .collect();
    schemectl_core::compile_scripts(&statements)
}

fn run_backup(adapter: &mut dyn schemectl_core::ProviderAdapter, config: &DeploymentConfig) -> Result<()> {
    let now = chrono::Utc::now();
    let path = schemectl_core::compute_backup_path(
        &config.backup.backup_directory,
        environment_tag(config.environment),
        config.vertical.as_deref(),
        &config.connection.database,
        &config.backup.restore_point_label,
        config.provider,
        now,
    );
    let request = schemectl_core::BackupRequest { backup_path: path.to_string_lossy().into_owned(), label: config.backup.restore_point_label.clone() };
    adapter.create_backup(&request, &config.backup)?;
    if !adapter.verify_backup(&request.backup_path)? {
        return Err(Error::Backup { message: format!("backup at {} failed verification", request.backup_path), source: None });
    }
    Ok(())
}

fn environment_tag(env: schemectl_core::Environment) -> &'static str {
    match env {
        schemectl_core::Environment::Dev => "dev",
        schemectl_core::Environment::Beta => "beta",
        schemectl_core::Environment::Prod => "prod",
    }
}

/// `validate`/`plan`/`deploy` all end in one of the risk-level exit codes
/// (0/1/2) on success; `run`'s `Err` path maps through `Error::exit_code`.
#[must_use]
pub fn success_exit_code(outcome: &PipelineOutcome) -> i32 {
    outcome.risk.exit_code()
}
