//! Writers for the nine fixed file outputs (spec §6). Structured outputs
//! use `serde_json` to stay consumable by downstream tooling; the two SQL
//! scripts and the summary are plain text.

use std::path::Path;

use schemectl_core::{ProviderKind, Result, RiskAssessment};
use serde::Serialize;

use crate::pipeline::PipelineOutcome;

fn write_json(dir: &Path, name: &str, value: &impl Serialize) -> Result<()> {
    let body = serde_json::to_string_pretty(value).map_err(|e| schemectl_core::Error::configuration(format!("serializing {name}: {e}")))?;
    write_text(dir, name, &body)
}

fn write_text(dir: &Path, name: &str, body: &str) -> Result<()> {
    std::fs::write(dir.join(name), body).map_err(|e| schemectl_core::Error::configuration(format!("writing {name}: {e}")))
}

#[derive(Serialize)]
struct TagPattern {
    environment: String,
    pattern: String,
}

/// Deploy-tag naming conventions derived from the config, not a live git
/// client — entity discovery and git tagging are external collaborators.
fn tag_patterns(provider: ProviderKind) -> Vec<TagPattern> {
    let tag = format!("deploy/{}/{{environment}}/{{timestamp}}", provider_tag(provider));
    vec![
        TagPattern { environment: "dev".to_string(), pattern: tag.replace("{environment}", "dev") },
        TagPattern { environment: "beta".to_string(), pattern: tag.replace("{environment}", "beta") },
        TagPattern { environment: "prod".to_string(), pattern: tag.replace("{environment}", "prod") },
    ]
}

fn provider_tag(provider: ProviderKind) -> &'static str {
    crate::pipeline::provider_tag(provider)
}

#[derive(Serialize)]
struct ApprovalRequest<'a> {
    overall_risk_level: String,
    safe_count: usize,
    warning_count: usize,
    risky_count: usize,
    requires_dual_approval: bool,
    factors: &'a [schemectl_core::RiskFactor],
}

fn approval_request(risk: &RiskAssessment) -> ApprovalRequest<'_> {
    ApprovalRequest {
        overall_risk_level: format!("{:?}", risk.overall_risk_level),
        safe_count: risk.safe_count,
        warning_count: risk.warning_count,
        risky_count: risk.risky_count,
        requires_dual_approval: risk.requires_dual_approval,
        factors: &risk.factors,
    }
}

fn deployment_summary(outcome: &PipelineOutcome) -> String {
    let mut summary = String::new();
    summary.push_str("# Deployment Summary\n\n");
    summary.push_str(&format!("- Provider: {:?}\n", outcome.config.provider));
    summary.push_str(&format!("- Environment: {:?}\n", outcome.config.environment));
    summary.push_str(&format!("- Overall risk: {:?}\n", outcome.risk.overall_risk_level));
    summary.push_str(&format!("- Safe / Warning / Risky changes: {} / {} / {}\n", outcome.risk.safe_count, outcome.risk.warning_count, outcome.risk.risky_count));
    if let Some(plan) = &outcome.plan {
        summary.push_str(&format!("- Total operations: {}\n", plan.total_operations()));
        summary.push_str(&format!("- Non-empty phases: {}\n", plan.non_empty_phases().count()));
    }
    if let Some(deployment) = &outcome.deployment {
        summary.push_str(&format!("- Phases committed: {}\n", deployment.phase_results.len()));
        summary.push_str(&format!("- Post-deployment validation passed: {}\n", deployment.post_validation_passed));
        if !deployment.rolled_back_phases.is_empty() {
            summary.push_str(&format!("- Phases rolled back: {:?}\n", deployment.rolled_back_phases));
        }
    }
    summary
}

/// Writes the subset of the nine fixed outputs relevant to the stage that
/// actually ran: `validate` only produces the analysis/validation/approval
/// files, `plan`/`deploy` additionally produce the plan and SQL scripts.
pub fn write_all(dir: &Path, outcome: &PipelineOutcome) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| schemectl_core::Error::configuration(format!("creating output dir {}: {e}", dir.display())))?;

    write_json(dir, "schema-analysis.json", &outcome.validation.changes)?;
    write_json(dir, "validation-report.json", &outcome.validation)?;
    write_json(dir, "tag-patterns.json", &tag_patterns(outcome.config.provider))?;
    write_json(dir, "approval-request.json", &approval_request(&outcome.risk))?;
    write_text(dir, "DEPLOYMENT_SUMMARY.md", &deployment_summary(outcome))?;
    write_text(dir, "pipeline-tools.log", "")?;

    if let Some(plan) = &outcome.plan {
        write_json(dir, "deployment-plan.json", plan)?;
    }
    if let Some((forward, rollback)) = &outcome.rendered {
        write_text(dir, "compiled-deployment.sql", forward)?;
        write_text(dir, "rollback-script.sql", rollback)?;
    }

    Ok(())
}
