use anyhow::Context;
use miette::Report;

const PIPELINE_CONTEXT: &str = "while running the deployment pipeline";

pub(crate) fn render_runtime_error(error: schemectl_core::Error) -> String {
    let category = core_category(&error);
    let report = report_with_context(error, PIPELINE_CONTEXT);
    format!("[{category}] {report}")
}

fn report_with_context<E>(source: E, context: &str) -> Report
where
    E: std::error::Error + Send + Sync + 'static,
{
    let anyhow_error = std::result::Result::<(), E>::Err(source).context(context.to_string()).expect_err("context wrapping must produce an error");
    miette::miette!("{anyhow_error:#}")
}

fn core_category(error: &schemectl_core::Error) -> &'static str {
    match error {
        schemectl_core::Error::Configuration { .. } => "config",
        schemectl_core::Error::Connectivity { .. } => "connectivity",
        schemectl_core::Error::Transient { .. } => "transient",
        schemectl_core::Error::Validation { .. } => "validation",
        schemectl_core::Error::RiskPolicy { .. } => "risk-policy",
        schemectl_core::Error::ExternalTool { .. } => "external-tool",
        schemectl_core::Error::Backup { .. } => "backup",
        schemectl_core::Error::Rollback { .. } => "rollback",
    }
}
