use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "schemectl")]
#[command(about = "Relational-schema deployment engine")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Diff current against desired schema and report risk, without building a plan.
    Validate(PipelineArgs),
    /// Build and write the full deployment plan and compiled SQL, without executing.
    Plan(PipelineArgs),
    /// Build the plan and execute it against the target database.
    Deploy(PipelineArgs),
}

#[derive(Parser)]
pub struct PipelineArgs {
    /// Deployment configuration file (YAML or JSON, by extension).
    #[arg(long)]
    pub config: PathBuf,

    /// Desired-schema snapshot file (YAML or JSON `DatabaseSchema`, by extension).
    #[arg(long)]
    pub desired_schema: PathBuf,

    /// Directory the fixed file outputs are written to.
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}
