mod cli;
mod config_loader;
mod dialects;
mod error_presentation;
mod outputs;
mod pipeline;

use clap::Parser;

use cli::{Cli, Command, PipelineArgs};
use pipeline::Stage;

fn run(stage: Stage, args: &PipelineArgs) -> i32 {
    let outcome = match pipeline::run(stage, &args.config, &args.desired_schema) {
        Ok(outcome) => outcome,
        Err(error) => {
            let exit_code = error.exit_code();
            eprintln!("{}", error_presentation::render_runtime_error(error));
            return exit_code;
        }
    };

    if let Err(error) = outputs::write_all(&args.output_dir, &outcome) {
        let exit_code = error.exit_code();
        eprintln!("{}", error_presentation::render_runtime_error(error));
        return exit_code;
    }

    pipeline::success_exit_code(&outcome)
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let exit_code = match &cli.command {
        Command::Validate(args) => run(Stage::Validate, args),
        Command::Plan(args) => run(Stage::Plan, args),
        Command::Deploy(args) => run(Stage::Deploy, args),
    };

    std::process::exit(exit_code);
}
