//! `stackcheck` binary entry point.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use stackcheck_core::config::StackcheckConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Config problems surface again from the subcommand with the right exit code.
    let general = StackcheckConfig::load_or_default(&cli.config)
        .await
        .map(|config| config.general)
        .unwrap_or_default();
    if let Err(e) = logging::init_tracing(cli.log_level.as_deref(), &general) {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }

    tracing::debug!(config = %cli.config.display(), "stackcheck starting");

    if let Err(e) = dispatch(cli).await {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    match cli.command {
        Commands::Run(args) => commands::run::execute(args, &cli.config, &writer).await,
        Commands::Variants(args) => commands::variants::execute(args, &cli.config, &writer).await,
        Commands::Scenarios(args) => {
            commands::scenarios::execute(args, &cli.config, &writer).await
        }
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}
