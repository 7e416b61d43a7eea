//! KnockKnock - Be notified when your training is complete.
//!
//! Runs a command line and reports its start and end through the chosen
//! backend. The command's exit code is passed through.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use figment::Figment;
use knockknock::{
    cli::Cli,
    command::ChildCommand,
    config::SenderConfig,
    notifier::ProcessRole,
};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.sender.is_none() {
        let _ = Cli::command().print_help();
        return ExitCode::from(1);
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("knockknock failed: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let sender = cli.sender.clone().context("no sender selected")?;
    let child = ChildCommand::new(sender.run_args().command.clone(), cli.verbose)?;

    let config = SenderConfig::from_figment(&Figment::from(cli))?
        .context("no sender configured on the command line")?;
    info!(sender = %config.sender, "Starting knockknock");
    let notifier = config.into_notifier(ProcessRole::detect())?;

    let name = child.display_name();
    let outcome = match &notifier {
        Some(notifier) => notifier.run(&name, || child.run()),
        None => child.run(),
    };

    match outcome {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!(command = %name, error = %e, "Command did not complete");
            Ok(ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1)))
        }
    }
}
