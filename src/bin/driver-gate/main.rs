//! driver-gate CLI - build-time selection of optional decoder drivers

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use driver_gate::util::diagnostic::{emit, ConfigParseError};
use driver_gate::util::Shell;
use driver_gate::GateError;

fn main() {
    let cli = Cli::parse();
    let shell = commands::shell(&cli.global);

    if let Err(e) = run(cli, &shell) {
        report(e, &shell);
        std::process::exit(1);
    }
}

fn run(cli: Cli, shell: &Shell) -> Result<()> {
    // Set up logging
    let filter = if cli.global.verbose {
        EnvFilter::new("driver_gate=debug")
    } else if cli.global.quiet || cli.global.json {
        EnvFilter::new("driver_gate=error")
    } else {
        EnvFilter::new("driver_gate=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Configure(args) => commands::configure::execute(args, &cli.global, shell),
        Commands::Filter(args) => commands::filter::execute(args, &cli.global, shell),
        Commands::List(args) => commands::list::execute(args, &cli.global, shell),
        Commands::Manifest(args) => commands::manifest::execute(args, &cli.global, shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Print an error the way its type asks to be printed.
fn report(err: anyhow::Error, shell: &Shell) {
    if shell.is_json() {
        shell.error(format!("{:#}", err));
        return;
    }

    if let Some(gate) = err.downcast_ref::<GateError>() {
        emit(&gate.to_diagnostic(), shell.use_color());
        return;
    }

    match err.downcast::<ConfigParseError>() {
        Ok(parse) => eprintln!("{:?}", miette::Report::new(parse)),
        Err(err) => eprintln!("error: {:#}", err),
    }
}
