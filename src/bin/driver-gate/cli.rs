//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

use driver_gate::util::shell::ColorChoice;

/// driver-gate - build-time selection of optional decoder drivers
#[derive(Parser)]
#[command(name = "driver-gate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Emit machine-readable JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, default_value = "auto", value_name = "WHEN")]
    pub color: ColorChoice,

    /// Path to driver-gate.toml (defaults to searching upwards from the cwd)
    #[arg(long, global = true, env = "DRIVER_GATE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Ignore the user-wide config file
    #[arg(long, global = true)]
    pub no_global_config: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover drivers, validate the selection and record it
    Configure(ConfigureArgs),

    /// Enable selected driver sources and disable the rest
    Filter(FilterArgs),

    /// List the drivers found in the source directory
    List(ListArgs),

    /// Print the compile inputs left after driver filtering
    Manifest(ManifestArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct ConfigureArgs {
    /// Directory holding the driver sources
    #[arg(long, value_name = "DIR")]
    pub source_dir: Option<PathBuf>,

    /// Build environment file to write
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Drivers to include: `all` or a comma-separated list
    #[arg(long, value_name = "LIST")]
    pub drivers: Option<String>,

    /// Reject a single driver given without a list
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args)]
pub struct FilterArgs {
    /// Directory holding the driver sources
    #[arg(long, value_name = "DIR")]
    pub source_dir: Option<PathBuf>,

    /// Build environment file to read the selection from
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Comma-separated drivers to keep, overriding the build environment
    #[arg(long, env = "DRIVER_GATE_INCLUDE_DRIVERS", value_name = "LIST")]
    pub include: Option<String>,

    /// Exit with an error if any file could not be renamed
    #[arg(long)]
    pub deny_failures: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Directory holding the driver sources
    #[arg(long, value_name = "DIR")]
    pub source_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct ManifestArgs {
    /// Directory holding the driver sources
    #[arg(long, value_name = "DIR")]
    pub source_dir: Option<PathBuf>,

    /// Build environment file to read the selection from
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}
