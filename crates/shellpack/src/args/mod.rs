mod completions;

use anyhow::bail;
use clap::{
    ValueEnum,
    builder::{Styles, styling::AnsiColor},
};
use serde::Serialize;
use tracing::level_filters::LevelFilter;

pub use completions::Completions;

const MAIN_COLOR: AnsiColor = AnsiColor::Cyan;
const SECONDARY_COLOR: AnsiColor = AnsiColor::Yellow;
const HELP_STYLES: Styles = Styles::styled()
    .header(MAIN_COLOR.on_default().bold())
    .usage(MAIN_COLOR.on_default().bold())
    .placeholder(SECONDARY_COLOR.on_default())
    .literal(SECONDARY_COLOR.on_default());

/// Shellpack manages shell plugins declaratively: declare packages in your
/// config, then install, pin and load them in dependency order.
#[derive(clap::Parser, Debug)]
#[command(version, author, styles = HELP_STYLES)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
    /// Print source location and additional information in logs.
    ///
    /// If this option is unspecified, logs are printed at the INFO level
    /// without verbosity.
    /// `-v` adds verbosity to logs.
    /// `-vv` adds verbosity and sets the log level to DEBUG.
    /// `-vvv` adds verbosity and sets the log level to TRACE.
    /// To change the log level without setting verbosity, use the
    /// `SHELLPACK_LOG` environment variable. E.g. `SHELLPACK_LOG=DEBUG`.
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
    )]
    verbose: u8,
}

impl CliArgs {
    pub fn verbosity(&self) -> anyhow::Result<Option<LevelFilter>> {
        let level = match self.verbose {
            0 => None,
            1 => Some(LevelFilter::INFO),
            2 => Some(LevelFilter::DEBUG),
            3 => Some(LevelFilter::TRACE),
            _ => bail!("invalid verbosity level. Use -v, -vv, or -vvv."),
        };
        Ok(level)
    }
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Install missing packages and emit the shell code that loads them.
    ///
    /// Clones fan out in parallel; configuration is applied in dependency
    /// order. Eval the output in your shell:
    /// `eval "$(shellpack install)"`.
    Install(PackageSelection),
    /// Fetch and fast-forward installed packages.
    ///
    /// Honors the declared branch, tag or commit. A package whose revision
    /// changed re-runs its build snippet.
    Update(PackageSelection),
    /// Delete a remote package's working tree and forget it.
    Remove(PackageName),
    /// Show every declared package and its state.
    List(OutputArgs),
    /// Pin the installed revisions in the lockfile.
    Freeze,
    /// Re-clone every lockfile entry at its pinned revision.
    Restore,
    /// Show everything known about one package.
    Info(InfoArgs),
    /// Compare the lockfile against the working trees on disk.
    Diff(OutputArgs),
    /// Print a package's on-disk path.
    Path(PackageName),
    /// Run a command inside a package directory.
    ///
    /// `PKG_DIR` and `PKG_NAME` are exported for the command. Without
    /// `--pkg`, the command runs in the packages root.
    Run(RunArgs),
    /// Diagnose common problems with declarations, working trees and the
    /// lockfile.
    Doctor,
    /// Update a from-git installation of shellpack itself.
    SelfUpdate,
    /// Generate command autocompletions for various shells.
    Completions(Completions),
}

#[derive(clap::Parser, Debug)]
pub struct PackageSelection {
    /// Package to operate on; all declared packages when omitted.
    pub name: Option<String>,
}

#[derive(clap::Parser, Debug)]
pub struct PackageName {
    pub name: String,
}

#[derive(clap::Parser, Debug)]
pub struct OutputArgs {
    /// Output format. Human-readable text when omitted.
    #[arg(short, long, value_enum)]
    pub output: Option<OutputType>,
}

#[derive(clap::Parser, Debug)]
pub struct InfoArgs {
    pub name: String,
    /// Output format. Human-readable text when omitted.
    #[arg(short, long, value_enum)]
    pub output: Option<OutputType>,
}

#[derive(clap::Parser, Debug)]
pub struct RunArgs {
    /// Package whose directory the command runs in.
    #[arg(long)]
    pub pkg: Option<String>,
    /// Command and arguments to run.
    #[arg(required = true, trailing_var_arg = true)]
    pub command: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputType {
    Json,
}

pub fn print_output(output_type: OutputType, output: impl Serialize) {
    match output_type {
        OutputType::Json => match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!("can't serialize output to json: {e}"),
        },
    }
}
