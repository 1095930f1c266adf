mod args;
mod log;

use std::process::ExitCode;

use clap::Parser;
use shellpack_core::command::{
    DriftEntry, DriftState, Finding, ListEntry, PackageInfo, PackageState, SelfUpdate,
    UpdateOutcome,
};
use shellpack_core::{LoadOutcome, Manager, ShellWriter};
use tracing::{error, info, warn};

use crate::args::{CliArgs, Command, OutputType, print_output};

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    let verbosity = match args.verbosity() {
        Ok(verbosity) => verbosity,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    log::init(verbosity);
    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    // Subcommands that don't touch the registry skip ingestion entirely.
    match &args.command {
        Command::Completions(cmd_args) => {
            cmd_args.print();
            return Ok(ExitCode::SUCCESS);
        }
        Command::SelfUpdate => {
            report_self_update(shellpack_core::command::self_update()?);
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let mut manager = Manager::from_env()?;
    let report = manager.ingest()?;
    let rejected = report.rejected;

    match args.command {
        Command::Install(cmd_args) => {
            let mut session = ShellWriter::new();
            let outcome =
                shellpack_core::command::install(&mut manager, &mut session, cmd_args.name.as_deref())
                    .await?;
            print!("{}", session.finish());
            report_load(&outcome);
            Ok(exit_for(outcome.failed.len(), rejected))
        }
        Command::Update(cmd_args) => {
            let outcome =
                shellpack_core::command::update(&manager, cmd_args.name.as_deref()).await?;
            report_update(&outcome);
            Ok(exit_for(outcome.failed.len(), rejected))
        }
        Command::Remove(cmd_args) => {
            shellpack_core::command::remove(&mut manager, &cmd_args.name)?;
            println!("removed {}", cmd_args.name);
            Ok(exit_for(0, rejected))
        }
        Command::List(cmd_args) => {
            let entries = shellpack_core::command::list(&manager);
            match cmd_args.output {
                Some(OutputType::Json) => print_output(OutputType::Json, &entries),
                None => print_list(&entries),
            }
            // list is informational and always succeeds.
            Ok(ExitCode::SUCCESS)
        }
        Command::Freeze => {
            let outcome = shellpack_core::command::freeze(&manager)?;
            println!(
                "froze {} package(s) to {}",
                outcome.lockfile.packages.len(),
                manager.dirs.lockfile_path()
            );
            Ok(exit_for(outcome.failed.len(), rejected))
        }
        Command::Restore => {
            let outcome = shellpack_core::command::restore(&manager).await?;
            println!("restored {} package(s)", outcome.restored.len());
            Ok(exit_for(outcome.failed.len(), rejected))
        }
        Command::Info(cmd_args) => {
            let info = shellpack_core::command::info(&manager, &cmd_args.name)?;
            match cmd_args.output {
                Some(OutputType::Json) => print_output(OutputType::Json, &info),
                None => print_info(&info),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Diff(cmd_args) => {
            let entries = shellpack_core::command::diff(&manager)?;
            match cmd_args.output {
                Some(OutputType::Json) => print_output(OutputType::Json, &entries),
                None => print_diff(&entries),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Path(cmd_args) => {
            let (package, _) = manager
                .registry
                .lookup(&cmd_args.name)
                .ok_or_else(|| anyhow::anyhow!("unknown package `{}`", cmd_args.name))?;
            println!("{}", package.path);
            Ok(ExitCode::SUCCESS)
        }
        Command::Run(cmd_args) => {
            let code = shellpack_core::command::run_in_package(
                &manager,
                cmd_args.pkg.as_deref(),
                &cmd_args.command,
            )?;
            Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
        }
        Command::Doctor => {
            let findings = shellpack_core::command::doctor(&manager)?;
            print_findings(&findings);
            Ok(ExitCode::SUCCESS)
        }
        Command::Completions(_) | Command::SelfUpdate => unreachable!("handled above"),
    }
}

/// 0 on success, 1 for user/logic errors, 2 when at least one package hit a
/// VCS or I/O failure.
fn exit_for(failures: usize, rejected_declarations: usize) -> ExitCode {
    if failures > 0 {
        ExitCode::from(2)
    } else if rejected_declarations > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn report_load(outcome: &LoadOutcome) {
    info!(
        "installed {}, loaded {} package(s)",
        outcome.installed.len(),
        outcome.loaded.len()
    );
    if !outcome.failed.is_empty() {
        let names: Vec<&str> = outcome.failed.iter().map(|(name, _)| name.as_str()).collect();
        error!(
            "{} package(s) failed: {}",
            outcome.failed.len(),
            names.join(", ")
        );
    }
}

fn report_update(outcome: &UpdateOutcome) {
    for update in &outcome.updated {
        println!(
            "updated {}: {} -> {}",
            update.name,
            short(&update.old_commit),
            short(&update.new_commit)
        );
    }
    if outcome.updated.is_empty() && outcome.failed.is_empty() {
        println!("everything up to date");
    }
    if !outcome.failed.is_empty() {
        let names: Vec<&str> = outcome.failed.iter().map(|(name, _)| name.as_str()).collect();
        error!(
            "{} package(s) failed to update: {}",
            outcome.failed.len(),
            names.join(", ")
        );
    }
}

fn report_self_update(outcome: SelfUpdate) {
    match outcome {
        SelfUpdate::NotARepo(dir) => {
            warn!("{dir} is not a git checkout; update shellpack through your package manager");
        }
        SelfUpdate::UpToDate => println!("shellpack is up to date"),
        SelfUpdate::Updated {
            old_commit,
            new_commit,
        } => println!("updated shellpack: {} -> {}", short(&old_commit), short(&new_commit)),
    }
}

fn print_list(entries: &[ListEntry]) {
    for entry in entries {
        let kind = if entry.local { "local" } else { "remote" };
        println!(
            "{:<24} {:<7} {:<10} {:<20} {}",
            entry.name,
            kind,
            state_label(entry.state),
            entry.ref_spec,
            entry.source
        );
    }
}

fn state_label(state: PackageState) -> &'static str {
    match state {
        PackageState::Disabled => "disabled",
        PackageState::Missing => "missing",
        PackageState::Installed => "installed",
    }
}

fn print_info(info: &PackageInfo) {
    println!("name:      {}", info.package.name);
    println!("source:    {}", info.package.source);
    println!("path:      {}", info.package.path);
    println!("kind:      {}", if info.package.local { "local" } else { "remote" });
    println!("ref:       {}", info.package.ref_spec);
    println!("load:      {:?}", info.package.load_mode);
    if info.package.disabled {
        println!("disabled:  true");
    }
    if let Some(commit) = &info.commit {
        println!("commit:    {commit}");
    }
    if let Some(locked) = &info.locked {
        println!(
            "locked:    {} (frozen {})",
            locked.commit,
            format_timestamp(locked.timestamp)
        );
    }
    if !info.config.depends.is_empty() {
        println!("depends:   {}", info.config.depends.join(" "));
    }
    if !info.config.env.is_empty() {
        let env: Vec<String> = info
            .config
            .env
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        println!("env:       {}", env.join(" "));
    }
}

fn print_diff(entries: &[DriftEntry]) {
    if entries.iter().all(|e| e.state == DriftState::Unchanged) {
        println!("lockfile and working trees are in sync");
        return;
    }
    for entry in entries {
        match entry.state {
            DriftState::Unchanged => {}
            DriftState::Drifted => println!(
                "{}: drifted ({} locked, {} on disk)",
                entry.name,
                short_opt(&entry.locked_commit),
                short_opt(&entry.current_commit)
            ),
            DriftState::Missing => println!("{}: missing on disk", entry.name),
            DriftState::Untracked => println!("{}: on disk but not in the lockfile", entry.name),
        }
    }
}

fn print_findings(findings: &[Finding]) {
    if findings.is_empty() {
        println!("no problems found");
        return;
    }
    for finding in findings {
        match &finding.package {
            Some(package) => println!("{package}: {}", finding.problem),
            None => println!("{}", finding.problem),
        }
    }
}

fn short(commit: &str) -> &str {
    commit.get(..7).unwrap_or(commit)
}

fn short_opt(commit: &Option<String>) -> &str {
    commit.as_deref().map(short).unwrap_or("?")
}

fn format_timestamp(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|datetime| datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}
