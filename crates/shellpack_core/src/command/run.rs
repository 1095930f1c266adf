use std::process::Command;

use anyhow::Context;

use crate::apply::{PKG_DIR_VAR, snippet_env};
use crate::manager::Manager;

/// Run a command inside a package's working tree (or the packages root),
/// with `PKG_DIR` and `PKG_NAME` exported. Returns the command's exit code.
pub fn run_in_package(
    manager: &Manager,
    package: Option<&str>,
    command: &[String],
) -> anyhow::Result<i32> {
    let (program, args) = command
        .split_first()
        .context("missing command to run")?;

    let (dir, env) = match package {
        Some(name) => {
            let (package, _) = manager
                .registry
                .lookup(name)
                .with_context(|| format!("unknown package `{name}`"))?;
            anyhow::ensure!(
                package.path.is_dir(),
                "package directory missing for {name}: {}",
                package.path
            );
            (package.path.clone(), snippet_env(package))
        }
        None => {
            let dir = manager.dirs.packages_dir();
            let env = vec![(PKG_DIR_VAR.to_string(), dir.to_string())];
            (dir, env)
        }
    };

    let status = Command::new(program)
        .args(args)
        .current_dir(dir.as_std_path())
        .envs(env)
        .status()
        .with_context(|| format!("cannot run `{program}`"))?;
    Ok(status.code().unwrap_or(1))
}
