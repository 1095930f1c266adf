//! Clone a package working tree and run its build snippet.
//!
//! Clone tasks run on pool workers, so everything here is synchronous and
//! self-contained: the task owns its [`CloneRequest`] and touches only the
//! destination directory.

use std::process::Command;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use git_cmd::git_in_dir;
use tracing::{debug, warn};

use crate::apply::snippet_env;
use crate::package::{Package, RefSpec};
use crate::paths::Dirs;

/// Everything a worker needs to produce a working tree at `dest`.
#[derive(Debug, Clone)]
pub struct CloneRequest {
    pub name: String,
    pub source: String,
    pub dest: Utf8PathBuf,
    pub ref_spec: RefSpec,
    /// Whether `dest` is under the managed packages directory. Partial
    /// checkouts are only deleted when it is.
    pub managed: bool,
}

impl CloneRequest {
    pub fn for_package(package: &Package, dirs: &Dirs) -> Self {
        Self {
            name: package.name.clone(),
            source: package.source.clone(),
            dest: package.path.clone(),
            ref_spec: package.ref_spec.clone(),
            managed: dirs.is_managed(&package.path),
        }
    }
}

/// Ensure a working tree exists at `request.dest` matching the requested
/// revision. If a checkout is already there, succeed without touching the
/// network. Errors carry git's message verbatim.
pub fn clone_package(request: &CloneRequest) -> anyhow::Result<()> {
    if request.dest.join(".git").exists() {
        debug!("{} already checked out at {}", request.name, request.dest);
        return Ok(());
    }
    let parent = request
        .dest
        .parent()
        .with_context(|| format!("clone destination {} has no parent", request.dest))?;
    fs_err::create_dir_all(parent.as_std_path())?;

    match &request.ref_spec {
        // A shallow clone can't reach an arbitrary commit.
        RefSpec::Commit(commit) => {
            git_in_dir(parent, &["clone", &request.source, request.dest.as_str()])
                .with_context(|| format!("cannot clone {}", request.source))?;
            git_in_dir(&request.dest, &["checkout", commit])
                .with_context(|| format!("cannot checkout commit {commit}"))?;
        }
        RefSpec::Tag(reference) | RefSpec::Branch(reference) => {
            if let Err(e) = shallow_clone(request, parent, Some(reference)) {
                warn!(
                    "{}: ref {reference} not cloneable directly ({e}); retrying with the default branch",
                    request.name
                );
                discard_partial_checkout(request);
                shallow_clone(request, parent, None)?;
            }
        }
        RefSpec::None => shallow_clone(request, parent, None)?,
    }
    Ok(())
}

fn shallow_clone(
    request: &CloneRequest,
    parent: &Utf8Path,
    reference: Option<&str>,
) -> anyhow::Result<()> {
    let mut args = vec!["clone", "--depth", "1", "--single-branch"];
    if let Some(reference) = reference {
        args.extend(["--branch", reference]);
    }
    args.extend([request.source.as_str(), request.dest.as_str()]);
    git_in_dir(parent, &args).with_context(|| format!("cannot clone {}", request.source))?;
    Ok(())
}

/// A failed ref clone may leave a partial directory behind. Delete it, but
/// never outside the managed packages directory.
fn discard_partial_checkout(request: &CloneRequest) {
    if !request.managed || !request.dest.exists() {
        return;
    }
    if let Err(e) = fs_err::remove_dir_all(request.dest.as_std_path()) {
        warn!("cannot remove partial checkout {}: {e}", request.dest);
    }
}

/// Run the package's build snippet in its working tree, with `PKG_DIR` and
/// `PKG_NAME` exported.
pub fn run_build(package: &Package) -> anyhow::Result<()> {
    let Some(build) = &package.build else {
        return Ok(());
    };
    debug!("running build snippet for {}", package.name);
    let output = Command::new("sh")
        .arg("-c")
        .arg(build)
        .current_dir(package.path.as_std_path())
        .envs(snippet_env(package))
        .output()
        .with_context(|| format!("cannot run build snippet for {}", package.name))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "build snippet for {} exited with {}: {}",
            package.name,
            output.status,
            stderr.trim()
        );
    }
    Ok(())
}
