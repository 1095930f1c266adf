use anyhow::Context;
use git_cmd::Repo;
use serde::Serialize;

use crate::lockfile::{LockedPackage, Lockfile};
use crate::manager::Manager;
use crate::package::{Package, PackageConfig};

/// Everything known about one package: the declaration, the configuration,
/// the working tree revision and the pinned lockfile entry.
#[derive(Debug, Serialize)]
pub struct PackageInfo {
    #[serde(flatten)]
    pub package: Package,
    pub config: PackageConfig,
    /// Commit the working tree is currently at, when installed.
    pub commit: Option<String>,
    pub locked: Option<LockedPackage>,
}

pub fn info(manager: &Manager, name: &str) -> anyhow::Result<PackageInfo> {
    let (package, config) = manager
        .registry
        .lookup(name)
        .with_context(|| format!("unknown package `{name}`"))?;

    let commit = package
        .is_installed()
        .then(|| Repo::new(&package.path).and_then(|repo| repo.current_commit()))
        .transpose()
        .unwrap_or_default();

    let locked = Lockfile::read(&manager.dirs.lockfile_path())
        .ok()
        .and_then(|lockfile| lockfile.get(name).cloned());

    Ok(PackageInfo {
        package: package.clone(),
        config: config.clone(),
        commit,
        locked,
    })
}
