use anyhow::Context;
use git_cmd::Repo;
use serde::Serialize;

use crate::lockfile::Lockfile;
use crate::manager::Manager;
use crate::registry::PackageFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftState {
    /// Working tree matches the pinned commit.
    Unchanged,
    /// Working tree is at a different commit than the lockfile records.
    Drifted,
    /// Pinned in the lockfile but absent on disk.
    Missing,
    /// Installed and enabled but not pinned in the lockfile.
    Untracked,
}

#[derive(Debug, Clone, Serialize)]
pub struct DriftEntry {
    pub name: String,
    pub state: DriftState,
    pub locked_commit: Option<String>,
    pub current_commit: Option<String>,
}

/// Compare the lockfile against the working trees on disk.
pub fn diff(manager: &Manager) -> anyhow::Result<Vec<DriftEntry>> {
    let lockfile = Lockfile::read(&manager.dirs.lockfile_path())
        .context("cannot diff without a lockfile; run `freeze` first")?;

    let mut entries = vec![];
    for locked in &lockfile.packages {
        let path = manager.dirs.package_path(&locked.name);
        let current = path
            .join(".git")
            .exists()
            .then(|| Repo::new(&path).and_then(|repo| repo.current_commit()).ok())
            .flatten();
        let state = match &current {
            None => DriftState::Missing,
            Some(commit) if *commit == locked.commit => DriftState::Unchanged,
            Some(_) => DriftState::Drifted,
        };
        entries.push(DriftEntry {
            name: locked.name.clone(),
            state,
            locked_commit: Some(locked.commit.clone()),
            current_commit: current,
        });
    }

    for name in manager.registry.names(PackageFilter::InstalledEnabled) {
        let Some((package, _)) = manager.registry.lookup(&name) else {
            continue;
        };
        if !package.is_remote() || lockfile.contains(&name) {
            continue;
        }
        let current = Repo::new(&package.path)
            .and_then(|repo| repo.current_commit())
            .ok();
        entries.push(DriftEntry {
            name,
            state: DriftState::Untracked,
            locked_commit: None,
            current_commit: current,
        });
    }
    Ok(entries)
}
