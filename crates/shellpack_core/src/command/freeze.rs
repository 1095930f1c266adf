use std::time::{SystemTime, UNIX_EPOCH};

use git_cmd::Repo;
use tracing::{error, info};

use crate::lockfile::{LockedPackage, Lockfile};
use crate::manager::Manager;
use crate::registry::PackageFilter;

#[derive(Debug, Default)]
pub struct FreezeOutcome {
    pub lockfile: Lockfile,
    pub failed: Vec<(String, String)>,
}

impl FreezeOutcome {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Pin the current revision of every enabled, installed, remote package and
/// write the lockfile. A package whose revision can't be read is reported
/// and left out; the rest is still written.
pub fn freeze(manager: &Manager) -> anyhow::Result<FreezeOutcome> {
    let mut outcome = FreezeOutcome::default();
    let timestamp = unix_timestamp();

    for name in manager.registry.names(PackageFilter::InstalledEnabled) {
        let Some((package, _)) = manager.registry.lookup(&name) else {
            continue;
        };
        if !package.is_remote() {
            continue;
        }
        match Repo::new(&package.path).and_then(|repo| repo.current_commit()) {
            Ok(commit) => outcome.lockfile.packages.push(LockedPackage {
                name,
                source: package.source.clone(),
                commit,
                timestamp,
            }),
            Err(e) => {
                error!("cannot freeze {name}: {e:#}");
                outcome.failed.push((name, format!("{e:#}")));
            }
        }
    }

    outcome.lockfile.packages.sort_by(|a, b| a.name.cmp(&b.name));
    let path = manager.dirs.lockfile_path();
    outcome.lockfile.write(&path)?;
    info!(
        "froze {} package(s) to {path}",
        outcome.lockfile.packages.len()
    );
    Ok(outcome)
}

fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
