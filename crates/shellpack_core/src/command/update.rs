//! Bring installed working trees up to date with their remotes.

use anyhow::Context;
use git_cmd::Repo;
use tracing::{error, info, instrument};

use crate::install;
use crate::manager::Manager;
use crate::package::{Package, RefSpec};
use crate::pool::TaskPool;
use crate::registry::PackageFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatedPackage {
    pub name: String,
    pub old_commit: String,
    pub new_commit: String,
}

#[derive(Debug, Default)]
pub struct UpdateOutcome {
    pub updated: Vec<UpdatedPackage>,
    pub unchanged: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl UpdateOutcome {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Update every installed package (or just `name`). Fetches fan out in
/// parallel, keyed by package name; results drain in load order.
///
/// Remote packages fetch from their origin; local packages take part only
/// when a `url` override lets the tree track an upstream. A revision change
/// re-runs the package's build snippet.
#[instrument(skip(manager))]
pub async fn update(manager: &Manager, name: Option<&str>) -> anyhow::Result<UpdateOutcome> {
    let candidates = update_candidates(manager, name)?;
    let mut pool: TaskPool<anyhow::Result<(String, String)>> = TaskPool::new();
    let mut outcome = UpdateOutcome::default();

    for package in &candidates {
        let task_package = package.clone();
        pool.defer(&package.name, move || update_working_tree(&task_package));
    }

    for package in &candidates {
        let name = package.name.clone();
        let Some(pending) = pool.take(&name) else {
            continue;
        };
        match pending.await {
            Ok(Ok((old_commit, new_commit))) => {
                if old_commit == new_commit {
                    outcome.unchanged.push(name);
                    continue;
                }
                info!("updated {name}: {} -> {}", &old_commit[..7], &new_commit[..7]);
                if let Err(e) = install::run_build(package) {
                    error!("{e:#}");
                    outcome.failed.push((name.clone(), format!("{e:#}")));
                }
                outcome.updated.push(UpdatedPackage {
                    name,
                    old_commit,
                    new_commit,
                });
            }
            Ok(Err(e)) => {
                error!("cannot update {name}: {e:#}");
                outcome.failed.push((name, format!("{e:#}")));
            }
            Err(e) => {
                error!("update task for {name} died: {e}");
                outcome.failed.push((name, e.to_string()));
            }
        }
    }
    Ok(outcome)
}

fn update_candidates(manager: &Manager, only: Option<&str>) -> anyhow::Result<Vec<Package>> {
    let names = match only {
        Some(name) => {
            manager
                .registry
                .lookup(name)
                .with_context(|| format!("unknown package `{name}`"))?;
            vec![name.to_string()]
        }
        None => manager.registry.names(PackageFilter::InstalledEnabled),
    };
    Ok(names
        .iter()
        .filter_map(|name| manager.registry.lookup(name))
        .map(|(package, _)| package.clone())
        .filter(|package| {
            package.is_installed() && (package.is_remote() || package.url_override.is_some())
        })
        .collect())
}

/// Fetch and fast-forward one working tree, honoring the declared ref.
/// Returns the commits before and after.
fn update_working_tree(package: &Package) -> anyhow::Result<(String, String)> {
    let repo = Repo::new(&package.path)?;
    let old_commit = repo.current_commit()?;

    if package.local {
        let url = package
            .url_override
            .as_deref()
            .context("local package has no url override to update from")?;
        repo.git(&["pull", "--ff-only", url])?;
    } else {
        repo.fetch()?;
        match &package.ref_spec {
            RefSpec::Commit(commit) => repo.checkout(commit)?,
            RefSpec::Tag(tag) => repo.checkout(tag)?,
            RefSpec::Branch(branch) => {
                repo.checkout(branch)?;
                repo.git(&["merge", "--ff-only", &format!("origin/{branch}")])?;
            }
            RefSpec::None => {
                repo.git(&["pull", "--ff-only"])?;
            }
        }
    }

    let new_commit = repo.current_commit()?;
    Ok((old_commit, new_commit))
}
