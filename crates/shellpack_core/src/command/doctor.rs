use itertools::Itertools;
use serde::Serialize;

use crate::command::diff::{self, DriftState};
use crate::fs_utils;
use crate::manager::Manager;
use crate::package::split_dependency;
use crate::registry::PackageFilter;

/// One problem `doctor` spotted. Findings are advisory; doctor never
/// mutates anything.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub package: Option<String>,
    pub problem: String,
}

impl Finding {
    fn package(name: &str, problem: impl Into<String>) -> Self {
        Self {
            package: Some(name.to_string()),
            problem: problem.into(),
        }
    }
}

/// Diagnose common problems: missing working trees, dangling dependency
/// edges, lockfile drift and orphaned directories nobody declares.
pub fn doctor(manager: &Manager) -> anyhow::Result<Vec<Finding>> {
    let mut findings = vec![];

    for name in manager.registry.names(PackageFilter::Enabled) {
        let Some((package, config)) = manager.registry.lookup(&name) else {
            continue;
        };
        if !package.is_installed() {
            let hint = if package.is_remote() {
                "not installed; run `shellpack install`"
            } else {
                "local path does not exist"
            };
            findings.push(Finding::package(&name, hint));
        }
        for spec in &config.depends {
            let (dependency, constraint) = split_dependency(spec);
            match manager.registry.lookup(dependency) {
                None => findings.push(Finding::package(
                    &name,
                    format!("depends on {dependency}, which is not declared"),
                )),
                Some((dep_package, _)) if dep_package.disabled => findings.push(
                    Finding::package(&name, format!("depends on {dependency}, which is disabled")),
                ),
                Some((dep_package, _)) => {
                    if let (Some(want), Some(tag)) = (constraint, dep_package.ref_spec.tag())
                        && want != tag
                    {
                        findings.push(Finding::package(
                            &name,
                            format!("wants {dependency}@{want} but {dependency} is declared with tag={tag}"),
                        ));
                    }
                }
            }
        }
    }

    findings.extend(orphaned_directories(manager)?);

    if manager.dirs.lockfile_path().is_file() {
        for entry in diff::diff(manager)? {
            let problem = match entry.state {
                DriftState::Unchanged => continue,
                DriftState::Drifted => "working tree drifted from the lockfile",
                DriftState::Missing => "pinned in the lockfile but missing on disk",
                DriftState::Untracked => "installed but not pinned; run `shellpack freeze`",
            };
            findings.push(Finding::package(&entry.name, problem));
        }
    }
    Ok(findings)
}

/// Directories under the managed packages dir that no declaration covers.
fn orphaned_directories(manager: &Manager) -> anyhow::Result<Vec<Finding>> {
    let packages_dir = manager.dirs.packages_dir();
    if !packages_dir.is_dir() {
        return Ok(vec![]);
    }
    Ok(fs_err::read_dir(packages_dir.as_std_path())?
        .filter_map(Result::ok)
        .map(|entry| fs_utils::to_utf8_pathbuf(entry.path()))
        .try_collect::<_, Vec<_>, _>()?
        .into_iter()
        .filter(|path| path.is_dir())
        .filter_map(|path| path.file_name().map(ToString::to_string))
        .sorted()
        .filter(|name| !manager.registry.contains(name))
        .map(|name| {
            Finding::package(
                &name,
                "directory exists but no declaration covers it; remove?",
            )
        })
        .collect())
}
