//! The two-pass install/load pipeline.
//!
//! Pass 1 walks the load order and fans out a clone task for every missing
//! remote package. Pass 2 walks the order again, draining each package's
//! clone result before applying its configuration, so a dependent always
//! sees its dependencies' effects already in place.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, error, instrument, warn};

use crate::apply;
use crate::hooks;
use crate::install::{self, CloneRequest};
use crate::manager::Manager;
use crate::package::{LoadMode, Package};
use crate::pool::TaskPool;
use crate::session::HostSession;

/// What the pipeline did. `failed` decides the exit code; everything else
/// is reporting.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub loaded: Vec<String>,
    /// Packages freshly cloned during this run.
    pub installed: Vec<String>,
    /// Per-package failures, with the underlying error message.
    pub failed: Vec<(String, String)>,
    /// Candidates skipped because their directory is absent.
    pub missing: Vec<String>,
}

impl LoadOutcome {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run the pipeline over the resolved load order. With `only`, every other
/// package is left untouched.
///
/// Precondition: [`Manager::resolve`] has populated the load order.
#[instrument(skip_all)]
pub async fn load_packages(
    manager: &mut Manager,
    session: &mut dyn HostSession,
    only: Option<&str>,
) -> anyhow::Result<LoadOutcome> {
    let order = manager.registry.load_order().to_vec();
    let mut pool: TaskPool<anyhow::Result<()>> = TaskPool::new();
    let mut outcome = LoadOutcome::default();

    // Pass 1: fan out clones for missing remote packages. No results are
    // read here; the workers run while the coordinator keeps iterating.
    for name in &order {
        let Some(package) = candidate(manager, name, only) else {
            continue;
        };
        if package.is_remote() && !package.path.exists() {
            manager.hooks.fire(hooks::PRE_INSTALL, Some(name.as_str()));
            let request = CloneRequest::for_package(&package, &manager.dirs);
            pool.defer(name, move || install::clone_package(&request));
        }
    }
    debug!("{} clone task(s) in flight", pool.len());

    // Pass 2: drain results in dependency order and apply configuration.
    for name in &order {
        let Some(package) = candidate(manager, name, only) else {
            continue;
        };
        if let Some(pending) = pool.take(name) {
            match pending.await {
                Ok(Ok(())) => {
                    manager.hooks.fire(hooks::POST_INSTALL, Some(name.as_str()));
                    outcome.installed.push(name.clone());
                    if let Err(e) = install::run_build(&package) {
                        error!("{e:#}");
                        outcome.failed.push((name.clone(), format!("{e:#}")));
                    }
                }
                Ok(Err(e)) => {
                    error!("cannot install {name}: {e:#}");
                    outcome.failed.push((name.clone(), format!("{e:#}")));
                    continue;
                }
                Err(e) => {
                    error!("clone task for {name} died: {e}");
                    outcome.failed.push((name.clone(), e.to_string()));
                    continue;
                }
            }
        } else if !package.path.exists() {
            warn!("package directory missing for {name}: {}", package.path);
            outcome.missing.push(name.clone());
            continue;
        }

        load_one(manager, session, &package);
        manager.registry.mark_loaded(name);
        outcome.loaded.push(name.clone());
    }

    manager.hooks.fire(hooks::READY, None);
    Ok(outcome)
}

/// A package takes part in the pipeline when it is selected, declared,
/// enabled, not yet loaded and not `load=manual`.
fn candidate(manager: &Manager, name: &str, only: Option<&str>) -> Option<Package> {
    if only.is_some_and(|o| o != name) {
        return None;
    }
    if manager.registry.is_loaded(name) {
        return None;
    }
    let (package, _) = manager.registry.lookup(name)?;
    if package.disabled || package.load_mode == LoadMode::Manual {
        return None;
    }
    Some(package.clone())
}

/// Apply one package's configuration: env, path, alias and fpath in that
/// order, then the entry point, then the rc snippet.
fn load_one(manager: &Manager, session: &mut dyn HostSession, package: &Package) {
    let name = package.name.as_str();
    let Some((_, config)) = manager.registry.lookup(name) else {
        return;
    };
    let suffix = manager.dirs.shell_suffix.as_str();

    apply::apply_env(config, session);
    apply::apply_paths(package, config, session);
    apply::apply_aliases(config, session);
    apply::apply_fpaths(package, config, session, suffix);

    manager.hooks.fire(hooks::PRE_LOAD, Some(name));
    if package.load_mode == LoadMode::Now {
        match find_entry(package, suffix) {
            Some(entry) => session.source_script(&entry),
            None => warn!("no entry point found for {name}; nothing to source"),
        }
    }
    apply::apply_rc(package, config, session);
    manager.hooks.fire(hooks::POST_LOAD, Some(name));
}

/// Locate the file sourced when a package loads: the declared override if
/// any, else the first of `init.<suffix>`, `plugin.<suffix>`,
/// `<name>.<suffix>` that exists.
fn find_entry(package: &Package, suffix: &str) -> Option<Utf8PathBuf> {
    if let Some(entry) = &package.entry_override {
        let entry = Utf8Path::new(entry);
        let resolved = if entry.is_absolute() {
            if !entry.starts_with(&package.path) {
                warn!(
                    "{}: entry point {entry} is outside the package directory",
                    package.name
                );
            }
            entry.to_path_buf()
        } else {
            package.path.join(entry)
        };
        return resolved.is_file().then_some(resolved);
    }
    [
        format!("init.{suffix}"),
        format!("plugin.{suffix}"),
        format!("{}.{suffix}", package.name),
    ]
    .into_iter()
    .map(|candidate| package.path.join(candidate))
    .find(|path| path.is_file())
}
