use anyhow::Context;
use tracing::info;

use crate::manager::Manager;

/// Delete a remote package's working tree and evict it from the registry.
///
/// Local packages are declared, not managed, so their trees are never
/// touched. As a guard, nothing outside the managed packages directory is
/// ever deleted.
pub fn remove(manager: &mut Manager, name: &str) -> anyhow::Result<()> {
    let (package, _) = manager
        .registry
        .lookup(name)
        .with_context(|| format!("unknown package `{name}`"))?;
    anyhow::ensure!(
        package.is_remote(),
        "{name} is a local package; its directory {} is not managed by shellpack",
        package.path
    );
    let path = package.path.clone();
    anyhow::ensure!(
        manager.dirs.is_managed(&path),
        "refusing to delete {path}: outside the managed packages directory"
    );
    if path.exists() {
        fs_err::remove_dir_all(path.as_std_path())
            .with_context(|| format!("cannot delete {path}"))?;
        info!("deleted {path}");
    }
    manager.registry.evict(name);
    Ok(())
}
