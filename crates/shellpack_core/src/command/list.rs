use serde::Serialize;

use crate::manager::Manager;
use crate::package::LoadMode;
use crate::registry::PackageFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageState {
    Disabled,
    Missing,
    Installed,
}

/// One row of `list` output.
#[derive(Debug, Clone, Serialize)]
pub struct ListEntry {
    pub name: String,
    pub source: String,
    pub local: bool,
    pub ref_spec: String,
    pub load_mode: LoadMode,
    pub state: PackageState,
}

/// Every declared package, in load order when resolved.
pub fn list(manager: &Manager) -> Vec<ListEntry> {
    manager
        .registry
        .names(PackageFilter::All)
        .iter()
        .filter_map(|name| manager.registry.lookup(name))
        .map(|(package, _)| {
            let state = if package.disabled {
                PackageState::Disabled
            } else if package.is_installed() {
                PackageState::Installed
            } else {
                PackageState::Missing
            };
            ListEntry {
                name: package.name.clone(),
                source: package.source.clone(),
                local: package.local,
                ref_spec: package.ref_spec.to_string(),
                load_mode: package.load_mode,
                state,
            }
        })
        .collect()
}
