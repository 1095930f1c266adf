use anyhow::Context;

use crate::loader::{self, LoadOutcome};
use crate::manager::Manager;
use crate::session::HostSession;

/// Install missing packages and apply their configuration to `session`,
/// either the whole declared set or just `name`.
pub async fn install(
    manager: &mut Manager,
    session: &mut dyn HostSession,
    name: Option<&str>,
) -> anyhow::Result<LoadOutcome> {
    if let Some(name) = name {
        manager
            .registry
            .lookup(name)
            .with_context(|| format!("unknown package `{name}`"))?;
    }
    manager.resolve()?;
    loader::load_packages(manager, session, name).await
}
