//! Ties the registry, the hook bus and the directory layout together.

use tracing::debug;

use crate::hooks::{self, Hooks};
use crate::ingest::{self, IngestReport};
use crate::paths::Dirs;
use crate::registry::{Declaration, Registry};
use crate::resolve;

#[derive(Debug)]
pub struct Manager {
    pub dirs: Dirs,
    pub registry: Registry,
    pub hooks: Hooks,
}

impl Manager {
    pub fn new(dirs: Dirs) -> Self {
        Self {
            dirs,
            registry: Registry::new(),
            hooks: Hooks::new(),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(Dirs::from_env()?))
    }

    /// Populate the registry from all configuration layers.
    pub fn ingest(&mut self) -> anyhow::Result<IngestReport> {
        let report = ingest::ingest_all(self)?;
        debug!(
            "ingested {} declarations ({} rejected)",
            report.declared, report.rejected
        );
        Ok(report)
    }

    pub fn declare(&mut self, declaration: &Declaration) -> anyhow::Result<String> {
        self.registry.declare(&self.dirs, declaration)
    }

    /// Disable a package at runtime. Returns false for unknown names.
    pub fn disable(&mut self, name: &str) -> bool {
        let disabled = self.registry.disable(name);
        if disabled {
            self.hooks.fire(hooks::PACKAGE_DISABLED, Some(name));
        }
        disabled
    }

    /// Compute and store the load order. Fails with a downcastable
    /// [`resolve::CycleError`] when the dependency graph has a cycle.
    pub fn resolve(&mut self) -> anyhow::Result<()> {
        self.hooks.fire(hooks::PRE_RESOLVE, None);
        let order = resolve::resolve(&self.registry)?;
        self.registry.set_load_order(order);
        self.hooks.fire(hooks::POST_RESOLVE, None);
        Ok(())
    }
}
