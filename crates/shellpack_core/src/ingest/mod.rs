//! Read package declarations from the configuration layers.
//!
//! Three layers feed the registry, in order: the user's config script, the
//! directory-per-package tree, and the aggregated `pkgs.d` scripts. Later
//! layers overwrite earlier ones, name by name.

mod aggregate;
mod script;
mod tree;

pub use aggregate::ingest_pkgs_d;
pub use script::{ingest_script, ingest_script_file};
pub use tree::ingest_tree;

use crate::manager::Manager;

/// How many declarations each run accepted and rejected. Rejections are
/// already reported on stderr; the count decides the exit code.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub declared: usize,
    pub rejected: usize,
}

impl IngestReport {
    pub fn absorb(&mut self, other: IngestReport) {
        self.declared += other.declared;
        self.rejected += other.rejected;
    }
}

/// Run every configuration layer against the registry.
pub fn ingest_all(manager: &mut Manager) -> anyhow::Result<IngestReport> {
    let mut report = IngestReport::default();
    let config_script = manager.dirs.config_script();
    report.absorb(ingest_script_file(manager, &config_script)?);
    report.absorb(ingest_tree(manager)?);
    report.absorb(ingest_pkgs_d(manager)?);
    Ok(report)
}
