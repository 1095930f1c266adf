//! The aggregation layer: every script under `pkgs.d/` with the configured
//! shell suffix runs as an additional script layer, in filename order.

use itertools::Itertools;

use super::{IngestReport, script::ingest_script};
use crate::fs_utils;
use crate::manager::Manager;

pub fn ingest_pkgs_d(manager: &mut Manager) -> anyhow::Result<IngestReport> {
    let root = manager.dirs.pkgs_d_dir();
    let mut report = IngestReport::default();
    if !root.is_dir() {
        return Ok(report);
    }
    let suffix = manager.dirs.shell_suffix.clone();
    let scripts = fs_err::read_dir(root.as_std_path())?
        .filter_map(Result::ok)
        .map(|entry| fs_utils::to_utf8_pathbuf(entry.path()))
        .try_collect::<_, Vec<_>, _>()?
        .into_iter()
        .filter(|path| path.is_file() && path.extension() == Some(suffix.as_str()))
        .sorted()
        .collect::<Vec<_>>();
    for script in scripts {
        let text = fs_err::read_to_string(script.as_std_path())?;
        report.absorb(ingest_script(manager, &text, script.as_str()));
    }
    Ok(report)
}
