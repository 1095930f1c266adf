//! The filesystem configuration layer: one directory per package.
//!
//! Each file is a scalar field, each subdirectory an array field:
//!
//! ```text
//! packages/
//!   fzf/
//!     source        # required: the package identifier
//!     tag           # scalar fields, one value per file
//!     env/          # key-value dirs: entry name is the key,
//!       FZF_BASE    # first line of the file is the value
//!     depends/      # entry name is the dependency; a non-empty first
//!       zsh-utils   # line is the version constraint
//!     path/         # value dirs: entry names are the values
//!       bin
//! ```

use anyhow::Context;
use camino::Utf8Path;
use itertools::Itertools;
use tracing::{error, warn};

use super::IngestReport;
use crate::fs_utils;
use crate::manager::Manager;
use crate::registry::{Declaration, FieldValue};

const SCALAR_FIELDS: [&str; 10] = [
    "branch",
    "tag",
    "commit",
    "as",
    "local",
    "load",
    "build",
    "disabled",
    "source_file",
    "url",
];
/// Multi-line scalar fields keep their full contents.
const SNIPPET_FIELDS: [&str; 1] = ["rc"];
const VALUE_DIRS: [&str; 2] = ["path", "fpath"];
const KEY_VALUE_DIRS: [&str; 2] = ["alias", "env"];

/// Ingest every package directory under the filesystem layout root.
pub fn ingest_tree(manager: &mut Manager) -> anyhow::Result<IngestReport> {
    let root = manager.dirs.packages_config_dir();
    let mut report = IngestReport::default();
    if !root.is_dir() {
        return Ok(report);
    }
    for package_dir in sorted_entries(&root)? {
        if !package_dir.is_dir() {
            continue;
        }
        match read_declaration(&package_dir) {
            Ok(Some(declaration)) => match manager.declare(&declaration) {
                Ok(_) => report.declared += 1,
                Err(e) => {
                    error!("{package_dir}: {e:#}");
                    report.rejected += 1;
                }
            },
            Ok(None) => report.rejected += 1,
            Err(e) => {
                error!("{package_dir}: {e:#}");
                report.rejected += 1;
            }
        }
    }
    Ok(report)
}

fn read_declaration(package_dir: &Utf8Path) -> anyhow::Result<Option<Declaration>> {
    let dir_name = package_dir
        .file_name()
        .context("package directory has no name")?;
    let source_file = package_dir.join("source");
    if !source_file.is_file() {
        error!("{package_dir}: missing required `source` file; package skipped");
        return Ok(None);
    }
    let id = first_line(&source_file)?;

    // The directory name is the package name unless an `as` file overrides
    // it later on.
    let mut declaration = Declaration::new(id).scalar("as", dir_name);

    for entry in sorted_entries(package_dir)? {
        let Some(name) = entry.file_name() else {
            continue;
        };
        if name == "source" || name.starts_with('.') {
            continue;
        }
        if entry.is_file() {
            if SNIPPET_FIELDS.contains(&name) {
                let text = fs_err::read_to_string(entry.as_std_path())?;
                declaration = declaration.scalar(name, text.trim_end());
            } else if SCALAR_FIELDS.contains(&name) {
                declaration = declaration.scalar(name, &first_line(&entry)?);
            } else {
                warn!("{package_dir}: unknown field file `{name}` ignored");
            }
        } else if entry.is_dir() {
            let values = if VALUE_DIRS.contains(&name) {
                entry_names(&entry)?
            } else if name == "depends" {
                dependency_entries(&entry)?
            } else if KEY_VALUE_DIRS.contains(&name) {
                key_value_entries(&entry)?
            } else {
                warn!("{package_dir}: unknown field directory `{name}` ignored");
                continue;
            };
            declaration
                .fields
                .push((name.to_string(), FieldValue::Array(values)));
        }
    }
    Ok(Some(declaration))
}

/// Entry names are the values; file contents are ignored.
fn entry_names(dir: &Utf8Path) -> anyhow::Result<Vec<String>> {
    Ok(sorted_entries(dir)?
        .into_iter()
        .filter_map(|entry| entry.file_name().map(ToString::to_string))
        .filter(|name| !name.starts_with('.'))
        .collect())
}

/// `depends/` entries: the entry name is the dependency, a non-empty first
/// line is the constraint, joined as `name@constraint`.
fn dependency_entries(dir: &Utf8Path) -> anyhow::Result<Vec<String>> {
    let mut specs = vec![];
    for entry in sorted_entries(dir)? {
        let Some(name) = entry.file_name() else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let constraint = if entry.is_file() {
            first_line(&entry)?
        } else {
            String::new()
        };
        if constraint.is_empty() {
            specs.push(name.to_string());
        } else {
            specs.push(format!("{name}@{constraint}"));
        }
    }
    Ok(specs)
}

/// `alias/` and `env/` entries: the entry name is the key, the first line of
/// the file is the value.
fn key_value_entries(dir: &Utf8Path) -> anyhow::Result<Vec<String>> {
    let mut pairs = vec![];
    for entry in sorted_entries(dir)? {
        let Some(name) = entry.file_name() else {
            continue;
        };
        if name.starts_with('.') || !entry.is_file() {
            continue;
        }
        let value = first_line(&entry)?;
        pairs.push(format!("{name}={value}"));
    }
    Ok(pairs)
}

fn first_line(path: &Utf8Path) -> anyhow::Result<String> {
    let text = fs_err::read_to_string(path.as_std_path())?;
    Ok(text.lines().next().unwrap_or_default().trim().to_string())
}

fn sorted_entries(dir: &Utf8Path) -> anyhow::Result<Vec<camino::Utf8PathBuf>> {
    Ok(fs_err::read_dir(dir.as_std_path())?
        .filter_map(Result::ok)
        .map(|entry| fs_utils::to_utf8_pathbuf(entry.path()))
        .try_collect::<_, Vec<_>, _>()?
        .into_iter()
        .sorted()
        .collect())
}
