//! Project configuration fields onto the host session.
//!
//! All appliers silently no-op on empty fields. Single application per
//! package and session is guaranteed by the loader's loaded set.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

use crate::package::{Package, PackageConfig};
use crate::session::HostSession;

pub const PKG_DIR_VAR: &str = "PKG_DIR";
pub const PKG_NAME_VAR: &str = "PKG_NAME";

pub fn apply_env(config: &PackageConfig, session: &mut dyn HostSession) {
    for (name, value) in &config.env {
        session.export_env(name, value);
    }
}

/// Prepend each declared directory to the executable search path. Relative
/// entries resolve against the package path; directories that don't exist
/// are skipped.
pub fn apply_paths(package: &Package, config: &PackageConfig, session: &mut dyn HostSession) {
    for entry in &config.paths {
        let dir = resolve_dir(package, entry);
        if !dir.is_dir() {
            debug!("package {}: skipping missing path entry {dir}", package.name);
            continue;
        }
        session.prepend_search_path(&dir);
    }
}

pub fn apply_aliases(config: &PackageConfig, session: &mut dyn HostSession) {
    for (name, value) in &config.aliases {
        session.add_alias(name, value);
    }
}

/// Prepend each declared directory to the function search path and register
/// every non-hidden file inside for autoload, under its basename with the
/// shell suffix stripped.
pub fn apply_fpaths(
    package: &Package,
    config: &PackageConfig,
    session: &mut dyn HostSession,
    shell_suffix: &str,
) {
    for entry in &config.fpaths {
        let dir = resolve_dir(package, entry);
        if !dir.is_dir() {
            debug!("package {}: skipping missing fpath entry {dir}", package.name);
            continue;
        }
        session.prepend_fn_search_path(&dir);
        for function in autoload_functions(&dir, shell_suffix) {
            session.register_autoload(&function);
        }
    }
}

/// Evaluate the rc snippet with `PKG_DIR` and `PKG_NAME` injected.
pub fn apply_rc(package: &Package, config: &PackageConfig, session: &mut dyn HostSession) {
    let Some(rc) = &config.rc else {
        return;
    };
    session.eval_snippet(rc, &snippet_env(package));
}

pub fn snippet_env(package: &Package) -> Vec<(String, String)> {
    vec![
        (PKG_DIR_VAR.to_string(), package.path.to_string()),
        (PKG_NAME_VAR.to_string(), package.name.clone()),
    ]
}

fn resolve_dir(package: &Package, entry: &str) -> Utf8PathBuf {
    let path = Utf8Path::new(entry);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        package.path.join(path)
    }
}

fn autoload_functions(dir: &Utf8Path, shell_suffix: &str) -> Vec<String> {
    let entries = match fs_err::read_dir(dir.as_std_path()) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot scan fpath directory {dir}: {e}");
            return vec![];
        }
    };
    let suffix = format!(".{shell_suffix}");
    let mut functions: Vec<String> = entries
        .filter_map(|entry| {
            let entry = entry.ok()?;
            if !entry.file_type().ok()?.is_file() {
                return None;
            }
            let name = entry.file_name().to_str()?.to_string();
            if name.starts_with('.') {
                return None;
            }
            let function = name.strip_suffix(&suffix).unwrap_or(&name);
            Some(function.to_string())
        })
        .collect();
    functions.sort();
    functions
}
