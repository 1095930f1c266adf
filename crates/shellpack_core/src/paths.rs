//! Where shellpack keeps its files, following the XDG conventions.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};

use crate::fs_utils;

pub const APP_NAME: &str = "shellpack";
pub const LOCKFILE_NAME: &str = "lock";

/// Environment overrides, mostly for tests and non-XDG setups.
pub const DATA_DIR_ENV: &str = "SHELLPACK_DATA_DIR";
pub const CONFIG_DIR_ENV: &str = "SHELLPACK_CONFIG_DIR";
pub const SHELL_ENV: &str = "SHELLPACK_SHELL";

/// Resolved directory layout plus the shell suffix used for entry points,
/// autoload registration and the `pkgs.d` glob.
#[derive(Debug, Clone)]
pub struct Dirs {
    pub config_dir: Utf8PathBuf,
    pub data_dir: Utf8PathBuf,
    pub shell_suffix: String,
}

impl Dirs {
    pub fn from_env() -> anyhow::Result<Self> {
        let data_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(dir) => Utf8PathBuf::from(dir),
            Err(_) => {
                let base = dirs::data_dir().context("cannot determine the XDG data directory")?;
                fs_utils::to_utf8_pathbuf(base)?.join(APP_NAME)
            }
        };
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => Utf8PathBuf::from(dir),
            Err(_) => {
                let base =
                    dirs::config_dir().context("cannot determine the XDG config directory")?;
                fs_utils::to_utf8_pathbuf(base)?.join(APP_NAME)
            }
        };
        Ok(Self {
            config_dir,
            data_dir,
            shell_suffix: shell_suffix_from_env(),
        })
    }

    /// Installed package working trees, one subdirectory per package name.
    pub fn packages_dir(&self) -> Utf8PathBuf {
        self.data_dir.join("packages")
    }

    pub fn package_path(&self, name: &str) -> Utf8PathBuf {
        self.packages_dir().join(name)
    }

    pub fn state_dir(&self) -> Utf8PathBuf {
        self.data_dir.join("state")
    }

    pub fn lockfile_path(&self) -> Utf8PathBuf {
        self.state_dir().join(LOCKFILE_NAME)
    }

    pub fn cache_dir(&self) -> Utf8PathBuf {
        self.data_dir.join("cache")
    }

    /// The user's script-layer configuration.
    pub fn config_script(&self) -> Utf8PathBuf {
        self.config_dir.join("config")
    }

    /// Filesystem-layout configuration, one subdirectory per package.
    pub fn packages_config_dir(&self) -> Utf8PathBuf {
        self.config_dir.join("packages")
    }

    /// Aggregated script snippets, executed in filename order.
    pub fn pkgs_d_dir(&self) -> Utf8PathBuf {
        self.config_dir.join("pkgs.d")
    }

    /// True when `path` is inside the managed packages directory. Remove and
    /// clone-cleanup refuse to touch anything outside of it.
    pub fn is_managed(&self, path: &Utf8Path) -> bool {
        path.starts_with(self.packages_dir())
    }
}

fn shell_suffix_from_env() -> String {
    if let Ok(suffix) = std::env::var(SHELL_ENV)
        && !suffix.is_empty()
    {
        return suffix;
    }
    if let Ok(shell) = std::env::var("SHELL")
        && let Some(name) = shell.rsplit('/').next()
        && !name.is_empty()
    {
        return name.to_string();
    }
    "zsh".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dirs() -> Dirs {
        Dirs {
            config_dir: Utf8PathBuf::from("/cfg/shellpack"),
            data_dir: Utf8PathBuf::from("/data/shellpack"),
            shell_suffix: "zsh".to_string(),
        }
    }

    #[test]
    fn layout_follows_the_xdg_split() {
        let dirs = test_dirs();
        assert_eq!(dirs.packages_dir(), "/data/shellpack/packages");
        assert_eq!(dirs.lockfile_path(), "/data/shellpack/state/lock");
        assert_eq!(dirs.cache_dir(), "/data/shellpack/cache");
        assert_eq!(dirs.config_script(), "/cfg/shellpack/config");
        assert_eq!(dirs.packages_config_dir(), "/cfg/shellpack/packages");
        assert_eq!(dirs.pkgs_d_dir(), "/cfg/shellpack/pkgs.d");
    }

    #[test]
    fn only_paths_under_the_packages_dir_are_managed() {
        let dirs = test_dirs();
        assert!(dirs.is_managed(&dirs.package_path("fzf")));
        assert!(!dirs.is_managed(Utf8Path::new("/home/user/plugins/fzf")));
        assert!(!dirs.is_managed(&dirs.data_dir));
    }
}
