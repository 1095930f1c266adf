use camino::Utf8PathBuf;
use git_cmd::Repo;
use tracing::debug;

use crate::fs_utils;

/// Where a git-checkout installation lives, overriding autodetection.
pub const HOME_ENV: &str = "SHELLPACK_HOME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelfUpdate {
    /// The installation directory is not a git checkout; nothing to pull.
    NotARepo(Utf8PathBuf),
    UpToDate,
    Updated { old_commit: String, new_commit: String },
}

/// Update a from-git installation of shellpack by fast-forwarding its own
/// checkout. Installations from a package manager report [`SelfUpdate::NotARepo`].
pub fn self_update() -> anyhow::Result<SelfUpdate> {
    let home = installation_dir()?;
    debug!("looking for a shellpack checkout in {home}");
    let Ok(repo) = Repo::new(&home) else {
        return Ok(SelfUpdate::NotARepo(home));
    };
    let old_commit = repo.current_commit()?;
    repo.git(&["pull", "--ff-only"])?;
    let new_commit = repo.current_commit()?;
    if old_commit == new_commit {
        Ok(SelfUpdate::UpToDate)
    } else {
        Ok(SelfUpdate::Updated {
            old_commit,
            new_commit,
        })
    }
}

fn installation_dir() -> anyhow::Result<Utf8PathBuf> {
    if let Ok(home) = std::env::var(HOME_ENV) {
        return Ok(Utf8PathBuf::from(home));
    }
    let exe = fs_utils::to_utf8_pathbuf(std::env::current_exe()?)?;
    let dir = exe
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| exe.clone());
    Ok(dir)
}
