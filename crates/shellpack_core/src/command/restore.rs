use anyhow::Context;
use git_cmd::Repo;
use tracing::{error, instrument};

use crate::install::{self, CloneRequest};
use crate::lockfile::{LockedPackage, Lockfile};
use crate::manager::Manager;
use crate::package::RefSpec;
use crate::pool::TaskPool;

#[derive(Debug, Default)]
pub struct RestoreOutcome {
    pub restored: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl RestoreOutcome {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Re-create every lockfile entry at its managed path, checked out at the
/// recorded commit. Local packages are not in the lockfile and stay
/// untouched. Clones fan out in parallel, one per entry.
#[instrument(skip(manager))]
pub async fn restore(manager: &Manager) -> anyhow::Result<RestoreOutcome> {
    let path = manager.dirs.lockfile_path();
    let lockfile =
        Lockfile::read(&path).context("cannot restore without a lockfile; run `freeze` first")?;

    let mut pool: TaskPool<anyhow::Result<()>> = TaskPool::new();
    let mut outcome = RestoreOutcome::default();

    for entry in &lockfile.packages {
        let dest = manager.dirs.package_path(&entry.name);
        let task_entry = entry.clone();
        pool.defer(&entry.name, move || restore_one(&task_entry, dest));
    }

    for entry in &lockfile.packages {
        let Some(pending) = pool.take(&entry.name) else {
            continue;
        };
        match pending.await {
            Ok(Ok(())) => outcome.restored.push(entry.name.clone()),
            Ok(Err(e)) => {
                error!("cannot restore {}: {e:#}", entry.name);
                outcome.failed.push((entry.name.clone(), format!("{e:#}")));
            }
            Err(e) => {
                error!("restore task for {} died: {e}", entry.name);
                outcome.failed.push((entry.name.clone(), e.to_string()));
            }
        }
    }
    Ok(outcome)
}

fn restore_one(entry: &LockedPackage, dest: camino::Utf8PathBuf) -> anyhow::Result<()> {
    if dest.join(".git").exists() {
        let repo = Repo::new(&dest)?;
        repo.fetch()?;
        if repo.checkout(&entry.commit).is_err() {
            // The tree may be a shallow clone that doesn't reach the
            // pinned commit yet.
            repo.git(&["fetch", "--unshallow"]).ok();
            repo.checkout(&entry.commit)?;
        }
        return Ok(());
    }
    let request = CloneRequest {
        name: entry.name.clone(),
        source: entry.source.clone(),
        dest,
        ref_spec: RefSpec::Commit(entry.commit.clone()),
        managed: true,
    };
    install::clone_package(&request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::freeze;
    use crate::fs_utils::Utf8TempDir;
    use crate::paths::Dirs;
    use crate::registry::Declaration;
    use crate::session::MemorySession;

    #[tokio::test(flavor = "multi_thread")]
    async fn freeze_wipe_restore_reaches_the_pinned_commits() {
        test_logs::init();
        let temp = Utf8TempDir::new().unwrap();
        let mut manager = Manager::new(Dirs {
            config_dir: temp.path().join("config"),
            data_dir: temp.path().join("data"),
            shell_suffix: "zsh".to_string(),
        });

        let origin = temp.path().join("origins/plug");
        fs_err::create_dir_all(origin.as_std_path()).unwrap();
        let origin_repo = Repo::init(&origin);
        manager
            .declare(&Declaration::new(format!("file://{origin}")).scalar("as", "plug"))
            .unwrap();

        let mut session = MemorySession::new();
        manager.resolve().unwrap();
        crate::loader::load_packages(&mut manager, &mut session, None)
            .await
            .unwrap();

        let frozen = freeze(&manager).unwrap();
        assert!(frozen.is_clean());
        let pinned = frozen.lockfile.get("plug").unwrap().commit.clone();

        // The origin moves on; the lockfile must win over its new head.
        fs_err::write(origin.join("later.txt").as_std_path(), "later").unwrap();
        origin_repo.add_all_and_commit("later").unwrap();

        fs_err::remove_dir_all(manager.dirs.packages_dir().as_std_path()).unwrap();
        let outcome = restore(&manager).await.unwrap();
        assert!(outcome.is_clean());
        assert_eq!(outcome.restored, vec!["plug"]);

        let restored = Repo::new(manager.dirs.package_path("plug")).unwrap();
        assert_eq!(restored.current_commit().unwrap(), pinned);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn restoring_without_a_lockfile_fails() {
        let temp = Utf8TempDir::new().unwrap();
        let manager = Manager::new(Dirs {
            config_dir: temp.path().join("config"),
            data_dir: temp.path().join("data"),
            shell_suffix: "zsh".to_string(),
        });
        let err = restore(&manager).await.unwrap_err();
        assert!(format!("{err:#}").contains("run `freeze` first"));
    }
}
