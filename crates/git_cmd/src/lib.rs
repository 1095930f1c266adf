//! Run git commands through the `git` command-line tool.
//!
//! Git is treated as a black box: every operation shells out, captures the
//! output, and reports git's own stderr on failure.

use std::process::Command;

use anyhow::{Context, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::trace;

/// A git working tree on disk.
#[derive(Debug, Clone)]
pub struct Repo {
    directory: Utf8PathBuf,
}

impl Repo {
    /// Open the working tree at `directory`.
    ///
    /// Fails if the directory doesn't exist or is not inside a git working
    /// tree.
    pub fn new(directory: impl AsRef<Utf8Path>) -> anyhow::Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        anyhow::ensure!(
            directory.exists(),
            "directory {directory} does not exist"
        );
        let repo = Self { directory };
        repo.git(&["rev-parse", "--is-inside-work-tree"])
            .with_context(|| format!("{} is not a git repository", repo.directory))?;
        Ok(repo)
    }

    pub fn directory(&self) -> &Utf8Path {
        &self.directory
    }

    /// Run git in the repository directory and return its stdout, trimmed.
    pub fn git(&self, args: &[&str]) -> anyhow::Result<String> {
        git_in_dir(&self.directory, args)
    }

    /// Full hash of the commit the working tree is currently at.
    pub fn current_commit(&self) -> anyhow::Result<String> {
        self.git(&["rev-parse", "HEAD"])
    }

    /// Name of the branch the working tree is on (`HEAD` when detached).
    pub fn current_branch(&self) -> anyhow::Result<String> {
        self.git(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    pub fn checkout(&self, object: &str) -> anyhow::Result<()> {
        self.git(&["checkout", object])
            .with_context(|| format!("cannot checkout {object}"))?;
        Ok(())
    }

    /// Download objects and refs from `origin`, including tags.
    pub fn fetch(&self) -> anyhow::Result<()> {
        self.git(&["fetch", "--tags", "--force", "origin"])?;
        Ok(())
    }

    /// URL of the `origin` remote.
    pub fn original_remote_url(&self) -> anyhow::Result<String> {
        self.git(&["remote", "get-url", "origin"])
    }

    /// `Ok` if there are no uncommitted changes, an error listing them
    /// otherwise.
    pub fn is_clean(&self) -> anyhow::Result<()> {
        let changes = self.changes_except_typechanges()?;
        anyhow::ensure!(changes.is_empty(), "the working directory of this project has uncommitted changes. Please commit or discard these changes:\n{}", changes.join("\n"));
        Ok(())
    }

    pub fn changes_except_typechanges(&self) -> anyhow::Result<Vec<String>> {
        let output = self.git(&["status", "--porcelain"])?;
        let changed_files = output
            .lines()
            .filter(|line| !line.starts_with("T "))
            .map(|line| line[2..].trim_start().to_string())
            .collect();
        Ok(changed_files)
    }
}

/// Run git with the given arguments inside `dir`.
///
/// Returns stdout with trailing whitespace trimmed. On a non-zero exit the
/// error message is git's stderr, verbatim.
pub fn git_in_dir(dir: &Utf8Path, args: &[&str]) -> anyhow::Result<String> {
    let args: Vec<&str> = args.iter().map(|s| s.trim()).collect();
    trace!("running git {} in {dir}", args.join(" "));
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(&args)
        .output()
        .with_context(|| format!("error while running git in directory `{dir}`"))?;
    let stdout = String::from_utf8_lossy(&output.stdout)
        .trim_end()
        .to_string();
    if output.status.success() {
        Ok(stdout)
    } else {
        let mut error = format!("error while running git in directory `{dir}`");
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if !stderr.is_empty() {
            error.push_str(": ");
            error.push_str(stderr);
        }
        Err(anyhow!(error))
    }
}

#[cfg(feature = "test_fixture")]
mod test_fixture {
    use super::*;

    impl Repo {
        /// Create a repository with an initial commit in `directory`.
        ///
        /// The repo is configured with a throwaway identity so that commits
        /// work on machines without a global git config.
        pub fn init(directory: impl AsRef<Utf8Path>) -> Self {
            let directory = directory.as_ref();
            git_in_dir(directory, &["init", "--initial-branch", "main"]).unwrap();
            git_in_dir(directory, &["config", "user.name", "author_name"]).unwrap();
            git_in_dir(directory, &["config", "user.email", "author@example.com"]).unwrap();
            git_in_dir(directory, &["config", "commit.gpgsign", "false"]).unwrap();
            fs_err::write(directory.join("README.md").as_std_path(), "# test").unwrap();
            let repo = Self {
                directory: directory.to_path_buf(),
            };
            repo.add_all_and_commit("initial commit").unwrap();
            repo
        }

        pub fn add_all_and_commit(&self, message: &str) -> anyhow::Result<()> {
            self.git(&["add", "."])?;
            self.git(&["commit", "-m", message])?;
            Ok(())
        }
    }
}
