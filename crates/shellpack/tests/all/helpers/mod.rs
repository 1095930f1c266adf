use camino::Utf8PathBuf;
use git_cmd::Repo;
use shellpack_core::fs_utils::Utf8TempDir;

/// An isolated config + data universe for one test, with throwaway git
/// origins to install from.
pub struct TestContext {
    temp: Utf8TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        test_logs::init();
        let temp = Utf8TempDir::new().unwrap();
        let context = Self { temp };
        fs_err::create_dir_all(context.config_dir().as_std_path()).unwrap();
        fs_err::create_dir_all(context.data_dir().as_std_path()).unwrap();
        context
    }

    pub fn config_dir(&self) -> Utf8PathBuf {
        self.temp.path().join("config")
    }

    pub fn data_dir(&self) -> Utf8PathBuf {
        self.temp.path().join("data")
    }

    pub fn package_dir(&self, name: &str) -> Utf8PathBuf {
        self.data_dir().join("packages").join(name)
    }

    pub fn lockfile_path(&self) -> Utf8PathBuf {
        self.data_dir().join("state/lock")
    }

    /// Write the script-layer configuration.
    pub fn write_config(&self, text: &str) {
        fs_err::write(self.config_dir().join("config").as_std_path(), text).unwrap();
    }

    /// Create a git origin with an `init.zsh` entry point and return its
    /// `file://` URL.
    pub fn origin(&self, name: &str) -> String {
        let dir = self.temp.path().join("origins").join(name);
        fs_err::create_dir_all(dir.as_std_path()).unwrap();
        fs_err::write(
            dir.join("init.zsh").as_std_path(),
            format!("# {name} entry point\n"),
        )
        .unwrap();
        Repo::init(&dir);
        format!("file://{dir}")
    }

    pub fn origin_repo(&self, name: &str) -> Repo {
        Repo::new(self.temp.path().join("origins").join(name)).unwrap()
    }

    pub fn installed_repo(&self, name: &str) -> Repo {
        Repo::new(self.package_dir(name)).unwrap()
    }

    /// The shellpack binary, pointed at this context's directories.
    pub fn shellpack(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("shellpack").unwrap();
        cmd.env("SHELLPACK_CONFIG_DIR", self.config_dir())
            .env("SHELLPACK_DATA_DIR", self.data_dir())
            .env("SHELLPACK_SHELL", "zsh");
        cmd
    }
}

pub fn head_commit(repo: &Repo) -> String {
    repo.current_commit().unwrap()
}
