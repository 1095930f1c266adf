use std::path::Path;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};

pub fn current_directory() -> anyhow::Result<Utf8PathBuf> {
    let current_dir = std::env::current_dir().context("cannot determine current directory")?;
    to_utf8_pathbuf(current_dir)
}

pub fn to_utf8_pathbuf(path: std::path::PathBuf) -> anyhow::Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path.clone())
        .map_err(|_| anyhow::anyhow!("cannot convert {path:?} to utf8 path"))
}

pub fn canonicalize_utf8(path: impl AsRef<Path>) -> anyhow::Result<Utf8PathBuf> {
    let path = path.as_ref();
    let canonical = fs_err::canonicalize(path)?;
    to_utf8_pathbuf(canonical)
}

pub fn home_directory() -> anyhow::Result<Utf8PathBuf> {
    let home = dirs::home_dir().context("cannot determine home directory")?;
    to_utf8_pathbuf(home)
}

/// Like [`tempfile::TempDir`], with a utf8 path.
#[derive(Debug)]
pub struct Utf8TempDir {
    path: Utf8PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl Utf8TempDir {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempfile::tempdir().context("cannot create temporary directory")?;
        let path = to_utf8_pathbuf(temp_dir.path().to_path_buf())?;
        Ok(Self {
            path,
            _temp_dir: temp_dir,
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}
