//! Freeze/restore of pinned revisions.
//!
//! The on-disk format is line-oriented UTF-8 text. Blank lines and `#`
//! comments are ignored; every data line is `name|source|commit|timestamp`
//! with exactly three separators, a full 40-character commit hash and an
//! epoch-seconds timestamp.

use anyhow::Context;
use camino::Utf8Path;
use std::io::Write;

/// Pinned revision of one installed remote package.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LockedPackage {
    pub name: String,
    /// Canonical URL at freeze time.
    pub source: String,
    pub commit: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lockfile {
    pub packages: Vec<LockedPackage>,
}

impl Lockfile {
    pub fn get(&self, name: &str) -> Option<&LockedPackage> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let mut packages = vec![];
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let entry =
                parse_line(line).with_context(|| format!("lockfile line {}", lineno + 1))?;
            packages.push(entry);
        }
        Ok(Self { packages })
    }

    pub fn serialize(&self) -> String {
        let mut out = String::from("# Pinned package revisions. Managed by shellpack; edit with care.\n");
        out.push_str("# name|source|commit|timestamp\n");
        for package in &self.packages {
            out.push_str(&format!(
                "{}|{}|{}|{}\n",
                package.name, package.source, package.commit, package.timestamp
            ));
        }
        out
    }

    pub fn read(path: &Utf8Path) -> anyhow::Result<Self> {
        let text = fs_err::read_to_string(path.as_std_path())
            .with_context(|| format!("cannot read lockfile {path}"))?;
        Self::parse(&text)
    }

    /// Write atomically: the content lands in a temp file next to the
    /// target, then a rename swaps it in.
    pub fn write(&self, path: &Utf8Path) -> anyhow::Result<()> {
        let parent = path
            .parent()
            .with_context(|| format!("lockfile path {path} has no parent"))?;
        fs_err::create_dir_all(parent.as_std_path())?;
        let mut temp = tempfile::NamedTempFile::new_in(parent.as_std_path())
            .context("cannot create temporary lockfile")?;
        temp.write_all(self.serialize().as_bytes())
            .context("cannot write temporary lockfile")?;
        temp.persist(path.as_std_path())
            .with_context(|| format!("cannot replace lockfile {path}"))?;
        Ok(())
    }
}

fn parse_line(line: &str) -> anyhow::Result<LockedPackage> {
    let fields: Vec<&str> = line.split('|').collect();
    anyhow::ensure!(
        fields.len() == 4,
        "expected name|source|commit|timestamp, got {} field(s)",
        fields.len()
    );
    let (name, source, commit, timestamp) = (fields[0], fields[1], fields[2], fields[3]);
    anyhow::ensure!(!name.is_empty(), "empty package name");
    anyhow::ensure!(!source.is_empty(), "empty source for {name}");
    anyhow::ensure!(
        commit.len() == 40 && commit.chars().all(|c| c.is_ascii_hexdigit()),
        "invalid commit hash for {name}: `{commit}`"
    );
    let timestamp = timestamp
        .parse::<i64>()
        .with_context(|| format!("invalid timestamp for {name}: `{timestamp}`"))?;
    Ok(LockedPackage {
        name: name.to_string(),
        source: source.to_string(),
        commit: commit.to_string(),
        timestamp,
    })
}
