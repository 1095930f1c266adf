use camino::Utf8PathBuf;
use serde::Serialize;

/// Revision a package is pinned to. At most one of branch, tag and commit
/// can be set per declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefSpec {
    #[default]
    None,
    Branch(String),
    Tag(String),
    Commit(String),
}

impl RefSpec {
    pub fn is_none(&self) -> bool {
        matches!(self, RefSpec::None)
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            RefSpec::Tag(tag) => Some(tag),
            _ => None,
        }
    }
}

impl std::fmt::Display for RefSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefSpec::None => write!(f, "default"),
            RefSpec::Branch(branch) => write!(f, "branch={branch}"),
            RefSpec::Tag(tag) => write!(f, "tag={tag}"),
            RefSpec::Commit(commit) => write!(f, "commit={commit}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    Autoload,
    #[default]
    Now,
    Manual,
}

impl LoadMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "autoload" => Some(LoadMode::Autoload),
            "now" => Some(LoadMode::Now),
            "manual" => Some(LoadMode::Manual),
            _ => None,
        }
    }
}

/// A declared package: where it comes from, where it lives on disk and how
/// it is loaded.
#[derive(Debug, Clone, Serialize)]
pub struct Package {
    pub name: String,
    /// Canonical URL, or an absolute filesystem path for local packages.
    pub source: String,
    /// Working tree location. For local packages this is `source` itself.
    pub path: Utf8PathBuf,
    pub ref_spec: RefSpec,
    pub local: bool,
    /// Remote used by `update` when `local` is true, so a local tree can
    /// track an upstream.
    pub url_override: Option<String>,
    pub load_mode: LoadMode,
    /// Shell snippet run after install and after an update changed the
    /// revision.
    pub build: Option<String>,
    pub disabled: bool,
    /// Entry point relative to `path`, or an absolute path.
    pub entry_override: Option<String>,
}

impl Package {
    /// A stub kept only so diagnostics can mention the name.
    pub fn disabled_stub(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: String::new(),
            path: Utf8PathBuf::new(),
            ref_spec: RefSpec::None,
            local: false,
            url_override: None,
            load_mode: LoadMode::default(),
            build: None,
            disabled: true,
            entry_override: None,
        }
    }

    pub fn is_remote(&self) -> bool {
        !self.local
    }

    pub fn is_installed(&self) -> bool {
        self.path.exists()
    }
}

/// Configuration fields applied to the host session when a package loads.
/// Every list preserves declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageConfig {
    /// `NAME=VALUE` pairs exported into the session.
    pub env: Vec<(String, String)>,
    /// Directories prepended to the executable search path. Relative
    /// entries resolve against the package path.
    pub paths: Vec<String>,
    /// Directories prepended to the function search path.
    pub fpaths: Vec<String>,
    /// `name=value` alias definitions.
    pub aliases: Vec<(String, String)>,
    /// Dependency specifiers: `name` or `name@constraint`.
    pub depends: Vec<String>,
    /// Snippet evaluated after the entry point is sourced.
    pub rc: Option<String>,
}

/// Split a dependency specifier into its name and optional constraint.
pub fn split_dependency(spec: &str) -> (&str, Option<&str>) {
    match spec.split_once('@') {
        Some((name, constraint)) if !constraint.is_empty() => (name, Some(constraint)),
        Some((name, _)) => (name, None),
        None => (spec, None),
    }
}
