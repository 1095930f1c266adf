//! Canonical in-memory store of package records and configuration.
//!
//! Declarations arrive from the config ingesters, already split into fields.
//! Later declarations of the same name overwrite earlier ones in full.

use std::collections::{BTreeSet, HashMap};

use camino::Utf8PathBuf;
use tracing::{debug, warn};

use crate::package::{LoadMode, Package, PackageConfig, RefSpec};
use crate::paths::Dirs;
use crate::urls;

/// A parsed declaration field. Scalar fields come from `key=value`, array
/// fields from `key=(v1 v2 ...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(String),
    Array(Vec<String>),
}

impl FieldValue {
    /// Array fields accept a scalar assignment as a one-element array.
    fn into_array(self) -> Vec<String> {
        match self {
            FieldValue::Scalar(value) => vec![value],
            FieldValue::Array(values) => values,
        }
    }
}

/// A user request to register or reconfigure a package, as produced by the
/// config ingesters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub id: String,
    pub fields: Vec<(String, FieldValue)>,
}

impl Declaration {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: vec![],
        }
    }

    pub fn field(mut self, key: &str, value: FieldValue) -> Self {
        self.fields.push((key.to_string(), value));
        self
    }

    pub fn scalar(self, key: &str, value: &str) -> Self {
        self.field(key, FieldValue::Scalar(value.to_string()))
    }

    pub fn array(self, key: &str, values: &[&str]) -> Self {
        self.field(
            key,
            FieldValue::Array(values.iter().map(|v| v.to_string()).collect()),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageFilter {
    All,
    Enabled,
    RemoteEnabled,
    InstalledEnabled,
}

impl PackageFilter {
    fn matches(self, package: &Package) -> bool {
        match self {
            PackageFilter::All => true,
            PackageFilter::Enabled => !package.disabled,
            PackageFilter::RemoteEnabled => !package.disabled && package.is_remote(),
            PackageFilter::InstalledEnabled => !package.disabled && package.is_installed(),
        }
    }
}

#[derive(Debug)]
struct Entry {
    package: Package,
    config: PackageConfig,
}

/// The registry exclusively owns every [`Package`] and [`PackageConfig`].
/// Callers refer to packages by name and re-look-up after mutations.
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<String, Entry>,
    /// Declaration order. A redeclared name keeps its original position.
    insertion: Vec<String>,
    load_order: Vec<String>,
    loaded: BTreeSet<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalize the id, parse the fields and store the package record.
    /// Returns the package name.
    ///
    /// An invalid name or source rejects the whole declaration; unknown
    /// fields and malformed entries inside array fields only warn.
    pub fn declare(&mut self, dirs: &Dirs, declaration: &Declaration) -> anyhow::Result<String> {
        // A disabled declaration is a tombstone: only the name is kept.
        if is_disabled_declaration(&declaration.fields) {
            let name = match name_override(&declaration.fields) {
                Some(name) => {
                    urls::validate_name(name)?;
                    name.to_string()
                }
                None => self.declared_name(&declaration.id)?,
            };
            debug!("declared disabled package {name}");
            self.insert(Package::disabled_stub(&name), PackageConfig::default());
            return Ok(name);
        }

        let source = urls::canonicalize(&declaration.id)?;
        let mut name = name_override(&declaration.fields)
            .map(ToString::to_string)
            .unwrap_or_else(|| urls::derive_name(&source.url));
        urls::validate_name(&name)?;

        let mut package = Package {
            name: String::new(),
            source: source.url.clone(),
            path: Utf8PathBuf::new(),
            ref_spec: RefSpec::None,
            local: source.local,
            url_override: None,
            load_mode: LoadMode::default(),
            build: None,
            disabled: false,
            entry_override: None,
        };
        let mut config = PackageConfig::default();

        for (key, value) in &declaration.fields {
            match (key.as_str(), value.clone()) {
                ("as", FieldValue::Scalar(value)) => name = value,
                ("branch", FieldValue::Scalar(value)) => package.ref_spec = RefSpec::Branch(value),
                ("tag", FieldValue::Scalar(value)) => package.ref_spec = RefSpec::Tag(value),
                ("commit", FieldValue::Scalar(value)) => package.ref_spec = RefSpec::Commit(value),
                ("local", FieldValue::Scalar(value)) => match parse_bool(&value) {
                    Some(local) => package.local = local,
                    None => warn!("package {name}: invalid boolean `{value}` for local"),
                },
                ("load", FieldValue::Scalar(value)) => match LoadMode::parse(&value) {
                    Some(mode) => package.load_mode = mode,
                    None => warn!("package {name}: unknown load mode `{value}`"),
                },
                ("build", FieldValue::Scalar(value)) => package.build = Some(value),
                ("source_file", FieldValue::Scalar(value)) => {
                    package.entry_override = Some(value);
                }
                ("rc", FieldValue::Scalar(value)) => config.rc = Some(value),
                ("url", FieldValue::Scalar(value)) => package.url_override = Some(value),
                ("disabled", FieldValue::Scalar(_)) => {
                    // Handled above; only `disabled=true` is a tombstone.
                }
                ("env", value) => {
                    config.env.extend(parse_pairs(&name, "env", value));
                }
                ("alias", value) => {
                    config.aliases.extend(parse_pairs(&name, "alias", value));
                }
                ("path", value) => config.paths.extend(value.into_array()),
                ("fpath", value) => config.fpaths.extend(value.into_array()),
                ("depends", value) => config.depends.extend(value.into_array()),
                (key, FieldValue::Array(_)) => {
                    warn!("package {name}: field `{key}` does not take an array value");
                }
                (key, FieldValue::Scalar(_)) => {
                    warn!("package {name}: unknown field `{key}`");
                }
            }
        }

        urls::validate_name(&name)?;
        package.name = name.clone();
        package.path = if package.local {
            Utf8PathBuf::from(&package.source)
        } else {
            dirs.package_path(&name)
        };
        self.insert(package, config);
        Ok(name)
    }

    fn declared_name(&self, id: &str) -> anyhow::Result<String> {
        let source = urls::canonicalize(id)?;
        let name = urls::derive_name(&source.url);
        urls::validate_name(&name)?;
        Ok(name)
    }

    fn insert(&mut self, package: Package, config: PackageConfig) {
        let name = package.name.clone();
        if self.entries.insert(name.clone(), Entry { package, config }).is_none() {
            self.insertion.push(name);
        }
    }

    /// Mark a package disabled and drop it from the load order.
    /// Returns false if the name is not declared.
    pub fn disable(&mut self, name: &str) -> bool {
        let Some(entry) = self.entries.get_mut(name) else {
            return false;
        };
        entry.package.disabled = true;
        self.load_order.retain(|n| n != name);
        true
    }

    /// Forget everything about a package.
    pub fn evict(&mut self, name: &str) {
        self.entries.remove(name);
        self.insertion.retain(|n| n != name);
        self.load_order.retain(|n| n != name);
        self.loaded.remove(name);
    }

    pub fn lookup(&self, name: &str) -> Option<(&Package, &PackageConfig)> {
        self.entries
            .get(name)
            .map(|entry| (&entry.package, &entry.config))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Package names in load order when the resolver ran, otherwise in
    /// declaration order, filtered.
    pub fn names(&self, filter: PackageFilter) -> Vec<String> {
        let order = if self.load_order.is_empty() {
            &self.insertion
        } else {
            &self.load_order
        };
        order
            .iter()
            .filter(|name| {
                self.lookup(name)
                    .is_some_and(|(package, _)| filter.matches(package))
            })
            .cloned()
            .collect()
    }

    pub fn set_load_order(&mut self, order: Vec<String>) {
        self.load_order = order;
    }

    pub fn load_order(&self) -> &[String] {
        &self.load_order
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains(name)
    }

    /// Loading is monotonic: once marked, a package is never applied again
    /// in this session.
    pub fn mark_loaded(&mut self, name: &str) {
        self.loaded.insert(name.to_string());
    }
}

fn is_disabled_declaration(fields: &[(String, FieldValue)]) -> bool {
    fields.iter().any(|(key, value)| {
        key == "disabled"
            && matches!(value, FieldValue::Scalar(v) if parse_bool(v) == Some(true))
    })
}

fn name_override(fields: &[(String, FieldValue)]) -> Option<&str> {
    fields.iter().rev().find_map(|(key, value)| match value {
        FieldValue::Scalar(v) if key == "as" => Some(v.as_str()),
        _ => None,
    })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Parse `NAME=VALUE` entries for the env and alias fields, skipping (with a
/// warning) entries without a `=`.
fn parse_pairs(package: &str, field: &str, value: FieldValue) -> Vec<(String, String)> {
    value
        .into_array()
        .into_iter()
        .filter_map(|entry| match entry.split_once('=') {
            Some((key, val)) if !key.is_empty() => Some((key.to_string(), val.to_string())),
            _ => {
                warn!("package {package}: ignoring malformed {field} entry `{entry}`");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_dirs() -> Dirs {
        Dirs {
            config_dir: Utf8PathBuf::from("/cfg/shellpack"),
            data_dir: Utf8PathBuf::from("/data/shellpack"),
            shell_suffix: "zsh".to_string(),
        }
    }

    fn declare(registry: &mut Registry, declaration: Declaration) -> String {
        registry.declare(&test_dirs(), &declaration).unwrap()
    }

    #[test]
    fn declared_fields_are_normalized() {
        let mut registry = Registry::new();
        let name = declare(
            &mut registry,
            Declaration::new("user/repo")
                .scalar("tag", "v1.0")
                .array("env", &["FOO=bar", "BAZ=qux"])
                .array("depends", &["fzf", "z@v2"]),
        );
        assert_eq!(name, "repo");

        let (package, config) = registry.lookup("repo").unwrap();
        assert_eq!(package.source, "https://github.com/user/repo.git");
        assert_eq!(package.path, "/data/shellpack/packages/repo");
        assert_eq!(package.ref_spec, RefSpec::Tag("v1.0".to_string()));
        assert!(package.is_remote());
        assert_eq!(
            config.env,
            vec![
                ("FOO".to_string(), "bar".to_string()),
                ("BAZ".to_string(), "qux".to_string())
            ]
        );
        assert_eq!(config.depends, vec!["fzf", "z@v2"]);
    }

    #[test]
    fn later_declarations_overwrite_in_full() {
        let mut registry = Registry::new();
        declare(
            &mut registry,
            Declaration::new("user/repo").scalar("branch", "main"),
        );
        declare(
            &mut registry,
            Declaration::new("user/repo").array("env", &["A=1"]),
        );

        let (package, config) = registry.lookup("repo").unwrap();
        // The branch from the first declaration is gone.
        assert_eq!(package.ref_spec, RefSpec::None);
        assert_eq!(config.env, vec![("A".to_string(), "1".to_string())]);
    }

    #[test]
    fn scalar_assignment_to_an_array_field_becomes_one_element() {
        let mut registry = Registry::new();
        declare(
            &mut registry,
            Declaration::new("user/repo").scalar("depends", "fzf"),
        );
        let (_, config) = registry.lookup("repo").unwrap();
        assert_eq!(config.depends, vec!["fzf"]);
    }

    #[test]
    fn disabled_declarations_store_only_a_stub() {
        let mut registry = Registry::new();
        declare(
            &mut registry,
            Declaration::new("user/repo")
                .scalar("disabled", "true")
                .scalar("branch", "main"),
        );
        let (package, config) = registry.lookup("repo").unwrap();
        assert!(package.disabled);
        assert!(package.source.is_empty());
        assert_eq!(config, &PackageConfig::default());
    }

    #[test]
    fn local_packages_use_their_source_as_path() {
        let mut registry = Registry::new();
        declare(&mut registry, Declaration::new("/opt/plugins/fzf"));
        let (package, _) = registry.lookup("fzf").unwrap();
        assert!(package.local);
        assert_eq!(package.path, "/opt/plugins/fzf");
    }

    #[test]
    fn as_field_overrides_the_derived_name() {
        let mut registry = Registry::new();
        let name = declare(
            &mut registry,
            Declaration::new("user/repo").scalar("as", "nicer"),
        );
        assert_eq!(name, "nicer");
        assert!(registry.lookup("nicer").is_some());
        assert!(registry.lookup("repo").is_none());
    }

    #[test]
    fn invalid_names_reject_the_declaration() {
        let mut registry = Registry::new();
        let err = registry
            .declare(
                &test_dirs(),
                &Declaration::new("user/repo").scalar("as", "bad name"),
            )
            .unwrap_err();
        assert!(err.to_string().contains("invalid package name"));
        assert!(!registry.contains("bad name"));
    }

    #[test]
    fn disable_removes_from_load_order() {
        let mut registry = Registry::new();
        declare(&mut registry, Declaration::new("user/a"));
        declare(&mut registry, Declaration::new("user/b"));
        registry.set_load_order(vec!["a".to_string(), "b".to_string()]);

        assert!(registry.disable("a"));
        assert_eq!(registry.load_order(), ["b".to_string()]);
        let (package, _) = registry.lookup("a").unwrap();
        assert!(package.disabled);
        assert_eq!(registry.names(PackageFilter::Enabled), vec!["b"]);
    }

    #[test]
    fn names_fall_back_to_declaration_order() {
        let mut registry = Registry::new();
        declare(&mut registry, Declaration::new("user/zeta"));
        declare(&mut registry, Declaration::new("user/alpha"));
        assert_eq!(registry.names(PackageFilter::All), vec!["zeta", "alpha"]);
    }
}
