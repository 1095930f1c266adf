//! Expand user-supplied package identifiers into canonical sources.
//!
//! An identifier can be a full URL, a `user/repo` shorthand, a provider
//! shorthand like `gl:user/repo`, or a filesystem path. The first matching
//! rule wins.

use crate::fs_utils;

/// Canonical form of a package identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Canonical URL, or an absolute filesystem path when `local` is true.
    pub url: String,
    pub local: bool,
}

const URL_SCHEMES: [&str; 4] = ["https://", "http://", "git://", "ssh://"];

pub fn canonicalize(id: &str) -> anyhow::Result<Source> {
    let id = id.trim();
    anyhow::ensure!(!id.is_empty(), "empty package identifier");

    if URL_SCHEMES.iter().any(|scheme| id.starts_with(scheme)) {
        return Ok(Source::remote(id));
    }
    if let Some(repo) = id.strip_prefix("gl:") {
        return Ok(Source::remote(format!("https://gitlab.com/{repo}.git")));
    }
    if let Some(repo) = id.strip_prefix("bb:") {
        return Ok(Source::remote(format!("https://bitbucket.org/{repo}.git")));
    }
    if id.starts_with('/') {
        return Ok(Source::local(id));
    }
    if id == "~" || id.starts_with("~/") {
        let home = fs_utils::home_directory()?;
        let expanded = match id.strip_prefix("~/") {
            Some(rest) => home.join(rest).into_string(),
            None => home.into_string(),
        };
        return Ok(Source::local(expanded));
    }
    if id.starts_with("git@") && id.contains(':') {
        return Ok(Source::remote(id));
    }
    if id.contains('/') && !id.contains("://") {
        return Ok(Source::remote(format!("https://github.com/{id}.git")));
    }
    Ok(Source::remote(id))
}

impl Source {
    fn remote(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            local: false,
        }
    }

    fn local(path: impl Into<String>) -> Self {
        Self {
            url: path.into(),
            local: true,
        }
    }
}

/// Derive a package name from a canonical source: the last path segment,
/// without the `.git` suffix.
pub fn derive_name(source: &str) -> String {
    let trimmed = source.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(trimmed)
        .to_string()
}

/// Package names must be usable as directory names and as plain shell words.
pub fn validate_name(name: &str) -> anyhow::Result<()> {
    anyhow::ensure!(!name.is_empty(), "package name is empty");
    if let Some(bad) = name
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, '*' | '?' | '['))
    {
        anyhow::bail!("invalid package name `{name}`: contains `{bad}`");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(id: &str) -> String {
        let source = canonicalize(id).unwrap();
        assert!(!source.local, "{id} should not be local");
        source.url
    }

    #[test]
    fn full_urls_pass_through() {
        assert_eq!(remote("https://example.com/a/b.git"), "https://example.com/a/b.git");
        assert_eq!(remote("git://example.com/a/b"), "git://example.com/a/b");
        assert_eq!(remote("ssh://git@example.com/a/b"), "ssh://git@example.com/a/b");
    }

    #[test]
    fn github_shorthand_expands() {
        assert_eq!(remote("user/repo"), "https://github.com/user/repo.git");
    }

    #[test]
    fn provider_shorthands_expand() {
        assert_eq!(remote("gl:user/repo"), "https://gitlab.com/user/repo.git");
        assert_eq!(remote("bb:user/repo"), "https://bitbucket.org/user/repo.git");
    }

    #[test]
    fn scp_style_passes_through() {
        assert_eq!(remote("git@github.com:user/repo.git"), "git@github.com:user/repo.git");
    }

    #[test]
    fn absolute_path_is_local() {
        let source = canonicalize("/opt/plugins/fzf").unwrap();
        assert!(source.local);
        assert_eq!(source.url, "/opt/plugins/fzf");
    }

    #[test]
    fn tilde_expands_to_home() {
        let source = canonicalize("~/plugins/z").unwrap();
        assert!(source.local);
        assert!(source.url.ends_with("/plugins/z"));
        assert!(!source.url.starts_with('~'));
    }

    #[test]
    fn bare_word_passes_through() {
        assert_eq!(remote("mystery"), "mystery");
    }

    #[test]
    fn name_derivation() {
        assert_eq!(derive_name("https://github.com/user/repo.git"), "repo");
        assert_eq!(derive_name("git@github.com:user/repo.git"), "repo");
        assert_eq!(derive_name("/opt/plugins/fzf"), "fzf");
        assert_eq!(derive_name("https://example.com/deep/path/tool/"), "tool");
    }

    #[test]
    fn names_with_glob_characters_are_rejected() {
        validate_name("ok-name").unwrap();
        validate_name("ok.name_2").unwrap();
        for bad in ["has space", "star*", "quest?", "brack[et", ""] {
            assert!(validate_name(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
