//! The script configuration layer.
//!
//! A config script is a sequence of registry operations:
//!
//! ```text
//! # comment
//! pack user/repo tag=v1.2 depends=(fzf z)
//! pack 'git@example.com:me/tools.git' as=tools load=manual
//! disable tools
//! ```
//!
//! Words follow shell-like quoting (single and double quotes, backslash
//! escapes). Fields are `key=value` or `key=(v1 v2 ...)`. A malformed line
//! rejects that declaration and the rest of the file still loads.

use anyhow::Context;
use camino::Utf8Path;
use tracing::{error, warn};

use super::IngestReport;
use crate::manager::Manager;
use crate::registry::{Declaration, FieldValue};

/// Ingest the script at `path` if it exists.
pub fn ingest_script_file(manager: &mut Manager, path: &Utf8Path) -> anyhow::Result<IngestReport> {
    if !path.exists() {
        return Ok(IngestReport::default());
    }
    let text = fs_err::read_to_string(path.as_std_path())
        .with_context(|| format!("cannot read config script {path}"))?;
    Ok(ingest_script(manager, &text, path.as_str()))
}

/// Execute a declaration script against the registry. `origin` names the
/// source in diagnostics.
pub fn ingest_script(manager: &mut Manager, text: &str, origin: &str) -> IngestReport {
    let mut report = IngestReport::default();
    for (lineno, line) in text.lines().enumerate() {
        let lineno = lineno + 1;
        let words = match tokenize(line) {
            Ok(words) => words,
            Err(e) => {
                error!("{origin}:{lineno}: {e}");
                report.rejected += 1;
                continue;
            }
        };
        let Some((command, rest)) = words.split_first() else {
            continue;
        };
        match command.as_str() {
            "pack" => match parse_declaration(rest) {
                Ok(declaration) => match manager.declare(&declaration) {
                    Ok(_) => report.declared += 1,
                    Err(e) => {
                        error!("{origin}:{lineno}: {e:#}");
                        report.rejected += 1;
                    }
                },
                Err(e) => {
                    error!("{origin}:{lineno}: {e}");
                    report.rejected += 1;
                }
            },
            "disable" => match rest {
                [name] => {
                    if !manager.disable(name) {
                        warn!("{origin}:{lineno}: cannot disable unknown package `{name}`");
                    }
                }
                _ => warn!("{origin}:{lineno}: usage: disable <name>"),
            },
            other => warn!("{origin}:{lineno}: unknown command `{other}`; line skipped"),
        }
    }
    report
}

fn parse_declaration(words: &[String]) -> anyhow::Result<Declaration> {
    let (id, fields) = words
        .split_first()
        .context("missing package identifier after `pack`")?;
    let mut declaration = Declaration::new(id.clone());
    let mut iter = fields.iter();
    while let Some(word) = iter.next() {
        if let Some((key, first)) = word.split_once("=(") {
            anyhow::ensure!(!key.is_empty(), "malformed field `{word}`");
            let mut values = vec![];
            let mut fragment = first.to_string();
            loop {
                if let Some(value) = fragment.strip_suffix(')') {
                    if !value.is_empty() {
                        values.push(value.to_string());
                    }
                    break;
                }
                if !fragment.is_empty() {
                    values.push(fragment.clone());
                }
                fragment = iter
                    .next()
                    .cloned()
                    .with_context(|| format!("unterminated array for field `{key}`"))?;
            }
            declaration
                .fields
                .push((key.to_string(), FieldValue::Array(values)));
        } else if let Some((key, value)) = word.split_once('=') {
            anyhow::ensure!(!key.is_empty(), "malformed field `{word}`");
            declaration
                .fields
                .push((key.to_string(), FieldValue::Scalar(value.to_string())));
        } else {
            anyhow::bail!("malformed field `{word}`: expected key=value or key=(...)");
        }
    }
    Ok(declaration)
}

/// Split a line into words with shell-like quoting. `#` starts a comment at
/// a word boundary.
fn tokenize(line: &str) -> anyhow::Result<Vec<String>> {
    let mut words = vec![];
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                in_word = true;
                let quote = c;
                loop {
                    match chars.next() {
                        Some(c) if c == quote => break,
                        Some('\\') if quote == '"' => match chars.next() {
                            Some(escaped) => current.push(escaped),
                            None => anyhow::bail!("unterminated quote"),
                        },
                        Some(c) => current.push(c),
                        None => anyhow::bail!("unterminated quote"),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => anyhow::bail!("trailing backslash"),
                }
            }
            '#' if !in_word => break,
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::RefSpec;
    use crate::paths::Dirs;
    use camino::Utf8PathBuf;

    fn ingest(text: &str) -> (Manager, IngestReport) {
        let mut manager = Manager::new(Dirs {
            config_dir: Utf8PathBuf::from("/cfg/shellpack"),
            data_dir: Utf8PathBuf::from("/data/shellpack"),
            shell_suffix: "zsh".to_string(),
        });
        let report = ingest_script(&mut manager, text, "test");
        (manager, report)
    }

    #[test]
    fn words_split_on_whitespace_with_quotes() {
        assert_eq!(
            tokenize(r#"pack 'user/my repo' as="nice name""#).unwrap(),
            vec!["pack", "user/my repo", "as=nice name"]
        );
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let (manager, report) = ingest("# a comment\n\npack user/repo # trailing\n");
        assert_eq!(report, IngestReport { declared: 1, rejected: 0 });
        assert!(manager.registry.contains("repo"));
    }

    #[test]
    fn scalar_and_array_fields_parse() {
        let (manager, _) = ingest("pack user/repo tag=v1 depends=(a b c) env=(FOO=1)\n");
        let (package, config) = manager.registry.lookup("repo").unwrap();
        assert_eq!(package.ref_spec, RefSpec::Tag("v1".to_string()));
        assert_eq!(config.depends, vec!["a", "b", "c"]);
        assert_eq!(config.env, vec![("FOO".to_string(), "1".to_string())]);
    }

    #[test]
    fn empty_arrays_are_allowed() {
        let (manager, _) = ingest("pack user/repo depends=()\n");
        let (_, config) = manager.registry.lookup("repo").unwrap();
        assert!(config.depends.is_empty());
    }

    #[test]
    fn unterminated_arrays_reject_the_declaration() {
        let (manager, report) = ingest("pack user/repo depends=(a b\npack user/other\n");
        assert_eq!(report, IngestReport { declared: 1, rejected: 1 });
        assert!(!manager.registry.contains("repo"));
        assert!(manager.registry.contains("other"));
    }

    #[test]
    fn unknown_commands_are_skipped_not_fatal() {
        let (manager, report) = ingest("frobnicate all\npack user/repo\n");
        assert_eq!(report.declared, 1);
        assert!(manager.registry.contains("repo"));
    }

    #[test]
    fn disable_marks_a_declared_package() {
        let (manager, _) = ingest("pack user/repo\ndisable repo\n");
        let (package, _) = manager.registry.lookup("repo").unwrap();
        assert!(package.disabled);
    }

    #[test]
    fn later_lines_overwrite_earlier_declarations() {
        let (manager, _) = ingest("pack user/repo branch=main\npack user/repo tag=v2\n");
        let (package, _) = manager.registry.lookup("repo").unwrap();
        assert_eq!(package.ref_spec, RefSpec::Tag("v2".to_string()));
    }
}
