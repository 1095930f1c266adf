//! The host shell session, modeled behind a trait.
//!
//! shellpack runs in its own process, so "mutating the session" means
//! emitting shell code for the host shell to eval. Tests use the in-memory
//! [`MemorySession`] instead.

use camino::Utf8Path;

/// Everything a loaded package may do to the surrounding shell.
pub trait HostSession {
    fn export_env(&mut self, name: &str, value: &str);
    fn prepend_search_path(&mut self, dir: &Utf8Path);
    fn prepend_fn_search_path(&mut self, dir: &Utf8Path);
    fn add_alias(&mut self, name: &str, value: &str);
    /// Register `function` for lazy loading from the function search path.
    fn register_autoload(&mut self, function: &str);
    fn source_script(&mut self, path: &Utf8Path);
    /// Evaluate a snippet with extra variables exported around it.
    fn eval_snippet(&mut self, snippet: &str, env: &[(String, String)]);
}

/// Emits shell source lines into a buffer. The host shell is expected to
/// eval the result, e.g. `eval "$(shellpack install)"`.
#[derive(Debug, Default)]
pub struct ShellWriter {
    buf: String,
}

impl ShellWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.buf
    }

    fn line(&mut self, line: &str) {
        self.buf.push_str(line);
        self.buf.push('\n');
    }
}

/// Wrap `value` in single quotes, escaping embedded single quotes the shell
/// way: `'` becomes `'\''`.
fn sh_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

impl HostSession for ShellWriter {
    fn export_env(&mut self, name: &str, value: &str) {
        self.line(&format!("export {name}={}", sh_quote(value)));
    }

    fn prepend_search_path(&mut self, dir: &Utf8Path) {
        self.line(&format!("export PATH={}:\"$PATH\"", sh_quote(dir.as_str())));
    }

    fn prepend_fn_search_path(&mut self, dir: &Utf8Path) {
        // zsh keeps $fpath tied to $FPATH, so exporting covers both.
        self.line(&format!("export FPATH={}:\"$FPATH\"", sh_quote(dir.as_str())));
    }

    fn add_alias(&mut self, name: &str, value: &str) {
        self.line(&format!("alias {name}={}", sh_quote(value)));
    }

    fn register_autoload(&mut self, function: &str) {
        self.line(&format!("autoload -Uz {function}"));
    }

    fn source_script(&mut self, path: &Utf8Path) {
        self.line(&format!(". {}", sh_quote(path.as_str())));
    }

    fn eval_snippet(&mut self, snippet: &str, env: &[(String, String)]) {
        for (name, value) in env {
            self.line(&format!("export {name}={}", sh_quote(value)));
        }
        self.line(snippet.trim_end());
        if !env.is_empty() {
            let names = env
                .iter()
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            self.line(&format!("unset {names}"));
        }
    }
}

/// Records every call, for assertions in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOp {
    Env(String, String),
    Path(String),
    FnPath(String),
    Alias(String, String),
    Autoload(String),
    Source(String),
    Eval(String, Vec<(String, String)>),
}

#[derive(Debug, Default)]
pub struct MemorySession {
    pub ops: Vec<SessionOp>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sourced(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                SessionOp::Source(path) => Some(path.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl HostSession for MemorySession {
    fn export_env(&mut self, name: &str, value: &str) {
        self.ops.push(SessionOp::Env(name.into(), value.into()));
    }

    fn prepend_search_path(&mut self, dir: &Utf8Path) {
        self.ops.push(SessionOp::Path(dir.to_string()));
    }

    fn prepend_fn_search_path(&mut self, dir: &Utf8Path) {
        self.ops.push(SessionOp::FnPath(dir.to_string()));
    }

    fn add_alias(&mut self, name: &str, value: &str) {
        self.ops.push(SessionOp::Alias(name.into(), value.into()));
    }

    fn register_autoload(&mut self, function: &str) {
        self.ops.push(SessionOp::Autoload(function.into()));
    }

    fn source_script(&mut self, path: &Utf8Path) {
        self.ops.push(SessionOp::Source(path.to_string()));
    }

    fn eval_snippet(&mut self, snippet: &str, env: &[(String, String)]) {
        self.ops
            .push(SessionOp::Eval(snippet.into(), env.to_vec()));
    }
}
