//! Snapshot of the environment the search runs against.

use regex::Regex;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)|%([A-Za-z_][A-Za-z0-9_]*)%")
        .expect("Invalid placeholder regex")
});

/// Environment variables, home directory and PATH captured once per session.
///
/// Search and handlers read the environment only through this snapshot, so
/// tests can build one by hand instead of mutating the process environment.
#[derive(Debug, Clone, Default)]
pub struct SearchEnv {
    path: Option<OsString>,
    home: Option<PathBuf>,
    vars: HashMap<String, String>,
}

impl SearchEnv {
    /// Capture the current process environment.
    pub fn from_process() -> Self {
        let vars: HashMap<String, String> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        let home = vars
            .get("HOME")
            .or_else(|| vars.get("USERPROFILE"))
            .filter(|h| !h.is_empty())
            .map(PathBuf::from);
        Self {
            path: std::env::var_os("PATH"),
            home,
            vars,
        }
    }

    /// An empty environment: no PATH, no home, no variables.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<OsString>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// PATH built from a list of directories, joined with the platform separator.
    pub fn with_path_dirs<I, P>(self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let joined = std::env::join_paths(dirs.into_iter().map(|d| d.as_ref().to_path_buf()))
            .unwrap_or_default();
        self.with_path(joined)
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Raw PATH value.
    pub fn path_var(&self) -> Option<&OsString> {
        self.path.as_ref()
    }

    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// A variable's value; empty values count as unset.
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Expand `~`, `$VAR`, `${VAR}` and `%VAR%` in a candidate path.
    ///
    /// Returns `None` if any referenced variable (or the home directory) is
    /// unset, since the candidate cannot point anywhere meaningful then.
    ///
    /// ```rust
    /// use pkgmgr_discovery::SearchEnv;
    /// use std::path::PathBuf;
    ///
    /// let env = SearchEnv::empty().with_home("/home/ada").with_var("PYENV_ROOT", "/opt/pyenv");
    /// assert_eq!(env.expand("~/.pyenv/bin/pyenv"), Some(PathBuf::from("/home/ada/.pyenv/bin/pyenv")));
    /// assert_eq!(env.expand("${PYENV_ROOT}/bin/pyenv"), Some(PathBuf::from("/opt/pyenv/bin/pyenv")));
    /// assert_eq!(env.expand("$CONDA_EXE"), None);
    /// ```
    pub fn expand(&self, raw: &str) -> Option<PathBuf> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let mut missing = false;
        let expanded = PLACEHOLDER_RE.replace_all(raw, |caps: &regex::Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match self.var(name) {
                Some(value) => value.to_string(),
                None => {
                    missing = true;
                    String::new()
                }
            }
        });
        if missing {
            return None;
        }

        if expanded == "~" {
            return self.home.clone();
        }
        if let Some(rest) = expanded
            .strip_prefix("~/")
            .or_else(|| expanded.strip_prefix("~\\"))
        {
            return self.home.as_ref().map(|h| h.join(rest));
        }
        Some(PathBuf::from(expanded.into_owned()))
    }
}
