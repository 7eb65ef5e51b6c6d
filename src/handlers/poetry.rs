//! Poetry project virtualenvs.
//!
//! Poetry has no global package list; its virtualenv directory is the
//! closest thing, with one entry per project environment.

use super::text::lines;
use super::{HandlerContext, ManagerHandler};
use crate::{DiscoveryError, ManagerId, PackageLocation, PackageRecord, SearchEnv};
use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;
use tokio::time::timeout;
use tracing::debug;

// `<project>-<8 char hash>-py<major.minor>`
static VENV_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+)-[A-Za-z0-9_-]{8}-py(\d+\.\d+)$").expect("Invalid poetry venv regex")
});

#[cfg(not(windows))]
const COMMON_PATHS: &[&str] = &[
    "~/.local/bin/poetry",
    "$POETRY_HOME/bin/poetry",
    "~/.poetry/bin/poetry",
    "~/Library/Application Support/pypoetry/venv/bin/poetry",
    "/opt/homebrew/bin/poetry",
    "/usr/local/bin/poetry",
];

#[cfg(windows)]
const COMMON_PATHS: &[&str] = &[
    "%APPDATA%\\Python\\Scripts\\poetry.exe",
    "%POETRY_HOME%\\bin\\poetry.exe",
    "%APPDATA%\\pypoetry\\venv\\Scripts\\poetry.exe",
];

/// Version reported for environments whose name carries no Python version.
const UNKNOWN_VERSION: &str = "unknown";

/// Poetry handler: lists the virtualenv directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct PoetryHandler;

impl PoetryHandler {
    /// Poetry's data directory for `env`.
    pub fn data_dir(env: &SearchEnv) -> Option<PathBuf> {
        if let Some(dir) = env.var("POETRY_DATA_DIR") {
            return Some(PathBuf::from(dir));
        }
        if cfg!(windows) {
            return env.var("APPDATA").map(|d| PathBuf::from(d).join("pypoetry"));
        }
        if cfg!(target_os = "macos") {
            return env
                .home()
                .map(|h| h.join("Library/Application Support/pypoetry"));
        }
        if let Some(xdg) = env.var("XDG_DATA_HOME") {
            return Some(PathBuf::from(xdg).join("pypoetry"));
        }
        env.home().map(|h| h.join(".local/share/pypoetry"))
    }

    /// Directory holding Poetry's virtualenvs.
    ///
    /// # Arguments
    ///
    /// * `env` - Environment snapshot providing `POETRY_VIRTUALENVS_PATH`,
    ///   `POETRY_DATA_DIR` and the home directory
    ///
    /// # Returns
    ///
    /// `POETRY_VIRTUALENVS_PATH` if set, otherwise `virtualenvs` under the
    /// data directory; `None` if neither can be determined.
    pub fn virtualenvs_dir(env: &SearchEnv) -> Option<PathBuf> {
        if let Some(dir) = env.var("POETRY_VIRTUALENVS_PATH") {
            return Some(PathBuf::from(dir));
        }
        Self::data_dir(env).map(|d| d.join("virtualenvs"))
    }
}

#[async_trait]
impl ManagerHandler for PoetryHandler {
    fn id(&self) -> ManagerId {
        ManagerId::Poetry
    }

    fn common_paths(&self) -> &'static [&'static str] {
        COMMON_PATHS
    }

    /// Input is one directory entry name per line.
    fn parse_output(&self, raw: &str) -> Vec<PackageRecord> {
        lines(raw)
            .filter(|entry| !entry.starts_with('.') && !entry.contains(['/', '\\']))
            .filter_map(|entry| {
                let (name, version) = match VENV_NAME_RE.captures(entry) {
                    Some(caps) => (
                        caps.get(1).map_or(entry, |m| m.as_str()),
                        caps.get(2).map_or(UNKNOWN_VERSION, |m| m.as_str()),
                    ),
                    None => (entry, UNKNOWN_VERSION),
                };
                Some(
                    PackageRecord::new(name, version, ManagerId::Poetry, PackageLocation::Global)?
                        .with_environment(entry),
                )
            })
            .collect()
    }

    async fn list_packages(
        &self,
        ctx: &HandlerContext<'_>,
    ) -> Result<Vec<PackageRecord>, DiscoveryError> {
        let Some(dir) = Self::virtualenvs_dir(ctx.env) else {
            return Ok(Vec::new());
        };

        let read = async {
            let mut names = Vec::new();
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                if entry.file_type().await?.is_dir() {
                    names.push(entry.file_name().to_string_lossy().into_owned());
                }
            }
            Ok::<_, std::io::Error>(names)
        };

        let names = match timeout(ctx.timeout, read).await {
            Err(_) => {
                return Err(DiscoveryError::Timeout {
                    manager: ManagerId::Poetry,
                    duration: ctx.timeout,
                })
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %dir.display(), "no poetry virtualenvs directory");
                return Ok(Vec::new());
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(DiscoveryError::PermissionDenied {
                    manager: ManagerId::Poetry,
                    path: dir,
                })
            }
            Ok(Err(e)) => {
                return Err(DiscoveryError::Io {
                    manager: ManagerId::Poetry,
                    message: e.to_string(),
                })
            }
            Ok(Ok(mut names)) => {
                names.sort();
                names
            }
        };

        Ok(self.parse_output(&names.join("\n")))
    }

    async fn uninstall_package(
        &self,
        _ctx: &HandlerContext<'_>,
        _name: &str,
    ) -> Result<(), DiscoveryError> {
        Err(DiscoveryError::Unsupported {
            manager: ManagerId::Poetry,
            operation: "uninstall",
        })
    }
}
