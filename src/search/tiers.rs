//! Tiered executable search.

use super::version::parse_version;
use super::{PathCache, SearchEnv};
use crate::exec::{CommandExecutor, CommandOutcome, SpawnFailure};
use crate::{DiscoveryMethod, ManagerId, SearchResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Locates manager executables and memoizes the answer in a [`PathCache`].
///
/// The tiers run in order and stop at the first hit:
///
/// 1. run the bare executable name with `--version` (ambient PATH)
/// 2. probe every match `which` finds along PATH
/// 3. probe user-configured custom paths, then the handler's common paths
///
/// Custom paths are probed before common paths; a hit there reports
/// [`DiscoveryMethod::CustomPath`], a hit on a common path reports
/// [`DiscoveryMethod::CommonPath`].
///
/// Cheap to clone; clones share the executor, environment and cache.
#[derive(Clone)]
pub struct PathSearcher {
    executor: Arc<dyn CommandExecutor>,
    env: Arc<SearchEnv>,
    cache: Arc<PathCache>,
    probe_timeout: Duration,
}

/// Outcome of verifying one candidate.
enum Attempt {
    Found(SearchResult),
    /// The file exists, but the OS refused to run it.
    Denied(SearchResult),
    Missed,
}

impl Attempt {
    /// Return a working hit; remember the first refused one.
    fn settle(self, denied: &mut Option<SearchResult>) -> Option<SearchResult> {
        match self {
            Self::Found(result) => Some(result),
            Self::Denied(result) => {
                denied.get_or_insert(result);
                None
            }
            Self::Missed => None,
        }
    }
}

impl PathSearcher {
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        env: Arc<SearchEnv>,
        cache: Arc<PathCache>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            executor,
            env,
            cache,
            probe_timeout,
        }
    }

    pub fn cache(&self) -> &Arc<PathCache> {
        &self.cache
    }

    pub fn env(&self) -> &Arc<SearchEnv> {
        &self.env
    }

    pub fn executor(&self) -> &Arc<dyn CommandExecutor> {
        &self.executor
    }

    /// Resolve a manager's executable, consulting the cache first.
    ///
    /// A miss on every tier is cached too, so later calls in the session do
    /// not repeat the full scan. An executable that exists but cannot be run
    /// is only returned (flagged `permission_denied`) when no tier found a
    /// working one.
    ///
    /// # Arguments
    ///
    /// * `manager` - Cache key and log field
    /// * `executable` - Bare executable name (e.g., "brew", "conda")
    /// * `common_paths` - Well-known install locations, probed last
    /// * `custom_paths` - User-configured locations, probed before `common_paths`
    ///
    /// # Returns
    ///
    /// `Some(SearchResult)` naming the tier that found the executable, or
    /// `None` if no tier did.
    pub async fn find_executable(
        &self,
        manager: ManagerId,
        executable: &str,
        common_paths: &[&str],
        custom_paths: &[String],
    ) -> Option<SearchResult> {
        if let Some(cached) = self.cache.get_path(manager) {
            debug!(%manager, ?cached, "path cache hit");
            return cached.into_result();
        }

        let result = self
            .search_tiers(manager, executable, common_paths, custom_paths)
            .await;

        self.cache.set_path(manager, result.clone());
        self.cache.set_availability(manager, result.is_some());
        result
    }

    async fn search_tiers(
        &self,
        manager: ManagerId,
        executable: &str,
        common_paths: &[&str],
        custom_paths: &[String],
    ) -> Option<SearchResult> {
        let mut denied = None;

        if let Some(result) = self.direct_command(manager, executable).await.settle(&mut denied) {
            return Some(result);
        }
        if let Some(result) = self.path_scan(manager, executable).await.settle(&mut denied) {
            return Some(result);
        }

        let candidates = custom_paths
            .iter()
            .map(|p| (p.as_str(), DiscoveryMethod::CustomPath))
            .chain(common_paths.iter().map(|p| (*p, DiscoveryMethod::CommonPath)));
        for (raw, method) in candidates {
            let Some(path) = self.env.expand(raw) else {
                debug!(%manager, candidate = raw, "skipping candidate with unset placeholder");
                continue;
            };
            let Some(path) = resolve_candidate(path, executable).await else {
                continue;
            };
            debug!(%manager, ?method, path = %path.display(), "probing candidate");
            let probe = self.probe(manager, &path, method).await;
            if let Some(result) = probe.settle(&mut denied) {
                return Some(result);
            }
        }

        if denied.is_none() {
            debug!(%manager, "not found by any tier");
        }
        denied
    }

    /// Tier 1.
    async fn direct_command(&self, manager: ManagerId, executable: &str) -> Attempt {
        let output = self
            .executor
            .execute(executable, &["--version"], self.probe_timeout)
            .await;
        let denied = matches!(
            output.outcome,
            CommandOutcome::SpawnFailed(SpawnFailure::PermissionDenied)
        );
        if !output.success() && !denied {
            return Attempt::Missed;
        }

        let path = match self.env.path_var() {
            Some(path_var) => which_all(executable, path_var.clone()).await.into_iter().next(),
            None => None,
        }
        .unwrap_or_else(|| PathBuf::from(executable));

        if denied {
            warn!(%manager, path = %path.display(), "permission denied running executable");
            return Attempt::Denied(SearchResult::blocked(path, DiscoveryMethod::DirectCommand));
        }
        debug!(%manager, path = %path.display(), "found by direct command");
        Attempt::Found(SearchResult {
            path,
            method: DiscoveryMethod::DirectCommand,
            version: parse_version(probe_text(&output.stdout, &output.stderr)),
            permission_denied: false,
        })
    }

    /// Tier 2.
    async fn path_scan(&self, manager: ManagerId, executable: &str) -> Attempt {
        let Some(path_var) = self.env.path_var() else {
            return Attempt::Missed;
        };

        let mut denied = None;
        for candidate in which_all(executable, path_var.clone()).await {
            let probe = self.probe(manager, &candidate, DiscoveryMethod::PathScan).await;
            if let Some(result) = probe.settle(&mut denied) {
                return Attempt::Found(result);
            }
        }
        denied.map_or(Attempt::Missed, Attempt::Denied)
    }

    /// Run `<path> --version`; success means the executable is real.
    async fn probe(&self, manager: ManagerId, path: &Path, method: DiscoveryMethod) -> Attempt {
        let program = path.to_string_lossy();
        let output = self
            .executor
            .execute(&program, &["--version"], self.probe_timeout)
            .await;

        match &output.outcome {
            CommandOutcome::Exited(Some(0)) => Attempt::Found(SearchResult {
                path: path.to_path_buf(),
                method,
                version: parse_version(probe_text(&output.stdout, &output.stderr)),
                permission_denied: false,
            }),
            CommandOutcome::SpawnFailed(SpawnFailure::PermissionDenied) => {
                warn!(%manager, path = %path.display(), "permission denied probing executable");
                Attempt::Denied(SearchResult::blocked(path, method))
            }
            CommandOutcome::TimedOut => {
                warn!(%manager, path = %path.display(), timeout = ?self.probe_timeout, "version probe timed out");
                Attempt::Missed
            }
            other => {
                debug!(%manager, path = %path.display(), outcome = ?other, "version probe failed");
                Attempt::Missed
            }
        }
    }
}

/// Some tools print their version on stderr.
fn probe_text<'a>(stdout: &'a str, stderr: &'a str) -> &'a str {
    if stdout.trim().is_empty() {
        stderr
    } else {
        stdout
    }
}

/// Every executable named `executable` along `path_var`, in PATH order.
///
/// `which` does the filesystem work, so it runs on the blocking pool.
async fn which_all(executable: &str, path_var: OsString) -> Vec<PathBuf> {
    let executable = executable.to_string();
    tokio::task::spawn_blocking(move || {
        let Ok(cwd) = std::env::current_dir() else {
            return Vec::new();
        };
        which::which_in_all(&executable, Some(path_var), cwd)
            .map(|found| found.collect::<Vec<_>>())
            .unwrap_or_default()
    })
    .await
    .unwrap_or_default()
}

/// A candidate may name the executable itself or the directory holding it.
///
/// # Returns
///
/// The executable's path if `which` accepts it, `None` otherwise.
async fn resolve_candidate(candidate: PathBuf, executable: &str) -> Option<PathBuf> {
    let executable = executable.to_string();
    tokio::task::spawn_blocking(move || {
        if candidate.is_dir() {
            let cwd = std::env::current_dir().ok()?;
            which::which_in(&executable, Some(&candidate), cwd).ok()
        } else {
            which::which(&candidate).ok()
        }
    })
    .await
    .ok()
    .flatten()
}
