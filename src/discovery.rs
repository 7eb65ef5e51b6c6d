//! Package discovery facade.

use crate::config::Timeouts;
use crate::exec::{CommandExecutor, TokioCommandExecutor};
use crate::handlers::{default_handlers, HandlerContext, ManagerHandler};
use crate::{
    DiscoveryError, ListProgress, ManagerId, PackageManagerStatus, PackageRecord, PathCache,
    PathSearcher, ProbeState, SearchEnv, UserConfig,
};
use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::timeout;
use tracing::{info, warn};

/// Merged result of [`PackageDiscovery::list_all_packages`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageListing {
    /// Records from every manager that listed successfully, grouped by
    /// manager in registry order.
    pub packages: Vec<PackageRecord>,
    /// Managers whose listing failed, with the reason.
    pub failures: BTreeMap<ManagerId, String>,
    /// Managers that were not installed.
    pub unavailable: Vec<ManagerId>,
}

/// Coordinates discovery, listing and uninstalling across all managers.
///
/// Owns the handler registry, the path search and its session cache. The
/// user configuration is read once at construction; disabled managers are
/// left out of the registry entirely.
///
/// # Example
///
/// ```rust,no_run
/// use pkgmgr_discovery::{ManagerId, PackageDiscovery};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let discovery = PackageDiscovery::new();
///
///     for status in discovery.discover_available_managers().await {
///         println!("{}: {:?}", status.manager.display_name(), status.status);
///     }
///
///     let listing = discovery
///         .list_all_packages(|progress| println!("{:?}", progress))
///         .await;
///     println!("{} packages", listing.packages.len());
///
///     if let Ok(versions) = discovery.list_packages(ManagerId::Pyenv).await {
///         for v in versions {
///             println!("python {}", v.version());
///         }
///     }
/// }
/// ```
pub struct PackageDiscovery {
    handlers: BTreeMap<ManagerId, Arc<dyn ManagerHandler>>,
    searcher: PathSearcher,
    config: Arc<UserConfig>,
    timeouts: Timeouts,
    states: Mutex<HashMap<ManagerId, ProbeState>>,
}

impl PackageDiscovery {
    /// Facade over the real system: process environment, configuration from
    /// the default location, `tokio::process` execution.
    pub fn new() -> Self {
        let env = SearchEnv::from_process();
        let config = UserConfig::load_default(&env);
        Self::with_parts(Arc::new(TokioCommandExecutor), env, config)
    }

    /// Facade with the default handler set over the given parts.
    pub fn with_parts(
        executor: Arc<dyn CommandExecutor>,
        env: SearchEnv,
        config: UserConfig,
    ) -> Self {
        Self::with_handlers(executor, env, config, default_handlers())
    }

    /// Facade with an explicit handler set.
    ///
    /// Later handlers replace earlier ones with the same id.
    pub fn with_handlers(
        executor: Arc<dyn CommandExecutor>,
        env: SearchEnv,
        config: UserConfig,
        handlers: Vec<Arc<dyn ManagerHandler>>,
    ) -> Self {
        let timeouts = config.timeouts();
        let searcher = PathSearcher::new(
            executor,
            Arc::new(env),
            Arc::new(PathCache::new()),
            timeouts.probe,
        );
        let handlers = handlers
            .into_iter()
            .filter(|h| !config.is_disabled(h.id()))
            .map(|h| (h.id(), h))
            .collect();

        Self {
            handlers,
            searcher,
            config: Arc::new(config),
            timeouts,
            states: Mutex::default(),
        }
    }

    pub fn config(&self) -> &UserConfig {
        &self.config
    }

    pub fn cache(&self) -> &PathCache {
        self.searcher.cache()
    }

    /// Registered, enabled managers in registry order.
    pub fn managers(&self) -> impl Iterator<Item = ManagerId> + '_ {
        self.handlers.keys().copied()
    }

    /// Parse a manager id, checking it is registered and enabled.
    pub fn resolve_manager(&self, name: &str) -> Result<ManagerId, DiscoveryError> {
        let manager = ManagerId::from_str(name.trim()).map_err(|_| DiscoveryError::UnknownManager {
            name: name.to_string(),
        })?;
        self.ensure_registered(manager)?;
        Ok(manager)
    }

    /// Where `manager` is in its `unknown → probing → resolved` lifecycle.
    pub fn probe_state(&self, manager: ManagerId) -> ProbeState {
        self.lock_states()
            .get(&manager)
            .cloned()
            .unwrap_or(ProbeState::Unknown)
    }

    /// Forget every probe result and cached path.
    pub fn reset(&self) {
        self.lock_states().clear();
        self.cache().clear();
    }

    /// Probe every registered manager concurrently.
    ///
    /// A probe that crashes or exceeds its budget yields `not_installed` for
    /// that manager only. Managers already probed this session return their
    /// recorded status without probing again.
    pub async fn discover_available_managers(&self) -> Vec<PackageManagerStatus> {
        join_all(self.handlers.values().map(|h| self.status_of(Arc::clone(h)))).await
    }

    /// Status of one manager, probing it if needed.
    pub async fn get_manager_status(
        &self,
        manager: ManagerId,
    ) -> Result<PackageManagerStatus, DiscoveryError> {
        let handler = self.ensure_registered(manager)?;
        Ok(self.status_of(handler).await)
    }

    /// List packages from every installed manager concurrently.
    ///
    /// A manager whose listing fails contributes nothing and is reported in
    /// [`PackageListing::failures`]; the call itself always succeeds.
    /// `on_progress` receives a `Started` event and then a `Completed` or
    /// `Failed` event for each installed manager.
    pub async fn list_all_packages<F>(&self, on_progress: F) -> PackageListing
    where
        F: Fn(ListProgress) + Send + Sync,
    {
        let statuses = self.discover_available_managers().await;

        let mut listing = PackageListing::default();
        let mut pending = FuturesUnordered::new();
        for status in statuses {
            let manager = status.manager;
            let installed = status.is_installed();
            let (Some(path), Some(handler)) = (
                status.found_path.filter(|_| installed),
                self.handlers.get(&manager),
            ) else {
                listing.unavailable.push(manager);
                continue;
            };

            on_progress(ListProgress::Started { manager });
            if status.permission_denied {
                let error = DiscoveryError::PermissionDenied { manager, path }.to_string();
                warn!(%manager, %error, "listing skipped");
                on_progress(ListProgress::Failed {
                    manager,
                    error: error.clone(),
                });
                listing.failures.insert(manager, error);
                continue;
            }
            let task = self.list_isolated(Arc::clone(handler), path);
            pending.push(async move { (manager, task.await) });
        }

        let mut by_manager: BTreeMap<ManagerId, Vec<PackageRecord>> = BTreeMap::new();
        while let Some((manager, result)) = pending.next().await {
            match result {
                Ok(packages) => {
                    on_progress(ListProgress::Completed {
                        manager,
                        count: packages.len(),
                    });
                    by_manager.insert(manager, packages);
                }
                Err(e) => {
                    warn!(%manager, error = %e, "listing failed");
                    on_progress(ListProgress::Failed {
                        manager,
                        error: e.to_string(),
                    });
                    listing.failures.insert(manager, e.to_string());
                }
            }
        }

        listing.packages = by_manager.into_values().flatten().collect();
        info!(
            packages = listing.packages.len(),
            failed = listing.failures.len(),
            unavailable = listing.unavailable.len(),
            "listed packages"
        );
        listing
    }

    /// List packages from one manager.
    ///
    /// # Arguments
    ///
    /// * `manager` - The manager to list; probed first if not yet resolved
    ///
    /// # Returns
    ///
    /// The manager's package records, or a `DiscoveryError` if the manager is
    /// disabled, unknown, not installed, refused to run, or its listing
    /// command failed.
    pub async fn list_packages(
        &self,
        manager: ManagerId,
    ) -> Result<Vec<PackageRecord>, DiscoveryError> {
        let (handler, path) = self.installed(manager).await?;
        self.list_isolated(handler, path).await
    }

    /// Uninstall `name` through `manager`.
    ///
    /// # Arguments
    ///
    /// * `name` - Package name (for pyenv, the Python version)
    /// * `manager` - The manager that owns the package
    ///
    /// # Returns
    ///
    /// `Ok(())` once the manager's uninstall command exits successfully.
    pub async fn uninstall_package(
        &self,
        name: &str,
        manager: ManagerId,
    ) -> Result<(), DiscoveryError> {
        let (handler, path) = self.installed(manager).await?;
        let executor = Arc::clone(self.searcher.executor());
        let env = Arc::clone(self.searcher.env());
        let limit = self.timeouts.uninstall;
        let name = name.to_string();

        info!(%manager, package = %name, "uninstalling package");
        let task = tokio::spawn(async move {
            let ctx = HandlerContext {
                manager,
                executable: &path,
                executor: executor.as_ref(),
                env: &env,
                timeout: limit,
            };
            handler.uninstall_package(&ctx, &name).await
        });
        task.await.unwrap_or_else(|e| {
            Err(DiscoveryError::ProbeFailed {
                manager,
                message: e.to_string(),
            })
        })
    }

    fn ensure_registered(
        &self,
        manager: ManagerId,
    ) -> Result<Arc<dyn ManagerHandler>, DiscoveryError> {
        if self.config.is_disabled(manager) {
            return Err(DiscoveryError::Disabled { manager });
        }
        self.handlers
            .get(&manager)
            .cloned()
            .ok_or_else(|| DiscoveryError::UnknownManager {
                name: manager.to_string(),
            })
    }

    /// Handler and resolved executable of an installed manager.
    async fn installed(
        &self,
        manager: ManagerId,
    ) -> Result<(Arc<dyn ManagerHandler>, PathBuf), DiscoveryError> {
        let handler = self.ensure_registered(manager)?;
        let status = self.status_of(Arc::clone(&handler)).await;
        match status.found_path {
            Some(path) if status.permission_denied => {
                Err(DiscoveryError::PermissionDenied { manager, path })
            }
            Some(path) if status.is_installed() => Ok((handler, path)),
            _ => Err(DiscoveryError::NotInstalled { manager }),
        }
    }

    async fn status_of(&self, handler: Arc<dyn ManagerHandler>) -> PackageManagerStatus {
        let manager = handler.id();
        if let ProbeState::Resolved(status) = self.probe_state(manager) {
            return status;
        }

        self.set_state(manager, ProbeState::Probing);
        let status = self.probe_isolated(handler).await;
        info!(%manager, status = ?status.status, method = ?status.discovery_method, "manager probed");
        self.set_state(manager, ProbeState::Resolved(status.clone()));
        status
    }

    /// Run one manager's search in its own task, bounded by the probe budget.
    async fn probe_isolated(&self, handler: Arc<dyn ManagerHandler>) -> PackageManagerStatus {
        let manager = handler.id();
        let searcher = self.searcher.clone();
        let custom_paths = self.config.custom_paths_for(manager).to_vec();
        let budget = self.timeouts.probe_budget();

        let mut task = tokio::spawn(async move {
            let result = handler.locate(&searcher, &custom_paths).await;
            PackageManagerStatus::classify(manager, result.as_ref())
        });

        match timeout(budget, &mut task).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                warn!(%manager, error = %e, "probe crashed");
                PackageManagerStatus::failed(manager, format!("discovery failed: {e}"))
            }
            Err(_) => {
                task.abort();
                warn!(%manager, ?budget, "probe exceeded its budget");
                PackageManagerStatus::failed(manager, format!("discovery timed out after {budget:?}"))
            }
        }
    }

    /// Run one manager's listing in its own task.
    async fn list_isolated(
        &self,
        handler: Arc<dyn ManagerHandler>,
        path: PathBuf,
    ) -> Result<Vec<PackageRecord>, DiscoveryError> {
        let manager = handler.id();
        let executor = Arc::clone(self.searcher.executor());
        let env = Arc::clone(self.searcher.env());
        let limit = self.timeouts.list;

        let task = tokio::spawn(async move {
            let ctx = HandlerContext {
                manager,
                executable: &path,
                executor: executor.as_ref(),
                env: &env,
                timeout: limit,
            };
            handler.list_packages(&ctx).await
        });
        task.await.unwrap_or_else(|e| {
            Err(DiscoveryError::ProbeFailed {
                manager,
                message: e.to_string(),
            })
        })
    }

    fn set_state(&self, manager: ManagerId, state: ProbeState) {
        self.lock_states().insert(manager, state);
    }

    fn lock_states(&self) -> MutexGuard<'_, HashMap<ManagerId, ProbeState>> {
        self.states
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for PackageDiscovery {
    fn default() -> Self {
        Self::new()
    }
}
