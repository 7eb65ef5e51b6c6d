//! Per-manager handlers.
//!
//! Every manager implements [`ManagerHandler`]: static identity (id,
//! executable, well-known install locations), a parser that turns raw command
//! output into [`PackageRecord`]s, and list/uninstall commands that run
//! against the executable the search resolved.

mod brew;
mod cargo;
mod composer;
mod conda;
mod gem;
mod npm;
mod pip;
mod pipx;
mod poetry;
mod pyenv;
mod text;

pub use brew::BrewHandler;
pub use cargo::CargoHandler;
pub use composer::ComposerHandler;
pub use conda::CondaHandler;
pub use gem::GemHandler;
pub use npm::NpmHandler;
pub use pip::PipHandler;
pub use pipx::PipxHandler;
pub use poetry::PoetryHandler;
pub use pyenv::PyenvHandler;

use crate::exec::{CommandExecutor, CommandOutcome, CommandOutput, SpawnFailure};
use crate::{DiscoveryError, ManagerId, PackageRecord, PathSearcher, SearchEnv, SearchResult};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Everything a handler needs to run its manager.
pub struct HandlerContext<'a> {
    /// Manager being run.
    pub manager: ManagerId,
    /// Executable resolved by the search.
    pub executable: &'a Path,
    pub executor: &'a dyn CommandExecutor,
    pub env: &'a SearchEnv,
    /// Timeout applied to each command.
    pub timeout: Duration,
}

impl HandlerContext<'_> {
    /// Run the manager and return its raw output.
    ///
    /// Timeouts and spawn failures become errors; the exit code is left to
    /// the caller.
    pub async fn run_raw(&self, args: &[&str]) -> Result<CommandOutput, DiscoveryError> {
        let program = self.executable.to_string_lossy();
        debug!(manager = %self.manager, ?args, "running manager command");
        let output = self.executor.execute(&program, args, self.timeout).await;
        match &output.outcome {
            CommandOutcome::Exited(_) => Ok(output),
            CommandOutcome::TimedOut => Err(DiscoveryError::Timeout {
                manager: self.manager,
                duration: self.timeout,
            }),
            CommandOutcome::SpawnFailed(SpawnFailure::PermissionDenied) => {
                Err(DiscoveryError::PermissionDenied {
                    manager: self.manager,
                    path: self.executable.to_path_buf(),
                })
            }
            CommandOutcome::SpawnFailed(SpawnFailure::NotFound) => {
                Err(DiscoveryError::NotInstalled {
                    manager: self.manager,
                })
            }
            CommandOutcome::SpawnFailed(SpawnFailure::Other(message)) => Err(DiscoveryError::Io {
                manager: self.manager,
                message: message.clone(),
            }),
        }
    }

    /// Run the manager and require exit code 0. Returns stdout.
    pub async fn run(&self, args: &[&str]) -> Result<String, DiscoveryError> {
        let output = self.run_raw(args).await?;
        if !output.success() {
            return Err(DiscoveryError::CommandFailed {
                manager: self.manager,
                exit_code: output.exit_code(),
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

/// Capabilities shared by every manager handler.
#[async_trait]
pub trait ManagerHandler: Send + Sync {
    /// Manager identifier; also the registry key.
    fn id(&self) -> ManagerId;

    fn display_name(&self) -> &'static str {
        self.id().display_name()
    }

    fn executable(&self) -> &'static str {
        self.id().executable_name()
    }

    /// Well-known install locations, in probe order.
    ///
    /// Entries may use `~`, `$VAR`, `${VAR}` or `%VAR%` placeholders.
    fn common_paths(&self) -> &'static [&'static str];

    /// Turn raw manager output into records. Never fails: unparseable input
    /// yields whatever entries could be recovered, possibly none.
    fn parse_output(&self, raw: &str) -> Vec<PackageRecord>;

    /// List installed packages.
    async fn list_packages(
        &self,
        ctx: &HandlerContext<'_>,
    ) -> Result<Vec<PackageRecord>, DiscoveryError>;

    /// Uninstall one package.
    async fn uninstall_package(
        &self,
        ctx: &HandlerContext<'_>,
        name: &str,
    ) -> Result<(), DiscoveryError>;

    /// Resolve this manager's executable through the tiered search.
    async fn locate(
        &self,
        searcher: &PathSearcher,
        custom_paths: &[String],
    ) -> Option<SearchResult> {
        searcher
            .find_executable(self.id(), self.executable(), self.common_paths(), custom_paths)
            .await
    }

    /// Whether the executable exists anywhere, on PATH or not.
    async fn check_availability(&self, searcher: &PathSearcher, custom_paths: &[String]) -> bool {
        self.locate(searcher, custom_paths).await.is_some()
    }
}

/// The full handler set, primary managers first.
pub fn default_handlers() -> Vec<Arc<dyn ManagerHandler>> {
    vec![
        Arc::new(BrewHandler),
        Arc::new(CondaHandler),
        Arc::new(PipxHandler),
        Arc::new(PoetryHandler),
        Arc::new(PyenvHandler),
        Arc::new(NpmHandler),
        Arc::new(PipHandler),
        Arc::new(ComposerHandler),
        Arc::new(CargoHandler),
        Arc::new(GemHandler),
    ]
}

/// Reject names a manager would read as a flag.
pub(crate) fn validate_package_name(name: &str) -> Result<&str, DiscoveryError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return Err(DiscoveryError::InvalidPackageName {
            name: name.to_string(),
        });
    }
    Ok(trimmed)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::exec::testing::ScriptedExecutor;

    #[test]
    fn test_default_handlers_cover_every_manager_once() {
        let ids: Vec<_> = default_handlers().iter().map(|h| h.id()).collect();
        let all: Vec<_> = ManagerId::all().collect();
        assert_eq!(ids, all);
    }

    #[test]
    fn test_every_parser_is_total() {
        for handler in default_handlers() {
            assert_parser_is_total(handler.as_ref());
        }
    }

    #[test]
    fn test_validate_package_name() {
        assert_eq!(validate_package_name(" wget ").unwrap(), "wget");
        assert!(validate_package_name("").is_err());
        assert!(validate_package_name("--force").is_err());
    }

    #[tokio::test]
    async fn test_run_maps_failures() {
        let env = SearchEnv::empty();

        let exec = ScriptedExecutor::new().reply(FAKE_EXE, CommandOutput::timed_out());
        let err = ctx(ManagerId::Pip, &exec, &env).run(&["list"]).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Timeout { .. }));

        let exec = ScriptedExecutor::new().reply(
            FAKE_EXE,
            CommandOutput::spawn_failed(SpawnFailure::PermissionDenied),
        );
        let err = ctx(ManagerId::Pip, &exec, &env).run(&["list"]).await.unwrap_err();
        assert_eq!(
            err,
            DiscoveryError::PermissionDenied {
                manager: ManagerId::Pip,
                path: Path::new(FAKE_EXE).to_path_buf(),
            }
        );

        let exec = ScriptedExecutor::new().reply(FAKE_EXE, CommandOutput::exited(2, "", " nope \n"));
        let err = ctx(ManagerId::Pip, &exec, &env).run(&["list"]).await.unwrap_err();
        assert_eq!(
            err,
            DiscoveryError::CommandFailed {
                manager: ManagerId::Pip,
                exit_code: Some(2),
                stderr: "nope".to_string(),
            }
        );
    }

    #[test]
    fn test_common_paths_are_declared() {
        for handler in default_handlers() {
            assert!(
                !handler.common_paths().is_empty(),
                "{} has no common paths",
                handler.display_name()
            );
        }
    }

    #[tokio::test]
    async fn test_check_availability_uses_search() {
        let exec = Arc::new(ScriptedExecutor::new().ok("pipx --version", "pipx 1.4.3"));
        let searcher = PathSearcher::new(
            exec,
            Arc::new(SearchEnv::empty()),
            Arc::new(crate::PathCache::new()),
            Duration::from_secs(1),
        );
        assert!(PipxHandler.check_availability(&searcher, &[]).await);
        assert!(!GemHandler.check_availability(&searcher, &[]).await);
        assert_eq!(searcher.cache().get_availability(ManagerId::Gem), Some(false));
    }
}
