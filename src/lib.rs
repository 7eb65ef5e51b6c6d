//! # pkgmgr-discovery
//!
//! Discovery of locally installed package managers (Homebrew, Conda, pipx,
//! Poetry, pyenv and a few language-level managers) and of the packages they
//! installed.
//!
//! Managers are located through a tiered search that also finds executables
//! installed outside of `PATH`, a common situation for GUI-launched processes.
//! Each manager's output is parsed into uniform [`PackageRecord`]s.
//!
//! ## Features
//!
//! - [`ManagerId`] identifying supported managers
//! - [`PackageManagerStatus`] classifying each manager as available, off-PATH
//!   or not installed
//! - [`PackageDiscovery`] facade: discovery, aggregate and single-manager
//!   listing, and uninstalling
//! - [`UserConfig`] for custom install paths, disabled managers and timeouts
//! - Injectable [`CommandExecutor`] so every command can be scripted in tests
//!
//! ## Example
//!
//! ```rust,no_run
//! use pkgmgr_discovery::{ManagerState, PackageDiscovery};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let discovery = PackageDiscovery::new();
//!
//!     for status in discovery.discover_available_managers().await {
//!         if status.status == ManagerState::PathMissing {
//!             println!("{}", status.message.unwrap_or_default());
//!         }
//!     }
//!
//!     let listing = discovery.list_all_packages(|_| {}).await;
//!     for package in &listing.packages {
//!         println!("{} {} ({})", package.name(), package.version(), package.manager());
//!     }
//! }
//! ```

mod config;
mod discovery;
mod error;
pub mod exec;
pub mod handlers;
mod manager_id;
mod package;
mod progress;
mod search;
mod status;

pub use config::{
    Timeouts, UserConfig, CONFIG_PATH_ENV, DEFAULT_LIST_TIMEOUT, DEFAULT_PROBE_TIMEOUT,
    DEFAULT_UNINSTALL_TIMEOUT,
};
pub use discovery::{PackageDiscovery, PackageListing};
pub use error::DiscoveryError;
pub use exec::{CommandExecutor, CommandOutcome, CommandOutput, SpawnFailure, TokioCommandExecutor};
pub use handlers::{HandlerContext, ManagerHandler};
pub use manager_id::ManagerId;
pub use package::{PackageLocation, PackageRecord};
pub use progress::ListProgress;
pub use search::{CachedPath, PathCache, PathSearcher, SearchEnv};
pub use status::{DiscoveryMethod, ManagerState, PackageManagerStatus, ProbeState, SearchResult};
