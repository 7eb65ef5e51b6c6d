//! Search results and per-manager status classification.

use crate::ManagerId;
use semver::Version;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Which search tier located a manager's executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    /// Tier 1: the bare executable name ran through the ambient PATH.
    DirectCommand,
    /// Tier 2: found by scanning the PATH directories.
    PathScan,
    /// Tier 3: found at one of the handler's well-known install locations.
    CommonPath,
    /// Tier 4: found at a user-configured location.
    CustomPath,
}

impl DiscoveryMethod {
    /// Only the first two tiers mean the executable is reachable through PATH.
    pub fn is_in_path(&self) -> bool {
        matches!(self, Self::DirectCommand | Self::PathScan)
    }
}

/// A resolved executable location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Absolute path of the executable (or the bare name when Tier 1
    /// succeeded but the location could not be resolved).
    pub path: PathBuf,
    /// The tier that produced this result.
    pub method: DiscoveryMethod,
    /// Manager version parsed from the probe output, when recognizable.
    pub version: Option<Version>,
    /// The executable exists but the OS refused to run it.
    pub permission_denied: bool,
}

impl SearchResult {
    pub fn new(path: impl Into<PathBuf>, method: DiscoveryMethod) -> Self {
        Self {
            path: path.into(),
            method,
            version: None,
            permission_denied: false,
        }
    }

    /// An executable that exists but could not be run.
    pub fn blocked(path: impl Into<PathBuf>, method: DiscoveryMethod) -> Self {
        Self {
            permission_denied: true,
            ..Self::new(path, method)
        }
    }

    pub fn in_path(&self) -> bool {
        self.method.is_in_path()
    }
}

/// Coarse availability of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerState {
    /// Installed and reachable through PATH.
    Available,
    /// Installed, but only found outside PATH.
    PathMissing,
    /// Not found by any tier.
    NotInstalled,
}

/// Discovery status of one manager.
///
/// Built by [`PackageManagerStatus::classify`] from a search outcome, or by
/// [`PackageManagerStatus::failed`] when the probe itself crashed or timed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManagerStatus {
    pub manager: ManagerId,
    pub status: ManagerState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_method: Option<DiscoveryMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found_path: Option<PathBuf>,
    pub in_path: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    /// Found, but running it failed with permission denied.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub permission_denied: bool,
}

impl PackageManagerStatus {
    /// Classify a search outcome.
    ///
    /// ```rust
    /// use pkgmgr_discovery::{DiscoveryMethod, ManagerId, ManagerState, PackageManagerStatus, SearchResult};
    ///
    /// let found = SearchResult::new("/opt/homebrew/bin/brew", DiscoveryMethod::CommonPath);
    /// let status = PackageManagerStatus::classify(ManagerId::Homebrew, Some(&found));
    /// assert_eq!(status.status, ManagerState::PathMissing);
    /// assert!(!status.in_path);
    ///
    /// let status = PackageManagerStatus::classify(ManagerId::Homebrew, None);
    /// assert_eq!(status.status, ManagerState::NotInstalled);
    /// ```
    pub fn classify(manager: ManagerId, result: Option<&SearchResult>) -> Self {
        let Some(result) = result else {
            return Self::not_installed(manager, None);
        };

        let (status, message) = if result.permission_denied {
            let status = if result.method.is_in_path() {
                ManagerState::Available
            } else {
                ManagerState::PathMissing
            };
            (
                status,
                Some(format!(
                    "{} found but permission was denied running it; make it executable for the current user",
                    result.path.display()
                )),
            )
        } else if result.method.is_in_path() {
            (ManagerState::Available, None)
        } else {
            (
                ManagerState::PathMissing,
                Some(format!(
                    "{} found but not on PATH; add it to your shell PATH",
                    result.path.display()
                )),
            )
        };

        Self {
            manager,
            status,
            discovery_method: Some(result.method),
            found_path: Some(result.path.clone()),
            in_path: result.method.is_in_path(),
            message,
            version: result.version.clone(),
            permission_denied: result.permission_denied,
        }
    }

    /// Status for a manager whose lookup failed outright.
    pub fn failed(manager: ManagerId, reason: impl Into<String>) -> Self {
        Self::not_installed(manager, Some(reason.into()))
    }

    fn not_installed(manager: ManagerId, message: Option<String>) -> Self {
        Self {
            manager,
            status: ManagerState::NotInstalled,
            discovery_method: None,
            found_path: None,
            in_path: false,
            message,
            version: None,
            permission_denied: false,
        }
    }

    /// True when the executable exists at all (`available` or `path_missing`).
    pub fn is_installed(&self) -> bool {
        matches!(
            self.status,
            ManagerState::Available | ManagerState::PathMissing
        )
    }

    /// Path to use when running the manager.
    pub fn path(&self) -> Option<&Path> {
        self.found_path.as_deref()
    }
}

/// Per-session probe state of a manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeState {
    /// Not queried yet in this session.
    Unknown,
    /// A probe is running.
    Probing,
    /// Probed; the status is final for the session.
    Resolved(PackageManagerStatus),
}
