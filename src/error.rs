//! Error types for single-manager operations.
//!
//! Aggregate operations (discovery, list-all) never return these; they fold
//! per-manager failures into their results instead. Explicit single-manager
//! calls surface them so the caller gets a definite success or failure.

use crate::ManagerId;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors reported by [`PackageDiscovery`](crate::PackageDiscovery) for
/// single-manager operations.
///
/// Every variant has an actionable [`fix_suggestion`](Self::fix_suggestion).
///
/// ```rust
/// use pkgmgr_discovery::{DiscoveryError, ManagerId};
///
/// let error = DiscoveryError::NotInstalled { manager: ManagerId::Conda };
/// assert_eq!(error.to_string(), "Conda is not installed");
/// assert!(!error.fix_suggestion().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DiscoveryError {
    /// The manager id is not known, or has no registered handler.
    #[error("Unknown package manager: {name}")]
    UnknownManager { name: String },

    /// The manager is disabled by the user configuration.
    #[error("{manager} is disabled in the configuration")]
    Disabled { manager: ManagerId },

    /// No search tier found the manager.
    #[error("{} is not installed", manager.display_name())]
    NotInstalled { manager: ManagerId },

    /// The manager's executable was found but could not be run.
    #[error("Permission denied running {}", path.display())]
    PermissionDenied { manager: ManagerId, path: PathBuf },

    /// A manager command did not finish in time.
    #[error("{manager} command timed out after {duration:?}")]
    Timeout { manager: ManagerId, duration: Duration },

    /// A manager command exited unsuccessfully.
    #[error("{manager} command failed with exit code {exit_code:?}: {stderr}")]
    CommandFailed {
        manager: ManagerId,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The manager does not support the requested operation.
    #[error("{operation} is not supported for {manager}")]
    Unsupported {
        manager: ManagerId,
        operation: &'static str,
    },

    /// The package name cannot be passed to a manager command.
    #[error("Invalid package name: {name:?}")]
    InvalidPackageName { name: String },

    /// Spawning a command or reading a directory failed.
    #[error("I/O error for {manager}: {message}")]
    Io { manager: ManagerId, message: String },

    /// The operation's task crashed.
    #[error("{manager} operation failed: {message}")]
    ProbeFailed { manager: ManagerId, message: String },
}

impl DiscoveryError {
    /// The manager this error is about, when there is one.
    pub fn manager(&self) -> Option<ManagerId> {
        match self {
            Self::UnknownManager { .. } | Self::InvalidPackageName { .. } => None,
            Self::Disabled { manager }
            | Self::NotInstalled { manager }
            | Self::PermissionDenied { manager, .. }
            | Self::Timeout { manager, .. }
            | Self::CommandFailed { manager, .. }
            | Self::Unsupported { manager, .. }
            | Self::Io { manager, .. }
            | Self::ProbeFailed { manager, .. } => Some(*manager),
        }
    }

    /// Actionable suggestion for resolving the error.
    pub fn fix_suggestion(&self) -> String {
        match self {
            Self::UnknownManager { .. } => {
                "Use one of: homebrew, conda, pipx, poetry, pyenv, npm, pip, composer, cargo, gem"
                    .to_string()
            }
            Self::Disabled { manager } => format!(
                "Remove \"{}\" from the \"disabled\" list in the configuration file",
                manager.as_str()
            ),
            Self::NotInstalled { manager } => format!(
                "Install {} or add its location to \"customPaths\"",
                manager.display_name()
            ),
            Self::PermissionDenied { path, .. } => {
                format!("Check the execute permission of {}", path.display())
            }
            Self::Timeout { .. } => "Increase \"timeout\" in the configuration file".to_string(),
            Self::CommandFailed { .. } => "See the command's error output for details".to_string(),
            Self::Unsupported { manager, .. } => format!(
                "Use {} directly for this operation",
                manager.display_name()
            ),
            Self::InvalidPackageName { .. } => {
                "Pass a non-empty package name that does not start with '-'".to_string()
            }
            Self::Io { .. } => "Check that the manager's files are readable".to_string(),
            Self::ProbeFailed { .. } => "Retry the operation".to_string(),
        }
    }
}
