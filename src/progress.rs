//! Progress events for aggregate package listing.

use crate::ManagerId;

/// One manager's listing transition, passed to the
/// [`list_all_packages`](crate::PackageDiscovery::list_all_packages) callback.
///
/// Events are informational; events for different managers can interleave
/// in any order.
///
/// ```rust
/// use pkgmgr_discovery::{ListProgress, ManagerId};
///
/// fn on_progress(progress: ListProgress) {
///     match &progress {
///         ListProgress::Started { manager } => println!("listing {}...", manager.display_name()),
///         ListProgress::Completed { manager, count } => {
///             println!("{}: {} packages", manager.display_name(), count)
///         }
///         ListProgress::Failed { manager, error } => {
///             println!("{} failed: {}", manager.display_name(), error)
///         }
///     }
/// }
/// # on_progress(ListProgress::Started { manager: ManagerId::Conda });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListProgress {
    /// Listing started for this manager.
    Started { manager: ManagerId },

    /// Listing finished.
    Completed {
        manager: ManagerId,
        /// Number of records the manager contributed.
        count: usize,
    },

    /// Listing failed; the manager contributes no records.
    Failed { manager: ManagerId, error: String },
}

impl ListProgress {
    pub fn manager(&self) -> ManagerId {
        match self {
            Self::Started { manager }
            | Self::Completed { manager, .. }
            | Self::Failed { manager, .. } => *manager,
        }
    }

    /// Short stage label.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Started { .. } => "starting",
            Self::Completed { .. } => "done",
            Self::Failed { .. } => "failed",
        }
    }

    /// Whether this is a terminal event for its manager.
    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::Started { .. })
    }
}
