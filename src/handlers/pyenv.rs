//! pyenv-managed Python versions.

use super::text::lines;
use super::{validate_package_name, HandlerContext, ManagerHandler};
use crate::{DiscoveryError, ManagerId, PackageLocation, PackageRecord};
use async_trait::async_trait;

#[cfg(not(windows))]
const COMMON_PATHS: &[&str] = &[
    "$PYENV_ROOT/bin/pyenv",
    "~/.pyenv/bin/pyenv",
    "/opt/homebrew/bin/pyenv",
    "/usr/local/bin/pyenv",
];

#[cfg(windows)]
const COMMON_PATHS: &[&str] = &[
    "%PYENV%\\bin\\pyenv.bat",
    "%USERPROFILE%\\.pyenv\\pyenv-win\\bin\\pyenv.bat",
];

/// pyenv handler: `pyenv versions --bare`.
///
/// Every installed version becomes a record named `python`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PyenvHandler;

/// Extract the version from one line of `pyenv versions` output.
///
/// Accepts the bare form (`3.11.2`) and the decorated form
/// (`* 3.11.2 (set by /home/ada/.pyenv/version)`). The `system`
/// interpreter is not managed by pyenv and is skipped.
fn version_from_line(line: &str) -> Option<&str> {
    let line = line.strip_prefix('*').unwrap_or(line).trim_start();
    let version = line.split_whitespace().next()?;
    if version == "system" || !version.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(version)
}

#[async_trait]
impl ManagerHandler for PyenvHandler {
    fn id(&self) -> ManagerId {
        ManagerId::Pyenv
    }

    fn common_paths(&self) -> &'static [&'static str] {
        COMMON_PATHS
    }

    fn parse_output(&self, raw: &str) -> Vec<PackageRecord> {
        lines(raw)
            .filter_map(version_from_line)
            .filter_map(|version| {
                PackageRecord::new(
                    "python",
                    version,
                    ManagerId::Pyenv,
                    PackageLocation::PyenvVersion,
                )
            })
            .collect()
    }

    async fn list_packages(
        &self,
        ctx: &HandlerContext<'_>,
    ) -> Result<Vec<PackageRecord>, DiscoveryError> {
        let raw = ctx.run(&["versions", "--bare"]).await?;
        Ok(self.parse_output(&raw))
    }

    /// `name` is the version to remove.
    async fn uninstall_package(
        &self,
        ctx: &HandlerContext<'_>,
        name: &str,
    ) -> Result<(), DiscoveryError> {
        let version = validate_package_name(name)?;
        ctx.run(&["uninstall", "-f", version]).await?;
        Ok(())
    }
}
