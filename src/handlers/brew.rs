//! Homebrew formulas and casks.

use super::text::lines;
use super::{validate_package_name, HandlerContext, ManagerHandler};
use crate::{DiscoveryError, ManagerId, PackageLocation, PackageRecord};
use async_trait::async_trait;

#[cfg(not(windows))]
const COMMON_PATHS: &[&str] = &[
    "/opt/homebrew/bin/brew",
    "/usr/local/bin/brew",
    "/home/linuxbrew/.linuxbrew/bin/brew",
    "~/.linuxbrew/bin/brew",
    "$HOMEBREW_PREFIX/bin/brew",
];

#[cfg(windows)]
const COMMON_PATHS: &[&str] = &["%USERPROFILE%\\.linuxbrew\\bin\\brew.exe"];

/// Homebrew handler.
///
/// Lists formulas and casks concurrently with `brew list [--cask] --versions`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrewHandler;

impl BrewHandler {
    /// Parse `brew list --versions` output for one source list.
    ///
    /// Each line is `name version [version...]`; every version token after
    /// the name is kept, space-separated. Lines with no version, or whose
    /// first version token is not version-shaped, are skipped.
    pub fn parse_list(&self, raw: &str, location: PackageLocation) -> Vec<PackageRecord> {
        lines(raw)
            .filter(|line| !line.ends_with(':'))
            .filter_map(|line| {
                let mut tokens = line.split_whitespace();
                let name = tokens.next()?;
                if name.starts_with(['=', '#', '{', '[']) || name.ends_with(':') {
                    return None;
                }
                let versions: Vec<&str> = tokens.collect();
                // `1.21.4`, `HEAD-5c8e2f1`, `latest`; never `(most`.
                if !versions.first()?.starts_with(|c: char| c.is_ascii_alphanumeric()) {
                    return None;
                }
                let version = versions.join(" ");
                PackageRecord::new(name, version, ManagerId::Homebrew, location)
            })
            .collect()
    }
}

#[async_trait]
impl ManagerHandler for BrewHandler {
    fn id(&self) -> ManagerId {
        ManagerId::Homebrew
    }

    fn common_paths(&self) -> &'static [&'static str] {
        COMMON_PATHS
    }

    /// Output without a source marker is treated as the formula list.
    fn parse_output(&self, raw: &str) -> Vec<PackageRecord> {
        self.parse_list(raw, PackageLocation::Formula)
    }

    async fn list_packages(
        &self,
        ctx: &HandlerContext<'_>,
    ) -> Result<Vec<PackageRecord>, DiscoveryError> {
        let (formulas, casks) = futures::join!(
            ctx.run(&["list", "--versions"]),
            ctx.run(&["list", "--cask", "--versions"])
        );
        let mut packages = self.parse_list(&formulas?, PackageLocation::Formula);
        // Casks are macOS-only; Linuxbrew rejects the flag.
        match casks {
            Ok(raw) => packages.extend(self.parse_list(&raw, PackageLocation::Cask)),
            Err(DiscoveryError::CommandFailed { .. }) => {}
            Err(e) => return Err(e),
        }
        Ok(packages)
    }

    async fn uninstall_package(
        &self,
        ctx: &HandlerContext<'_>,
        name: &str,
    ) -> Result<(), DiscoveryError> {
        let name = validate_package_name(name)?;
        let is_cask = match ctx.run(&["list", "--cask", "--versions"]).await {
            Ok(raw) => self
                .parse_list(&raw, PackageLocation::Cask)
                .iter()
                .any(|p| p.name() == name),
            Err(DiscoveryError::CommandFailed { .. }) => false,
            Err(e) => return Err(e),
        };

        if is_cask {
            ctx.run(&["uninstall", "--cask", name]).await?;
        } else {
            ctx.run(&["uninstall", name]).await?;
        }
        Ok(())
    }
}
