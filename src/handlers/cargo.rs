//! Binaries installed with `cargo install`.

use super::{validate_package_name, HandlerContext, ManagerHandler};
use crate::{DiscoveryError, ManagerId, PackageLocation, PackageRecord};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

// `ripgrep v14.0.3:` or `mytool v0.1.0 (/home/ada/src/mytool):`
static CRATE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+) v(\S+?)(?: \(.*\))?:$").expect("Invalid cargo line regex")
});

#[cfg(not(windows))]
const COMMON_PATHS: &[&str] = &["$CARGO_HOME/bin/cargo", "~/.cargo/bin/cargo"];

#[cfg(windows)]
const COMMON_PATHS: &[&str] = &[
    "%CARGO_HOME%\\bin\\cargo.exe",
    "%USERPROFILE%\\.cargo\\bin\\cargo.exe",
];

/// Cargo handler: `cargo install --list`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CargoHandler;

#[async_trait]
impl ManagerHandler for CargoHandler {
    fn id(&self) -> ManagerId {
        ManagerId::Cargo
    }

    fn common_paths(&self) -> &'static [&'static str] {
        COMMON_PATHS
    }

    /// Only the unindented crate header lines matter; the indented binary
    /// names under each header are skipped.
    fn parse_output(&self, raw: &str) -> Vec<PackageRecord> {
        raw.lines()
            .filter(|line| !line.starts_with(char::is_whitespace))
            .filter_map(|line| {
                let caps = CRATE_LINE_RE.captures(line.trim_end())?;
                PackageRecord::new(&caps[1], &caps[2], ManagerId::Cargo, PackageLocation::Global)
            })
            .collect()
    }

    async fn list_packages(
        &self,
        ctx: &HandlerContext<'_>,
    ) -> Result<Vec<PackageRecord>, DiscoveryError> {
        let raw = ctx.run(&["install", "--list"]).await?;
        Ok(self.parse_output(&raw))
    }

    async fn uninstall_package(
        &self,
        ctx: &HandlerContext<'_>,
        name: &str,
    ) -> Result<(), DiscoveryError> {
        let name = validate_package_name(name)?;
        ctx.run(&["uninstall", name]).await?;
        Ok(())
    }
}
