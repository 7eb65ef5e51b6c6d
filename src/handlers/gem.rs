//! RubyGems.

use super::text::lines;
use super::{validate_package_name, HandlerContext, ManagerHandler};
use crate::{DiscoveryError, ManagerId, PackageLocation, PackageRecord};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

// `rake (13.1.0, default: 13.0.6)`
static GEM_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+) \(([^)]*)\)$").expect("Invalid gem line regex"));

#[cfg(not(windows))]
const COMMON_PATHS: &[&str] = &[
    "/opt/homebrew/opt/ruby/bin/gem",
    "/usr/local/opt/ruby/bin/gem",
    "~/.rbenv/shims/gem",
    "/usr/bin/gem",
];

#[cfg(windows)]
const COMMON_PATHS: &[&str] = &["C:\\Ruby32-x64\\bin\\gem.cmd", "C:\\Ruby31-x64\\bin\\gem.cmd"];

/// RubyGems handler: `gem list --local`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GemHandler;

#[async_trait]
impl ManagerHandler for GemHandler {
    fn id(&self) -> ManagerId {
        ManagerId::Gem
    }

    fn common_paths(&self) -> &'static [&'static str] {
        COMMON_PATHS
    }

    /// All installed versions of a gem stay in one record, comma-separated,
    /// with `default:` markers removed.
    fn parse_output(&self, raw: &str) -> Vec<PackageRecord> {
        lines(raw)
            .filter_map(|line| {
                let caps = GEM_LINE_RE.captures(line)?;
                let versions = caps[2]
                    .split(',')
                    .map(|v| v.trim().trim_start_matches("default:").trim())
                    .filter(|v| !v.is_empty())
                    .collect::<Vec<_>>()
                    .join(", ");
                PackageRecord::new(&caps[1], versions, ManagerId::Gem, PackageLocation::Global)
            })
            .collect()
    }

    async fn list_packages(
        &self,
        ctx: &HandlerContext<'_>,
    ) -> Result<Vec<PackageRecord>, DiscoveryError> {
        let raw = ctx.run(&["list", "--local"]).await?;
        Ok(self.parse_output(&raw))
    }

    async fn uninstall_package(
        &self,
        ctx: &HandlerContext<'_>,
        name: &str,
    ) -> Result<(), DiscoveryError> {
        let name = validate_package_name(name)?;
        ctx.run(&["uninstall", "-x", "-a", name]).await?;
        Ok(())
    }
}
