//! Composer global packages.

use super::text::{lines, looks_like_json, str_field};
use super::{validate_package_name, HandlerContext, ManagerHandler};
use crate::{DiscoveryError, ManagerId, PackageLocation, PackageRecord};
use async_trait::async_trait;
use serde_json::Value;

#[cfg(not(windows))]
const COMMON_PATHS: &[&str] = &[
    "/opt/homebrew/bin/composer",
    "/usr/local/bin/composer",
    "/usr/bin/composer",
    "~/.composer/vendor/bin/composer",
];

#[cfg(windows)]
const COMMON_PATHS: &[&str] = &[
    "%ProgramData%\\ComposerSetup\\bin\\composer.bat",
    "%APPDATA%\\Composer\\vendor\\bin\\composer.bat",
];

/// Composer handler: `composer global show --format=json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComposerHandler;

fn record(entry: &Value) -> Option<PackageRecord> {
    let mut rec = PackageRecord::new(
        str_field(entry, "name")?,
        str_field(entry, "version")?,
        ManagerId::Composer,
        PackageLocation::Global,
    )?;
    if let Some(description) = str_field(entry, "description") {
        rec = rec.with_description(description);
    }
    if let Some(homepage) = str_field(entry, "homepage") {
        rec = rec.with_homepage(homepage);
    }
    Some(rec)
}

#[async_trait]
impl ManagerHandler for ComposerHandler {
    fn id(&self) -> ManagerId {
        ManagerId::Composer
    }

    fn common_paths(&self) -> &'static [&'static str] {
        COMMON_PATHS
    }

    fn parse_output(&self, raw: &str) -> Vec<PackageRecord> {
        if let Ok(doc) = serde_json::from_str::<Value>(raw) {
            if let Some(installed) = doc.get("installed").and_then(Value::as_array) {
                return installed.iter().filter_map(record).collect();
            }
        }

        // `vendor/package v1.2.3 Description text`
        lines(raw)
            .filter(|l| !looks_like_json(l))
            .filter_map(|line| {
                let mut parts = line.split_whitespace();
                let name = parts.next().filter(|n| n.contains('/'))?;
                let version = parts.next()?;
                let rec =
                    PackageRecord::new(name, version, ManagerId::Composer, PackageLocation::Global)?;
                Some(rec.with_description(parts.collect::<Vec<_>>().join(" ")))
            })
            .collect()
    }

    async fn list_packages(
        &self,
        ctx: &HandlerContext<'_>,
    ) -> Result<Vec<PackageRecord>, DiscoveryError> {
        let raw = ctx
            .run(&["global", "show", "--format=json", "--no-interaction"])
            .await?;
        Ok(self.parse_output(&raw))
    }

    async fn uninstall_package(
        &self,
        ctx: &HandlerContext<'_>,
        name: &str,
    ) -> Result<(), DiscoveryError> {
        let name = validate_package_name(name)?;
        ctx.run(&["global", "remove", name, "--no-interaction"])
            .await?;
        Ok(())
    }
}
