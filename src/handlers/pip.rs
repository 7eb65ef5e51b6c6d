//! pip packages of the default interpreter.

use super::text::{lines, looks_like_json, recover_flat_objects, str_field};
use super::{validate_package_name, HandlerContext, ManagerHandler};
use crate::{DiscoveryError, ManagerId, PackageLocation, PackageRecord};
use async_trait::async_trait;
use serde_json::Value;

#[cfg(not(windows))]
const COMMON_PATHS: &[&str] = &[
    "~/.local/bin/pip",
    "~/.local/bin/pip3",
    "/opt/homebrew/bin/pip3",
    "/usr/local/bin/pip3",
    "/usr/bin/pip3",
];

#[cfg(windows)]
const COMMON_PATHS: &[&str] = &[
    "%LOCALAPPDATA%\\Programs\\Python\\Python312\\Scripts\\pip.exe",
    "%LOCALAPPDATA%\\Programs\\Python\\Python311\\Scripts\\pip.exe",
];

/// pip handler: `pip list --format=json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PipHandler;

fn record(entry: &Value) -> Option<PackageRecord> {
    PackageRecord::new(
        str_field(entry, "name")?,
        str_field(entry, "version")?,
        ManagerId::Pip,
        PackageLocation::Global,
    )
}

/// `pip list` columns output: header, dashes, then `name version [location]`.
fn parse_columns(raw: &str) -> Vec<PackageRecord> {
    lines(raw)
        .filter(|l| !l.starts_with('-') && !looks_like_json(l))
        .filter(|l| !l.starts_with("Package ") && !l.starts_with("WARNING") && !l.starts_with("[notice]"))
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let (name, version) = (cols.next()?, cols.next()?);
            PackageRecord::new(name, version, ManagerId::Pip, PackageLocation::Global)
        })
        .collect()
}

#[async_trait]
impl ManagerHandler for PipHandler {
    fn id(&self) -> ManagerId {
        ManagerId::Pip
    }

    fn common_paths(&self) -> &'static [&'static str] {
        COMMON_PATHS
    }

    fn parse_output(&self, raw: &str) -> Vec<PackageRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        if let Ok(Value::Array(entries)) = serde_json::from_str::<Value>(raw) {
            return entries.iter().filter_map(record).collect();
        }
        let recovered: Vec<_> = recover_flat_objects(raw).iter().filter_map(record).collect();
        if !recovered.is_empty() {
            return recovered;
        }
        parse_columns(raw)
    }

    async fn list_packages(
        &self,
        ctx: &HandlerContext<'_>,
    ) -> Result<Vec<PackageRecord>, DiscoveryError> {
        let raw = ctx
            .run(&["list", "--format=json", "--disable-pip-version-check"])
            .await?;
        Ok(self.parse_output(&raw))
    }

    async fn uninstall_package(
        &self,
        ctx: &HandlerContext<'_>,
        name: &str,
    ) -> Result<(), DiscoveryError> {
        let name = validate_package_name(name)?;
        ctx.run(&["uninstall", "-y", name]).await?;
        Ok(())
    }
}
