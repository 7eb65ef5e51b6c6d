//! pipx application virtualenvs.

use super::text::lines;
use super::{validate_package_name, HandlerContext, ManagerHandler};
use crate::{DiscoveryError, ManagerId, PackageLocation, PackageRecord};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

// `   package black 24.1.0, installed using Python 3.12.1`
static PACKAGE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^package\s+(\S+)\s+([^\s,]+)").expect("Invalid pipx line regex")
});

#[cfg(not(windows))]
const COMMON_PATHS: &[&str] = &[
    "~/.local/bin/pipx",
    "/opt/homebrew/bin/pipx",
    "/usr/local/bin/pipx",
    "/usr/bin/pipx",
];

#[cfg(windows)]
const COMMON_PATHS: &[&str] = &[
    "%USERPROFILE%\\.local\\bin\\pipx.exe",
    "%APPDATA%\\Python\\Scripts\\pipx.exe",
];

/// pipx handler: `pipx list --json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PipxHandler;

fn from_json(doc: &Value) -> Option<Vec<PackageRecord>> {
    let venvs = doc.get("venvs")?.as_object()?;
    Some(
        venvs
            .iter()
            .filter_map(|(venv, body)| {
                let main = body.get("metadata")?.get("main_package")?;
                let name = main
                    .get("package")
                    .and_then(Value::as_str)
                    .unwrap_or(venv);
                let version = main.get("package_version")?.as_str()?;
                PackageRecord::new(name, version, ManagerId::Pipx, PackageLocation::PipxVenv)
            })
            .collect(),
    )
}

fn from_text(raw: &str) -> Vec<PackageRecord> {
    lines(raw)
        .filter_map(|line| {
            let caps = PACKAGE_LINE_RE.captures(line)?;
            PackageRecord::new(
                &caps[1],
                &caps[2],
                ManagerId::Pipx,
                PackageLocation::PipxVenv,
            )
        })
        .collect()
}

#[async_trait]
impl ManagerHandler for PipxHandler {
    fn id(&self) -> ManagerId {
        ManagerId::Pipx
    }

    fn common_paths(&self) -> &'static [&'static str] {
        COMMON_PATHS
    }

    fn parse_output(&self, raw: &str) -> Vec<PackageRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        if let Some(records) = serde_json::from_str::<Value>(raw)
            .ok()
            .as_ref()
            .and_then(from_json)
        {
            return records;
        }
        debug!("pipx output is not the expected JSON, falling back to text");
        from_text(raw)
    }

    async fn list_packages(
        &self,
        ctx: &HandlerContext<'_>,
    ) -> Result<Vec<PackageRecord>, DiscoveryError> {
        let raw = ctx.run(&["list", "--json"]).await?;
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

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::exec::testing::ScriptedExecutor;
    use crate::SearchEnv;

    const LIST_JSON: &str = r#"{
        "pipx_spec_version": "0.1",
        "venvs": {
            "black": {
                "metadata": {
                    "main_package": {"package": "black", "package_version": "24.1.0"},
                    "python_version": "Python 3.12.1"
                }
            },
            "httpie": {
                "metadata": {
                    "main_package": {"package": "httpie", "package_version": "3.2.2"}
                }
            },
            "broken": {"metadata": {}}
        }
    }"#;

    #[test]
    fn test_parse_json_venvs() {
        let mut records = PipxHandler.parse_output(LIST_JSON);
        records.sort_by(|a, b| a.name().cmp(b.name()));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name(), "black");
        assert_eq!(records[0].version(), "24.1.0");
        assert_eq!(records[0].location(), PackageLocation::PipxVenv);
        assert_eq!(records[1].name(), "httpie");
    }

    #[test]
    fn test_parse_zero_venvs() {
        assert!(PipxHandler.parse_output(r#"{"venvs":{}}"#).is_empty());
    }

    #[test]
    fn test_parse_text_fallback() {
        let raw = "venvs are in /home/ada/.local/pipx/venvs\n   package black 24.1.0, installed using Python 3.12.1\n    - black\n   package ruff 0.1.9, installed using Python 3.12.1\n";
        let records = PipxHandler.parse_output(raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name(), "ruff");
        assert_eq!(records[1].version(), "0.1.9");
    }

    #[test]
    fn test_parse_truncated_json() {
        let truncated = &LIST_JSON[..LIST_JSON.len() / 2];
        // Nothing recoverable, but no panic either.
        assert!(PipxHandler.parse_output(truncated).is_empty());
    }

    #[test]
    fn test_parse_is_total() {
        assert_parser_is_total(&PipxHandler);
    }

    #[tokio::test]
    async fn test_uninstall_command() {
        let exec = ScriptedExecutor::new().ok(&format!("{FAKE_EXE} uninstall black"), "");
        let env = SearchEnv::empty();
        PipxHandler
            .uninstall_package(&ctx(ManagerId::Pipx, &exec, &env), "black")
            .await
            .unwrap();
    }
}
