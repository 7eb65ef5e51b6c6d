//! npm global packages.

use super::text::lines;
use super::{validate_package_name, HandlerContext, ManagerHandler};
use crate::{DiscoveryError, ManagerId, PackageLocation, PackageRecord};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

// `├── typescript@5.3.3`, `└── @angular/cli@17.0.8`
static TREE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"((?:@[\w.-]+/)?[\w.-]+)@(\S+)$").expect("Invalid npm line regex")
});

#[cfg(not(windows))]
const COMMON_PATHS: &[&str] = &[
    "/opt/homebrew/bin/npm",
    "/usr/local/bin/npm",
    "/usr/bin/npm",
    "~/.volta/bin/npm",
    "$NVM_BIN/npm",
];

#[cfg(windows)]
const COMMON_PATHS: &[&str] = &[
    "%ProgramFiles%\\nodejs\\npm.cmd",
    "%APPDATA%\\npm\\npm.cmd",
];

/// npm handler: `npm ls -g --depth=0 --json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NpmHandler;

#[async_trait]
impl ManagerHandler for NpmHandler {
    fn id(&self) -> ManagerId {
        ManagerId::Npm
    }

    fn common_paths(&self) -> &'static [&'static str] {
        COMMON_PATHS
    }

    fn parse_output(&self, raw: &str) -> Vec<PackageRecord> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        if let Ok(doc) = serde_json::from_str::<Value>(raw) {
            if let Some(deps) = doc.get("dependencies").and_then(Value::as_object) {
                return deps
                    .iter()
                    .filter_map(|(name, body)| {
                        let version = body.get("version")?.as_str()?;
                        PackageRecord::new(name, version, ManagerId::Npm, PackageLocation::Global)
                    })
                    .collect();
            }
        }

        debug!("npm output is not the expected JSON, falling back to tree text");
        lines(raw)
            .filter_map(|line| {
                let caps = TREE_LINE_RE.captures(line)?;
                PackageRecord::new(&caps[1], &caps[2], ManagerId::Npm, PackageLocation::Global)
            })
            .collect()
    }

    /// npm exits non-zero on peer-dependency problems while still printing the
    /// full tree, so stdout is parsed whenever there is any.
    async fn list_packages(
        &self,
        ctx: &HandlerContext<'_>,
    ) -> Result<Vec<PackageRecord>, DiscoveryError> {
        let output = ctx.run_raw(&["ls", "-g", "--depth=0", "--json"]).await?;
        if !output.success() && output.stdout.trim().is_empty() {
            return Err(DiscoveryError::CommandFailed {
                manager: ManagerId::Npm,
                exit_code: output.exit_code(),
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(self.parse_output(&output.stdout))
    }

    async fn uninstall_package(
        &self,
        ctx: &HandlerContext<'_>,
        name: &str,
    ) -> Result<(), DiscoveryError> {
        let name = validate_package_name(name)?;
        ctx.run(&["uninstall", "-g", name]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::exec::testing::ScriptedExecutor;
    use crate::exec::CommandOutput;
    use crate::SearchEnv;

    #[test]
    fn test_parse_json_dependencies() {
        let raw = r#"{"name":"lib","dependencies":{"typescript":{"version":"5.3.3"},"@angular/cli":{"version":"17.0.8"},"broken":{}}}"#;
        let mut records = NpmHandler.parse_output(raw);
        records.sort_by(|a, b| a.name().cmp(b.name()));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name(), "@angular/cli");
        assert_eq!(records[1].version(), "5.3.3");
    }

    #[test]
    fn test_parse_tree_fallback() {
        let raw = "/usr/local/lib\n├── @angular/cli@17.0.8\n├── npm@10.2.4\n└── typescript@5.3.3\n";
        let records = NpmHandler.parse_output(raw);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name(), "@angular/cli");
        assert_eq!(records[0].version(), "17.0.8");
        assert_eq!(records[2].name(), "typescript");
    }

    #[test]
    fn test_parse_is_total() {
        assert_parser_is_total(&NpmHandler);
    }

    #[tokio::test]
    async fn test_list_uses_stdout_despite_nonzero_exit() {
        let exec = ScriptedExecutor::new().reply(
            &format!("{FAKE_EXE} ls -g --depth=0 --json"),
            CommandOutput::exited(
                1,
                r#"{"dependencies":{"typescript":{"version":"5.3.3"}}}"#,
                "npm ERR! peer dep missing",
            ),
        );
        let env = SearchEnv::empty();
        let records = NpmHandler
            .list_packages(&ctx(ManagerId::Npm, &exec, &env))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_list_fails_without_output() {
        let exec = ScriptedExecutor::new().reply(
            &format!("{FAKE_EXE} ls -g --depth=0 --json"),
            CommandOutput::exited(1, "", "npm ERR! broken"),
        );
        let env = SearchEnv::empty();
        let err = NpmHandler
            .list_packages(&ctx(ManagerId::Npm, &exec, &env))
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::CommandFailed { .. }));
    }
}
