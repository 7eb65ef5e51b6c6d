//! Conda packages.

use super::text::{lines, looks_like_json, recover_flat_objects, str_field};
use super::{validate_package_name, HandlerContext, ManagerHandler};
use crate::{DiscoveryError, ManagerId, PackageLocation, PackageRecord};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

#[cfg(not(windows))]
const COMMON_PATHS: &[&str] = &[
    "$CONDA_EXE",
    "~/miniconda3/bin/conda",
    "~/anaconda3/bin/conda",
    "~/miniforge3/bin/conda",
    "~/mambaforge/bin/conda",
    "/opt/homebrew/Caskroom/miniconda/base/bin/conda",
    "/usr/local/Caskroom/miniconda/base/bin/conda",
    "/opt/miniconda3/bin/conda",
    "/opt/anaconda3/bin/conda",
    "/opt/conda/bin/conda",
];

#[cfg(windows)]
const COMMON_PATHS: &[&str] = &[
    "%CONDA_EXE%",
    "%USERPROFILE%\\miniconda3\\Scripts\\conda.exe",
    "%USERPROFILE%\\anaconda3\\Scripts\\conda.exe",
    "%USERPROFILE%\\miniforge3\\Scripts\\conda.exe",
    "%PROGRAMDATA%\\miniconda3\\Scripts\\conda.exe",
    "%PROGRAMDATA%\\anaconda3\\Scripts\\conda.exe",
];

/// Conda handler: `conda list --json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CondaHandler;

fn record(entry: &Value) -> Option<PackageRecord> {
    let name = str_field(entry, "name")?;
    let version = str_field(entry, "version")?;
    let rec = PackageRecord::new(name, version, ManagerId::Conda, PackageLocation::CondaEnv)?;
    Some(match str_field(entry, "channel") {
        Some(channel) => rec.with_channel(channel),
        None => rec,
    })
}

/// `conda list` table: `name version build [channel]`, `#` comments.
fn parse_table(raw: &str) -> Vec<PackageRecord> {
    lines(raw)
        .filter(|l| !l.starts_with('#') && !looks_like_json(l))
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            let (name, version) = (cols.first()?, cols.get(1)?);
            let rec =
                PackageRecord::new(name, version, ManagerId::Conda, PackageLocation::CondaEnv)?;
            Some(match cols.get(3) {
                Some(channel) => rec.with_channel(channel),
                None => rec,
            })
        })
        .collect()
}

#[async_trait]
impl ManagerHandler for CondaHandler {
    fn id(&self) -> ManagerId {
        ManagerId::Conda
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

        debug!("conda output is not a JSON array, recovering");
        let recovered: Vec<_> = recover_flat_objects(raw).iter().filter_map(record).collect();
        if !recovered.is_empty() {
            return recovered;
        }
        parse_table(raw)
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
        ctx.run(&["remove", "-y", name]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::exec::testing::ScriptedExecutor;
    use crate::SearchEnv;

    #[test]
    fn test_parse_json_array() {
        let raw = r#"[{"name":"numpy","version":"1.26.0","channel":"conda-forge"}]"#;
        let records = CondaHandler.parse_output(raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), "numpy");
        assert_eq!(records[0].version(), "1.26.0");
        assert_eq!(records[0].manager(), ManagerId::Conda);
        assert_eq!(records[0].channel(), Some("conda-forge"));
        assert_eq!(records[0].location(), PackageLocation::CondaEnv);
    }

    #[test]
    fn test_parse_skips_entries_missing_fields() {
        let raw = r#"[{"name":"numpy"},{"version":"1.0"},{"name":"","version":"1"},{"name":"pip","version":"23.3.1","channel":"pkgs/main"}]"#;
        let records = CondaHandler.parse_output(raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), "pip");
    }

    #[test]
    fn test_parse_truncated_json_recovers_complete_entries() {
        let raw = r#"[{"name":"numpy","version":"1.26.0","channel":"conda-forge"},{"name":"pan"#;
        let records = CondaHandler.parse_output(raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), "numpy");
    }

    #[test]
    fn test_parse_text_table_fallback() {
        let raw = "# packages in environment at /opt/conda:\n#\n# Name   Version   Build  Channel\nnumpy    1.26.0    py311h  conda-forge\nzlib     1.2.13    h5eee18b\n";
        let records = CondaHandler.parse_output(raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].channel(), Some("conda-forge"));
        assert_eq!(records[1].name(), "zlib");
        assert_eq!(records[1].channel(), None);
    }

    #[test]
    fn test_parse_is_total() {
        assert_parser_is_total(&CondaHandler);
    }

    #[tokio::test]
    async fn test_list_and_uninstall_commands() {
        let exec = ScriptedExecutor::new()
            .ok(
                &format!("{FAKE_EXE} list --json"),
                r#"[{"name":"numpy","version":"1.26.0","channel":"conda-forge"}]"#,
            )
            .ok(&format!("{FAKE_EXE} remove -y numpy"), "");
        let env = SearchEnv::empty();
        let ctx = ctx(ManagerId::Conda, &exec, &env);

        assert_eq!(CondaHandler.list_packages(&ctx).await.unwrap().len(), 1);
        CondaHandler.uninstall_package(&ctx, "numpy").await.unwrap();
        assert!(exec.calls().contains(&format!("{FAKE_EXE} remove -y numpy")));
    }
}
