//! Canonical package records produced by every manager handler.

use crate::ManagerId;
use serde::Serialize;

/// Where an installed package lives within its manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageLocation {
    /// Homebrew formula.
    Formula,
    /// Homebrew cask.
    Cask,
    /// Package inside a Conda environment.
    CondaEnv,
    /// Application installed into its own pipx virtualenv.
    PipxVenv,
    /// Python version managed by pyenv.
    PyenvVersion,
    /// Anything else (Poetry virtualenvs, legacy global installs).
    Global,
}

/// One installed package, normalized across managers.
///
/// Records are immutable once built. [`PackageRecord::new`] refuses empty
/// names or versions, so every record that exists satisfies that invariant.
///
/// ```rust
/// use pkgmgr_discovery::{ManagerId, PackageLocation, PackageRecord};
///
/// let rec = PackageRecord::new("numpy", "1.26.0", ManagerId::Conda, PackageLocation::CondaEnv)
///     .unwrap()
///     .with_channel("conda-forge");
/// assert_eq!(rec.channel(), Some("conda-forge"));
///
/// assert!(PackageRecord::new("  ", "1.0", ManagerId::Pip, PackageLocation::Global).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRecord {
    name: String,
    version: String,
    manager: ManagerId,
    location: PackageLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    homepage: Option<String>,
}

impl PackageRecord {
    /// Build a record, trimming `name` and `version`.
    ///
    /// Returns `None` when either is empty after trimming.
    pub fn new(
        name: impl AsRef<str>,
        version: impl AsRef<str>,
        manager: ManagerId,
        location: PackageLocation,
    ) -> Option<Self> {
        let name = name.as_ref().trim();
        let version = version.as_ref().trim();
        if name.is_empty() || version.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            version: version.to_string(),
            manager,
            location,
            channel: None,
            environment: None,
            description: None,
            homepage: None,
        })
    }

    pub fn with_channel(mut self, channel: impl AsRef<str>) -> Self {
        self.channel = non_empty(channel.as_ref());
        self
    }

    pub fn with_environment(mut self, environment: impl AsRef<str>) -> Self {
        self.environment = non_empty(environment.as_ref());
        self
    }

    pub fn with_description(mut self, description: impl AsRef<str>) -> Self {
        self.description = non_empty(description.as_ref());
        self
    }

    pub fn with_homepage(mut self, homepage: impl AsRef<str>) -> Self {
        self.homepage = non_empty(homepage.as_ref());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn manager(&self) -> ManagerId {
        self.manager
    }

    pub fn location(&self) -> PackageLocation {
        self.location
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref()
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_fields() {
        let rec =
            PackageRecord::new("  wget ", "1.21.4\n", ManagerId::Homebrew, PackageLocation::Formula)
                .unwrap();
        assert_eq!(rec.name(), "wget");
        assert_eq!(rec.version(), "1.21.4");
        assert_eq!(rec.manager(), ManagerId::Homebrew);
        assert_eq!(rec.location(), PackageLocation::Formula);
    }

    #[test]
    fn test_new_rejects_empty_name_or_version() {
        assert!(PackageRecord::new("", "1.0", ManagerId::Pip, PackageLocation::Global).is_none());
        assert!(PackageRecord::new("requests", "", ManagerId::Pip, PackageLocation::Global).is_none());
        assert!(PackageRecord::new("x", " \t", ManagerId::Pip, PackageLocation::Global).is_none());
    }

    #[test]
    fn test_blank_optional_fields_stay_none() {
        let rec = PackageRecord::new("numpy", "1.26.0", ManagerId::Conda, PackageLocation::CondaEnv)
            .unwrap()
            .with_channel(" ")
            .with_description("");
        assert!(rec.channel().is_none());
        assert!(rec.description().is_none());
    }

    #[test]
    fn test_serialize_shape() {
        let rec = PackageRecord::new("black", "24.1.0", ManagerId::Pipx, PackageLocation::PipxVenv)
            .unwrap();
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["manager"], "pipx");
        assert_eq!(json["location"], "pipx-venv");
        assert!(json.get("channel").is_none());
    }
}
