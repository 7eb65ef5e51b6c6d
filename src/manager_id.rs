//! Manager identifiers for every supported package manager.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// The package manager a handler, status or package record belongs to.
///
/// The first five variants are the primary managers; the rest are legacy
/// ecosystem tools that share the same discovery and listing machinery.
///
/// Identifiers round-trip through their string form, which is also the key
/// used in the user configuration file:
///
/// ```rust
/// use pkgmgr_discovery::ManagerId;
///
/// assert_eq!("conda".parse::<ManagerId>().unwrap(), ManagerId::Conda);
/// assert_eq!(ManagerId::Homebrew.as_str(), "homebrew");
/// // `brew` is accepted as an alias
/// assert_eq!("brew".parse::<ManagerId>().unwrap(), ManagerId::Homebrew);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::EnumString,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ManagerId {
    /// Homebrew (`brew`), formulas and casks.
    #[serde(alias = "brew")]
    #[strum(to_string = "homebrew", serialize = "brew")]
    Homebrew,
    /// Conda / Miniconda / Anaconda.
    Conda,
    /// Pipx application virtualenvs.
    Pipx,
    /// Poetry project virtualenvs.
    Poetry,
    /// Pyenv-managed Python versions.
    Pyenv,
    /// npm global packages.
    Npm,
    /// pip packages of the default interpreter.
    Pip,
    /// Composer global packages.
    Composer,
    /// `cargo install` binaries.
    Cargo,
    /// RubyGems.
    Gem,
}

impl ManagerId {
    /// Stable identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Homebrew => "homebrew",
            Self::Conda => "conda",
            Self::Pipx => "pipx",
            Self::Poetry => "poetry",
            Self::Pyenv => "pyenv",
            Self::Npm => "npm",
            Self::Pip => "pip",
            Self::Composer => "composer",
            Self::Cargo => "cargo",
            Self::Gem => "gem",
        }
    }

    /// The executable name to search for.
    ///
    /// ```rust
    /// use pkgmgr_discovery::ManagerId;
    ///
    /// assert_eq!(ManagerId::Homebrew.executable_name(), "brew");
    /// assert_eq!(ManagerId::Pyenv.executable_name(), "pyenv");
    /// ```
    pub fn executable_name(&self) -> &'static str {
        match self {
            Self::Homebrew => "brew",
            Self::Conda => "conda",
            Self::Pipx => "pipx",
            Self::Poetry => "poetry",
            Self::Pyenv => "pyenv",
            Self::Npm => "npm",
            Self::Pip => "pip",
            Self::Composer => "composer",
            Self::Cargo => "cargo",
            Self::Gem => "gem",
        }
    }

    /// Human-readable display name for the manager.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Homebrew => "Homebrew",
            Self::Conda => "Conda",
            Self::Pipx => "pipx",
            Self::Poetry => "Poetry",
            Self::Pyenv => "pyenv",
            Self::Npm => "npm",
            Self::Pip => "pip",
            Self::Composer => "Composer",
            Self::Cargo => "Cargo",
            Self::Gem => "RubyGems",
        }
    }

    /// Whether this is one of the legacy ecosystem managers.
    pub fn is_legacy(&self) -> bool {
        matches!(
            self,
            Self::Npm | Self::Pip | Self::Composer | Self::Cargo | Self::Gem
        )
    }

    /// Iterator over all known managers, in registry order.
    ///
    /// ```rust
    /// use pkgmgr_discovery::ManagerId;
    ///
    /// assert_eq!(ManagerId::all().count(), 10);
    /// ```
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as IntoEnumIterator>::iter()
    }
}
