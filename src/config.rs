//! User configuration and timeouts.
//!
//! The configuration file is optional JSON:
//!
//! ```json
//! {
//!   "customPaths": { "conda": ["/data/miniforge3/bin/conda"] },
//!   "disabled": ["gem"],
//!   "timeout": 15000
//! }
//! ```
//!
//! A missing file, an unreadable file or a malformed document all yield the
//! defaults. Unknown manager ids are skipped with a warning.

use crate::{ManagerId, SearchEnv};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable that points at an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "PKGMGR_DISCOVERY_CONFIG";

const CONFIG_DIR_NAME: &str = "pkgmgr-discovery";
const CONFIG_FILE_NAME: &str = "config.json";

/// Default timeout for `--version` probes.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
/// Default timeout for listing commands.
pub const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(60);
/// Default timeout for uninstall commands.
pub const DEFAULT_UNINSTALL_TIMEOUT: Duration = Duration::from_secs(300);

/// A manager's whole discovery pass may take this many probe timeouts.
const PROBE_BUDGET_FACTOR: u32 = 4;

/// User configuration, loaded once per session.
///
/// ```rust
/// use pkgmgr_discovery::{ManagerId, UserConfig};
///
/// let config = UserConfig::from_json(r#"{"disabled": ["gem"], "timeout": 2000}"#).unwrap();
/// assert!(config.is_disabled(ManagerId::Gem));
/// assert_eq!(config.timeout_ms, Some(2000));
///
/// // Malformed input is an error here; `UserConfig::load` turns it into defaults.
/// assert!(UserConfig::from_json("{").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserConfig {
    /// Extra search locations per manager, highest priority first.
    pub custom_paths: BTreeMap<ManagerId, Vec<String>>,
    /// Managers excluded from discovery and listing.
    pub disabled: BTreeSet<ManagerId>,
    /// Command timeout override in milliseconds.
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default)]
    custom_paths: HashMap<String, Vec<String>>,
    #[serde(default)]
    disabled: Vec<String>,
    #[serde(default)]
    timeout: Option<u64>,
}

impl UserConfig {
    /// Parse a configuration document.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let raw: RawConfig = serde_json::from_str(text)?;

        let mut custom_paths = BTreeMap::new();
        for (key, paths) in raw.custom_paths {
            match ManagerId::from_str(&key) {
                Ok(id) => {
                    let paths: Vec<String> = paths
                        .into_iter()
                        .map(|p| p.trim().to_string())
                        .filter(|p| !p.is_empty())
                        .collect();
                    custom_paths.entry(id).or_insert_with(Vec::new).extend(paths);
                }
                Err(_) => warn!(manager = %key, "ignoring custom paths for unknown manager"),
            }
        }

        let mut disabled = BTreeSet::new();
        for key in raw.disabled {
            match ManagerId::from_str(&key) {
                Ok(id) => {
                    disabled.insert(id);
                }
                Err(_) => warn!(manager = %key, "ignoring unknown manager in disabled list"),
            }
        }

        Ok(Self {
            custom_paths,
            disabled,
            timeout_ms: raw.timeout.filter(|ms| *ms > 0),
        })
    }

    /// Load from `path`, falling back to defaults on any problem.
    ///
    /// # Arguments
    ///
    /// * `path` - Location of the JSON configuration file
    ///
    /// # Returns
    ///
    /// The parsed configuration, or `UserConfig::default()` if the file is
    /// missing, unreadable or malformed. Read and parse errors are logged.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no configuration file, using defaults");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read configuration, using defaults");
                return Self::default();
            }
        };

        match Self::from_json(&text) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed configuration, using defaults");
                Self::default()
            }
        }
    }

    /// Load from the default location for `env`.
    pub fn load_default(env: &SearchEnv) -> Self {
        match Self::default_path(env) {
            Some(path) => Self::load(&path),
            None => Self::default(),
        }
    }

    /// Where the configuration file is looked up.
    ///
    /// `$PKGMGR_DISCOVERY_CONFIG`, then `$XDG_CONFIG_HOME/pkgmgr-discovery/config.json`,
    /// then `%APPDATA%\pkgmgr-discovery\config.json` on Windows, then
    /// `~/.config/pkgmgr-discovery/config.json`.
    pub fn default_path(env: &SearchEnv) -> Option<PathBuf> {
        if let Some(explicit) = env.var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(explicit));
        }
        if let Some(xdg) = env.var("XDG_CONFIG_HOME") {
            return Some(Path::new(xdg).join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
        }
        if cfg!(windows) {
            if let Some(appdata) = env.var("APPDATA") {
                return Some(Path::new(appdata).join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
            }
        }
        env.home()
            .map(|home| home.join(".config").join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn is_disabled(&self, manager: ManagerId) -> bool {
        self.disabled.contains(&manager)
    }

    pub fn custom_paths_for(&self, manager: ManagerId) -> &[String] {
        self.custom_paths
            .get(&manager)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Effective timeouts after applying the override.
    pub fn timeouts(&self) -> Timeouts {
        match self.timeout_ms {
            Some(ms) => Timeouts::uniform(Duration::from_millis(ms)),
            None => Timeouts::default(),
        }
    }
}

/// Per-command timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub probe: Duration,
    pub list: Duration,
    pub uninstall: Duration,
}

impl Timeouts {
    /// The same timeout for every command.
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            probe: timeout,
            list: timeout,
            uninstall: timeout,
        }
    }

    /// Upper bound on one manager's whole discovery pass.
    pub fn probe_budget(&self) -> Duration {
        self.probe.saturating_mul(PROBE_BUDGET_FACTOR)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            probe: DEFAULT_PROBE_TIMEOUT,
            list: DEFAULT_LIST_TIMEOUT,
            uninstall: DEFAULT_UNINSTALL_TIMEOUT,
        }
    }
}
