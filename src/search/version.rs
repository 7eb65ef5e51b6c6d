//! Manager version extraction from `--version` output.

use regex::Regex;
use semver::Version;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("Invalid version regex"));

/// Parse a manager version from probe output.
///
/// Handles the formats the supported managers print:
///
/// - `Homebrew 4.2.0` -> 4.2.0
/// - `conda 24.1.2` -> 24.1.2
/// - `Poetry (version 1.8.2)` -> 1.8.2
/// - `pip 24.0 from /usr/lib/python3/dist-packages/pip (python 3.12)` -> 24.0.0
///
/// Two-component versions get a zero patch. Leading zeros in a component
/// are tolerated. Returns `None` when nothing version-like is present.
pub(crate) fn parse_version(output: &str) -> Option<Version> {
    let caps = VERSION_RE.captures(output)?;
    let component = |i: usize| -> Option<u64> {
        caps.get(i)
            .map_or(Some(0), |m| m.as_str().parse::<u64>().ok())
    };
    Some(Version::new(component(1)?, component(2)?, component(3)?))
}
