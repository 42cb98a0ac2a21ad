//! Meson version detection.

use semver::Version;

use crate::builder::env::EnvironmentOverlay;
use crate::builder::errors::MesonError;
use crate::util::process::{CommandLine, ProcessRunner};

/// The command that reports Meson's version.
pub fn version_command() -> CommandLine {
    CommandLine::new("meson").arg("--version")
}

/// Run `meson --version` and parse the reported version.
pub fn get_version(runner: &dyn ProcessRunner) -> Result<Version, MesonError> {
    let command = version_command();
    let output = runner
        .run(&command, &EnvironmentOverlay::new())
        .map_err(|e| MesonError::VersionProbe(format!("{:#}", e)))?;

    if !output.is_success() {
        return Err(MesonError::VersionProbe(format!(
            "`{}` exited with {:?}: {}",
            command,
            output.code,
            output.stderr.trim()
        )));
    }

    let first_line = output.stdout.lines().next().unwrap_or("");
    let token = first_line.split_whitespace().last().unwrap_or("");
    parse_version(token).ok_or_else(|| {
        MesonError::VersionProbe(format!("unrecognized version output `{}`", first_line))
    })
}

/// Parse a Meson version string.
///
/// Accepts strict semver as well as two-part (`0.55`) and suffixed
/// (`1.3.0.dev1`, `1.2.0rc1`) versions, keeping the numeric core.
pub fn parse_version(raw: &str) -> Option<Version> {
    if let Ok(version) = Version::parse(raw) {
        return Some(version);
    }

    let numeric: String = raw
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let mut parts = numeric
        .split('.')
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u64>().ok());

    let major = parts.next()??;
    let minor = parts.next().flatten().unwrap_or(0);
    let patch = parts.next().flatten().unwrap_or(0);
    Some(Version::new(major, minor, patch))
}
