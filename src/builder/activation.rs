//! Vendor toolchain environment activation.
//!
//! The Visual Studio compiler only works from an environment prepared by
//! `vcvarsall.bat`. A [`ToolchainActivation`] provider captures that
//! environment so it can be layered under the Meson/Ninja invocation.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::core::settings::SettingsView;

/// Variables worth carrying over from an activated toolchain environment.
pub const ACTIVATION_VARS: &[&str] = &["PATH", "INCLUDE", "LIB", "LIBPATH", "VSCMD_ARG_TGT_ARCH"];

/// Supplies the variables that activate a vendor toolchain.
pub trait ToolchainActivation {
    fn activation_vars(&self, settings: &dyn SettingsView) -> Result<BTreeMap<String, String>>;
}

/// Captures the environment produced by `vcvarsall.bat`.
#[derive(Debug, Clone, Default)]
pub struct VcvarsActivation;

/// `vcvarsall.bat` target argument for a settings architecture.
pub fn vcvars_arch(arch: Option<&str>) -> &'static str {
    match arch {
        Some("x86") => "x86",
        Some("armv7") => "x86_arm",
        Some("armv8") => "x86_arm64",
        _ => "x64",
    }
}

/// Parse `set` output into the variables listed in [`ACTIVATION_VARS`].
pub fn parse_set_output(output: &str) -> BTreeMap<String, String> {
    output
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_uppercase(), value.trim_end().to_string()))
        .filter(|(key, _)| ACTIVATION_VARS.contains(&key.as_str()))
        .collect()
}

#[cfg(target_os = "windows")]
impl ToolchainActivation for VcvarsActivation {
    fn activation_vars(&self, settings: &dyn SettingsView) -> Result<BTreeMap<String, String>> {
        use std::io::Write;
        use std::path::PathBuf;
        use std::process::Command;

        use anyhow::{bail, Context};

        let vswhere = find_vswhere().context("vswhere.exe not found")?;
        let output = Command::new(&vswhere)
            .args([
                "-latest",
                "-requires",
                "Microsoft.VisualStudio.Component.VC.Tools.x86.x64",
                "-property",
                "installationPath",
                "-format",
                "value",
            ])
            .output()
            .context("failed to run vswhere")?;
        let vs_path = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !output.status.success() || vs_path.is_empty() {
            bail!("vswhere found no Visual Studio installation with C++ tools");
        }

        let vcvarsall = PathBuf::from(vs_path)
            .join("VC")
            .join("Auxiliary")
            .join("Build")
            .join("vcvarsall.bat");
        if !vcvarsall.exists() {
            bail!("vcvarsall.bat not found at {}", vcvarsall.display());
        }

        let arch = vcvars_arch(settings.get_safe("arch").as_deref());
        tracing::info!("activating MSVC environment via {} {}", vcvarsall.display(), arch);

        // A batch file avoids cmd.exe quoting issues with the vcvarsall path
        let mut batch = tempfile::Builder::new()
            .prefix("harbour_vcvars")
            .suffix(".bat")
            .tempfile()
            .context("failed to create temporary batch file")?;
        write!(
            batch,
            "@echo off\r\ncall \"{}\" {} >nul 2>&1\r\nif errorlevel 1 exit /b 1\r\nset\r\n",
            vcvarsall.display(),
            arch
        )?;
        batch.flush()?;

        let output = Command::new("cmd")
            .arg("/c")
            .arg(batch.path())
            .output()
            .context("failed to run vcvarsall.bat")?;
        if !output.status.success() {
            bail!(
                "vcvarsall.bat failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }

        let vars = parse_set_output(&String::from_utf8_lossy(&output.stdout));
        if vars.get("PATH").map_or(true, |p| p.is_empty()) {
            bail!("vcvarsall.bat produced an empty PATH");
        }
        Ok(vars)
    }
}

#[cfg(not(target_os = "windows"))]
impl ToolchainActivation for VcvarsActivation {
    fn activation_vars(&self, _settings: &dyn SettingsView) -> Result<BTreeMap<String, String>> {
        anyhow::bail!("the Visual Studio environment can only be activated on Windows")
    }
}

/// Find vswhere.exe in its standard location or on PATH.
#[cfg(target_os = "windows")]
fn find_vswhere() -> Option<std::path::PathBuf> {
    let program_files_x86 = std::env::var("ProgramFiles(x86)")
        .unwrap_or_else(|_| "C:\\Program Files (x86)".to_string());

    let standard_path = std::path::PathBuf::from(&program_files_x86)
        .join("Microsoft Visual Studio")
        .join("Installer")
        .join("vswhere.exe");

    if standard_path.exists() {
        return Some(standard_path);
    }

    which::which("vswhere").ok()
}
