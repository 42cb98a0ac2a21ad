//! Meson cross file synthesis.
//!
//! The cross file describes the host machine (and the build machine when
//! one is declared), the toolchain binaries, and the compiler flags. The
//! toolchain comes from the ambient `CC`/`CXX`/... variables; once written
//! into the cross file those variables must not reach Meson a second time,
//! see [`CROSS_CLEARED_VARS`].

use std::fmt::Write as _;
use std::path::Path;

use crate::builder::env::EnvironmentOverlay;
use crate::builder::errors::MesonError;
use crate::core::arch::resolve_arch;
use crate::core::settings::SettingsView;
use crate::util::fs::write_string;

/// Name of the generated cross file inside the build directory.
pub const CROSS_FILE_NAME: &str = "cross_file.txt";

/// Default `needs_exe_wrapper` value, written verbatim.
pub const DEFAULT_EXE_WRAPPER: &str = "false";

/// Variables unset for the Meson invocation once the cross file carries them.
pub const CROSS_CLEARED_VARS: &[&str] = &["CC", "CXX", "CFLAGS", "CXXFLAGS", "CPPFLAGS", "LDFLAGS"];

/// A `[build_machine]` or `[host_machine]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineDescriptor {
    pub system: String,
    pub cpu_family: String,
    pub cpu: String,
    pub endian: String,
}

impl MachineDescriptor {
    /// Describe the machine of a settings namespace (`os` + `arch`).
    pub fn from_settings(settings: &dyn SettingsView) -> Result<Self, MesonError> {
        let os = settings
            .get_safe("os")
            .ok_or_else(|| MesonError::MissingSetting("os".to_string()))?;
        let arch = settings
            .get_safe("arch")
            .ok_or_else(|| MesonError::MissingSetting("arch".to_string()))?;
        let triple = resolve_arch(&arch)?;

        Ok(MachineDescriptor {
            system: os.to_lowercase(),
            cpu_family: triple.cpu_family.to_string(),
            cpu: triple.cpu.to_string(),
            endian: triple.endian.as_str().to_string(),
        })
    }

    fn write_section(&self, out: &mut String, section: &str) {
        let _ = writeln!(out, "[{}]", section);
        let _ = writeln!(out, "system = {}", quote(&self.system));
        let _ = writeln!(out, "cpu_family = {}", quote(&self.cpu_family));
        let _ = writeln!(out, "cpu = {}", quote(&self.cpu));
        let _ = writeln!(out, "endian = {}", quote(&self.endian));
    }
}

/// Toolchain variables captured from the ambient environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainEnv {
    pub cc: Option<String>,
    pub cxx: Option<String>,
    pub ld: Option<String>,
    pub ar: Option<String>,
    pub strip: Option<String>,
    pub ranlib: Option<String>,
    pub cflags: Option<String>,
    pub cxxflags: Option<String>,
}

impl ToolchainEnv {
    /// Capture from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Capture through an arbitrary lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        ToolchainEnv {
            cc: lookup("CC"),
            cxx: lookup("CXX"),
            ld: lookup("LD"),
            ar: lookup("AR"),
            strip: lookup("STRIP"),
            ranlib: lookup("RANLIB"),
            cflags: lookup("CFLAGS"),
            cxxflags: lookup("CXXFLAGS"),
        }
    }
}

/// Paths of the `[binaries]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binaries {
    pub c: String,
    pub cpp: String,
    pub ar: String,
    pub ld: String,
    pub strip: String,
    pub ranlib: String,
    pub pkgconfig: String,
}

impl Binaries {
    fn from_env(env: &ToolchainEnv) -> Self {
        let or = |value: &Option<String>, default: &str| {
            value.clone().unwrap_or_else(|| default.to_string())
        };
        Binaries {
            c: or(&env.cc, "cc"),
            cpp: or(&env.cxx, "c++"),
            ar: or(&env.ar, "ar"),
            ld: or(&env.ld, "ld"),
            strip: or(&env.strip, "strip"),
            ranlib: or(&env.ranlib, "ranlib"),
            pkgconfig: "pkg-config".to_string(),
        }
    }
}

/// Complete cross-compilation description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossFile {
    pub build_machine: Option<MachineDescriptor>,
    pub host_machine: MachineDescriptor,
    pub needs_exe_wrapper: String,
    pub c_args: Vec<String>,
    pub cpp_args: Vec<String>,
    pub pkg_config_libdir: String,
    pub binaries: Binaries,
}

impl CrossFile {
    /// Describe a cross build of `host` from `build` (when declared).
    pub fn new(
        host: &dyn SettingsView,
        build: Option<&dyn SettingsView>,
        toolchain: &ToolchainEnv,
        pkg_config_libdir: impl Into<String>,
        exe_wrapper: impl Into<String>,
    ) -> Result<Self, MesonError> {
        let build_machine = build
            .map(|b| MachineDescriptor::from_settings(b))
            .transpose()?;
        let host_machine = MachineDescriptor::from_settings(host)?;

        Ok(CrossFile {
            build_machine,
            host_machine,
            needs_exe_wrapper: exe_wrapper.into(),
            c_args: split_flags(toolchain.cflags.as_deref()),
            cpp_args: split_flags(toolchain.cxxflags.as_deref()),
            pkg_config_libdir: pkg_config_libdir.into(),
            binaries: Binaries::from_env(toolchain),
        })
    }

    /// Render in Meson's machine file format.
    pub fn render(&self) -> String {
        let mut out = String::new();

        if let Some(ref build) = self.build_machine {
            build.write_section(&mut out, "build_machine");
            out.push('\n');
        }
        self.host_machine.write_section(&mut out, "host_machine");
        out.push('\n');

        let _ = writeln!(out, "[properties]");
        let _ = writeln!(out, "needs_exe_wrapper = {}", quote(&self.needs_exe_wrapper));
        let _ = writeln!(out, "cpp_args = {}", quote_list(&self.cpp_args));
        let _ = writeln!(out, "c_args = {}", quote_list(&self.c_args));
        let _ = writeln!(out, "pkg_config_libdir={}", quote(&self.pkg_config_libdir));
        out.push('\n');

        let b = &self.binaries;
        let _ = writeln!(out, "[binaries]");
        let _ = writeln!(out, "c = {}", quote(&b.c));
        let _ = writeln!(out, "cpp = {}", quote(&b.cpp));
        let _ = writeln!(out, "ar = {}", quote(&b.ar));
        let _ = writeln!(out, "ld = {}", quote(&b.ld));
        let _ = writeln!(out, "strip = {}", quote(&b.strip));
        let _ = writeln!(out, "ranlib = {}", quote(&b.ranlib));
        let _ = writeln!(out, "pkgconfig = {}", quote(&b.pkgconfig));

        out
    }

    /// Write the rendered file, replacing previous contents.
    pub fn write(&self, path: &Path) -> Result<(), MesonError> {
        tracing::debug!("writing cross file {}", path.display());
        write_string(path, &self.render()).map_err(|source| MesonError::CrossFileWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Unset every toolchain variable the cross file now carries.
pub fn clear_toolchain_vars(overlay: &mut EnvironmentOverlay) {
    for var in CROSS_CLEARED_VARS {
        overlay.unset(*var);
    }
}

/// Split a flags variable on single spaces.
///
/// An unset or empty variable yields one empty token, rendered as `['']`.
fn split_flags(flags: Option<&str>) -> Vec<String> {
    flags.unwrap_or("").split(' ').map(str::to_string).collect()
}

fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('\'');
    quoted
}

fn quote_list(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| quote(v)).collect();
    format!("[{}]", items.join(", "))
}
