//! Meson build adapter.
//!
//! Translates package settings into a `meson` configure invocation and
//! drives the configure → build → install → test lifecycle through Ninja
//! (or Meson's own `install`/`test` subcommands).

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::builder::activation::{ToolchainActivation, VcvarsActivation};
use crate::builder::cross_file::{
    clear_toolchain_vars, CrossFile, ToolchainEnv, CROSS_FILE_NAME, DEFAULT_EXE_WRAPPER,
};
use crate::builder::env::{
    activation_layer, needs_toolchain_activation, EnvScope, EnvironmentOverlay,
};
use crate::builder::errors::MesonError;
use crate::builder::options::{plan_options, OptionPlan};
use crate::core::platform::{cross_building, Platform};
use crate::core::settings::SettingsView;
use crate::core::PackageContext;
use crate::util::fs::{absolute_path, ensure_dir, join_path_list};
use crate::util::process::{CommandLine, ProcessRunner};
use crate::util::shell::{Shell, Status};

/// The only backend whose targets this adapter knows how to invoke.
pub const NINJA_BACKEND: &str = "ninja";

/// Construction-time configuration of the adapter.
#[derive(Debug, Clone)]
pub struct MesonConfig {
    /// Meson backend (`ninja`, `vs`, `vs2017`, `xcode`, ...)
    pub backend: String,
    /// Build type overriding the settings' `build_type`
    pub build_type: Option<String>,
    /// `needs_exe_wrapper` value written into cross files
    pub exe_wrapper: String,
    /// Append activation path lists instead of prepending them
    pub append_vcvars: bool,
    /// Machine this process runs on
    pub running_platform: Platform,
    /// Build-tool variables layered under every invocation
    pub tool_env: EnvironmentOverlay,
    /// Ambient toolchain variables used for cross files
    pub toolchain_env: ToolchainEnv,
}

impl Default for MesonConfig {
    fn default() -> Self {
        MesonConfig {
            backend: NINJA_BACKEND.to_string(),
            build_type: None,
            exe_wrapper: DEFAULT_EXE_WRAPPER.to_string(),
            append_vcvars: false,
            running_platform: Platform::detect(),
            tool_env: EnvironmentOverlay::new(),
            toolchain_env: ToolchainEnv::from_env(),
        }
    }
}

/// Where the adapter is in the build lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unconfigured,
    Configured,
    Built,
    Installed,
}

/// Result of a lifecycle call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// The phase flag was off; nothing ran.
    Skipped,
    /// The command ran and succeeded.
    Completed,
}

/// Arguments of [`Meson::configure`].
///
/// `source_folder`/`build_folder` are resolved against the package layout;
/// `source_dir`/`build_dir` are the legacy spelling. The two styles are
/// mutually exclusive.
#[derive(Debug, Clone, Default)]
pub struct ConfigureArgs {
    pub args: Vec<String>,
    pub defs: Vec<(String, String)>,
    pub source_folder: Option<PathBuf>,
    pub build_folder: Option<PathBuf>,
    pub source_dir: Option<PathBuf>,
    pub build_dir: Option<PathBuf>,
    pub cache_build_folder: Option<PathBuf>,
    pub pkg_config_paths: Vec<PathBuf>,
    pub no_generated_cross_file: bool,
}

impl ConfigureArgs {
    pub fn new() -> Self {
        ConfigureArgs::default()
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn def(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defs.push((key.into(), value.into()));
        self
    }

    pub fn source_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.source_folder = Some(folder.into());
        self
    }

    pub fn build_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.build_folder = Some(folder.into());
        self
    }

    pub fn source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(dir.into());
        self
    }

    pub fn build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = Some(dir.into());
        self
    }

    pub fn cache_build_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.cache_build_folder = Some(folder.into());
        self
    }

    pub fn pkg_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.pkg_config_paths.push(path.into());
        self
    }

    pub fn no_generated_cross_file(mut self) -> Self {
        self.no_generated_cross_file = true;
        self
    }
}

/// Map a settings build type to Meson's `--buildtype` vocabulary.
///
/// Unknown or missing build types map to the empty string.
pub fn meson_build_type(build_type: Option<&str>) -> &'static str {
    match build_type {
        Some("RelWithDebInfo") => "debugoptimized",
        Some("MinSizeRel") => "release",
        Some("Debug") => "debug",
        Some("Release") => "release",
        _ => "",
    }
}

/// Meson adapter for one package.
pub struct Meson {
    package: PackageContext,
    config: MesonConfig,
    runner: Box<dyn ProcessRunner>,
    activation: Box<dyn ToolchainActivation>,
    shell: Arc<Shell>,
    compiler: Option<String>,
    build_type: Option<String>,
    options: OptionPlan,
    build_dir: Option<PathBuf>,
    state: LifecycleState,
    tested: bool,
}

impl fmt::Debug for Meson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Meson")
            .field("package", &self.package)
            .field("config", &self.config)
            .field("compiler", &self.compiler)
            .field("build_type", &self.build_type)
            .field("options", &self.options)
            .field("build_dir", &self.build_dir)
            .field("state", &self.state)
            .field("tested", &self.tested)
            .finish()
    }
}

impl Meson {
    /// Create an adapter, seeding the option plan from the package settings.
    pub fn new(
        package: PackageContext,
        config: MesonConfig,
        runner: impl ProcessRunner + 'static,
    ) -> Self {
        Self::with_shell(package, config, runner, Arc::new(Shell::default()))
    }

    /// Create an adapter reporting through the given shell.
    pub fn with_shell(
        package: PackageContext,
        config: MesonConfig,
        runner: impl ProcessRunner + 'static,
        shell: Arc<Shell>,
    ) -> Self {
        let compiler = package.settings.get_safe("compiler");
        let settings_build_type = package.settings.get_safe("build_type");
        let (options, plan_warnings) =
            plan_options(&package.settings, &package.options, &package.layout);

        let mut meson = Meson {
            package,
            runner: Box::new(runner),
            activation: Box::new(VcvarsActivation),
            shell,
            compiler,
            build_type: settings_build_type,
            options,
            build_dir: None,
            state: LifecycleState::Unconfigured,
            tested: false,
            config,
        };

        if meson.compiler.is_none() {
            meson.warn("compiler setting should be defined.");
        }
        for warning in plan_warnings {
            meson.warn(warning);
        }
        if let Some(build_type) = meson.config.build_type.clone() {
            meson.set_build_type(build_type);
        }

        meson
    }

    /// Replace the toolchain-activation provider.
    pub fn with_activation(mut self, activation: impl ToolchainActivation + 'static) -> Self {
        self.activation = Box::new(activation);
        self
    }

    pub fn backend(&self) -> &str {
        &self.config.backend
    }

    pub fn options(&self) -> &OptionPlan {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut OptionPlan {
        &mut self.options
    }

    /// Rendered option arguments.
    pub fn flags(&self) -> Vec<String> {
        self.options.render()
    }

    pub fn build_type(&self) -> Option<&str> {
        self.build_type.as_deref()
    }

    /// Override the build type, warning when it disagrees with the settings.
    pub fn set_build_type(&mut self, build_type: impl Into<String>) {
        let build_type = build_type.into();
        let settings_build_type = self.package.settings.get_safe("build_type");
        if settings_build_type.as_deref() != Some(build_type.as_str()) {
            self.warn(format!(
                "Set build type \"{}\" is different than the settings build_type \"{}\"",
                build_type,
                settings_build_type.as_deref().unwrap_or("None")
            ));
        }
        self.build_type = Some(build_type);
    }

    /// Build directory remembered from the last configure.
    pub fn build_folder(&self) -> Option<&Path> {
        self.build_dir.as_deref()
    }

    pub fn set_build_folder(&mut self, dir: impl Into<PathBuf>) {
        self.build_dir = Some(dir.into());
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether a test phase has completed.
    pub fn tested(&self) -> bool {
        self.tested
    }

    /// Warnings reported so far.
    pub fn warnings(&self) -> Vec<String> {
        self.shell.warnings()
    }

    pub fn is_cross_building(&self) -> bool {
        cross_building(
            &self.package.settings,
            self.settings_build(),
            &self.config.running_platform,
        )
    }

    fn settings_build(&self) -> Option<&dyn SettingsView> {
        self.package
            .settings_build
            .as_ref()
            .map(|s| s as &dyn SettingsView)
    }

    /// Describe the cross build of this package.
    pub fn cross_file(&self, pkg_config_libdir: &str) -> Result<CrossFile, MesonError> {
        CrossFile::new(
            &self.package.settings,
            self.settings_build(),
            &self.config.toolchain_env,
            pkg_config_libdir,
            self.config.exe_wrapper.as_str(),
        )
    }

    /// `PKG_CONFIG_PATH` value: the given paths resolved against the
    /// install folder, or the install folder itself.
    pub fn pkg_config_path(&self, paths: &[PathBuf]) -> String {
        let install_folder = &self.package.layout.install_folder;
        if paths.is_empty() {
            install_folder.display().to_string()
        } else {
            join_path_list(
                paths
                    .iter()
                    .map(|p| absolute_path(Some(p), install_folder)),
            )
        }
    }

    fn get_dirs(&self, req: &ConfigureArgs) -> Result<(PathBuf, PathBuf), MesonError> {
        let new_style = req.source_folder.is_some() || req.build_folder.is_some();
        let legacy = req.source_dir.is_some() || req.build_dir.is_some();
        if new_style && legacy {
            return Err(MesonError::InvalidDirectoryConfiguration);
        }

        let layout = &self.package.layout;
        let (source, mut build) = if legacy {
            let build = req
                .build_dir
                .clone()
                .or_else(|| self.build_dir.clone())
                .unwrap_or_else(|| layout.build_folder.clone());
            let source = req
                .source_dir
                .clone()
                .unwrap_or_else(|| layout.source_folder.clone());
            (
                absolute_path(Some(&source), &layout.source_folder),
                absolute_path(Some(&build), &layout.build_folder),
            )
        } else {
            (
                absolute_path(req.source_folder.as_deref(), &layout.source_folder),
                absolute_path(req.build_folder.as_deref(), &layout.build_folder),
            )
        };

        if layout.in_local_cache {
            if let Some(ref cache_build_folder) = req.cache_build_folder {
                build = absolute_path(Some(cache_build_folder), &layout.build_folder);
            }
        }

        Ok((source, build))
    }

    /// Run `meson <source> <build> ...` to configure the build directory.
    pub fn configure(&mut self, req: &ConfigureArgs) -> Result<PhaseOutcome, MesonError> {
        if !self.package.phases.configure {
            self.shell.status(Status::Skipped, "configure");
            return Ok(PhaseOutcome::Skipped);
        }

        self.options.apply_overrides(req.defs.iter().cloned());

        let (source_dir, build_dir) = self.get_dirs(req)?;
        self.build_dir = Some(build_dir.clone());

        let pc_paths = self.pkg_config_path(&req.pkg_config_paths);

        ensure_dir(&build_dir).map_err(|source| MesonError::DirectoryCreation {
            path: build_dir.clone(),
            source,
        })?;

        let build_type = meson_build_type(self.build_type.as_deref());

        let mut invocation_env = EnvironmentOverlay::new();
        invocation_env.set("PKG_CONFIG_PATH", pc_paths.as_str());

        let mut cross_option = None;
        if self.is_cross_building() && !req.no_generated_cross_file {
            let cross_path = build_dir.join(CROSS_FILE_NAME);
            self.cross_file(&pc_paths)?.write(&cross_path)?;
            clear_toolchain_vars(&mut invocation_env);
            cross_option = Some(format!("--cross-file={}", cross_path.display()));
        }

        let command = CommandLine::new("meson")
            .arg(source_dir.display().to_string())
            .arg(build_dir.display().to_string())
            .arg_opt(cross_option)
            .arg(format!("--backend={}", self.config.backend))
            .args(self.options.render())
            .args(req.args.iter().cloned())
            .arg(format!("--buildtype={}", build_type));

        self.shell
            .status(Status::Configuring, source_dir.display());
        tracing::info!("configuring {} into {}", source_dir.display(), build_dir.display());

        self.run(&command, &invocation_env, |command, output| {
            MesonError::ConfigurationFailed { command, output }
        })?;

        self.state = LifecycleState::Configured;
        Ok(PhaseOutcome::Completed)
    }

    /// Build `targets` (all by default) with Ninja.
    pub fn build(
        &mut self,
        args: &[String],
        build_dir: Option<&Path>,
        targets: &[String],
    ) -> Result<PhaseOutcome, MesonError> {
        if !self.package.phases.build {
            self.shell.status(Status::Skipped, "build");
            return Ok(PhaseOutcome::Skipped);
        }
        if self.build_type.is_none() {
            self.warn("build_type setting should be defined.");
        }

        self.run_ninja_targets(Status::Building, args, build_dir, targets)?;
        self.state = LifecycleState::Built;
        Ok(PhaseOutcome::Completed)
    }

    /// Run the Ninja `install` target into the package folder.
    pub fn install(
        &mut self,
        args: &[String],
        build_dir: Option<&Path>,
    ) -> Result<PhaseOutcome, MesonError> {
        if !self.package.phases.install {
            self.shell.status(Status::Skipped, "install");
            return Ok(PhaseOutcome::Skipped);
        }

        let prefix = self
            .options
            .get("prefix")
            .ok_or(MesonError::MissingOutputDirectory)?;
        let output_dir = self
            .package
            .layout
            .package_folder
            .clone()
            .unwrap_or_else(|| PathBuf::from(prefix));
        ensure_dir(&output_dir).map_err(|source| MesonError::DirectoryCreation {
            path: output_dir.clone(),
            source,
        })?;

        self.run_ninja_targets(
            Status::Installing,
            args,
            build_dir,
            &["install".to_string()],
        )?;
        self.state = LifecycleState::Installed;
        Ok(PhaseOutcome::Completed)
    }

    /// Run test targets with Ninja (`test` by default).
    pub fn test(
        &mut self,
        args: &[String],
        build_dir: Option<&Path>,
        targets: &[String],
    ) -> Result<PhaseOutcome, MesonError> {
        if !self.package.phases.test {
            self.shell.status(Status::Skipped, "test");
            return Ok(PhaseOutcome::Skipped);
        }

        let default_targets = ["test".to_string()];
        let targets = if targets.is_empty() {
            &default_targets[..]
        } else {
            targets
        };

        self.run_ninja_targets(Status::Testing, args, build_dir, targets)?;
        self.tested = true;
        Ok(PhaseOutcome::Completed)
    }

    /// Run `meson install -C <build_dir>`, independent of the backend.
    pub fn meson_install(
        &mut self,
        args: &[String],
        build_dir: Option<&Path>,
    ) -> Result<PhaseOutcome, MesonError> {
        if !self.package.phases.install {
            self.shell.status(Status::Skipped, "install");
            return Ok(PhaseOutcome::Skipped);
        }

        self.run_meson_command(Status::Installing, "install", args, build_dir)?;
        self.state = LifecycleState::Installed;
        Ok(PhaseOutcome::Completed)
    }

    /// Run `meson test -C <build_dir>`, independent of the backend.
    pub fn meson_test(
        &mut self,
        args: &[String],
        build_dir: Option<&Path>,
    ) -> Result<PhaseOutcome, MesonError> {
        if !self.package.phases.test {
            self.shell.status(Status::Skipped, "test");
            return Ok(PhaseOutcome::Skipped);
        }

        self.run_meson_command(Status::Testing, "test", args, build_dir)?;
        self.tested = true;
        Ok(PhaseOutcome::Completed)
    }

    fn resolve_build_dir(&self, build_dir: Option<&Path>) -> PathBuf {
        build_dir
            .map(Path::to_path_buf)
            .or_else(|| self.build_dir.clone())
            .unwrap_or_else(|| self.package.layout.build_folder.clone())
    }

    fn run_ninja_targets(
        &self,
        status: Status,
        args: &[String],
        build_dir: Option<&Path>,
        targets: &[String],
    ) -> Result<(), MesonError> {
        if self.config.backend != NINJA_BACKEND {
            return Err(MesonError::UnsupportedBackend(self.config.backend.clone()));
        }

        let build_dir = self.resolve_build_dir(build_dir);
        let command = CommandLine::new("ninja")
            .arg("-C")
            .arg(build_dir.display().to_string())
            .args(args.iter().cloned())
            .args(targets.iter().cloned());

        self.shell.status(status, build_dir.display());
        tracing::info!("running ninja in {}", build_dir.display());
        self.run(&command, &EnvironmentOverlay::new(), |command, output| {
            MesonError::ExecutionFailed { command, output }
        })
    }

    fn run_meson_command(
        &self,
        status: Status,
        subcommand: &str,
        args: &[String],
        build_dir: Option<&Path>,
    ) -> Result<(), MesonError> {
        let build_dir = self.resolve_build_dir(build_dir);
        let command = CommandLine::new("meson")
            .arg(subcommand)
            .arg("-C")
            .arg(build_dir.display().to_string())
            .args(args.iter().cloned());

        self.shell.status(status, build_dir.display());
        tracing::info!("running meson {} in {}", subcommand, build_dir.display());
        self.run(&command, &EnvironmentOverlay::new(), |command, output| {
            MesonError::ExecutionFailed { command, output }
        })
    }

    /// Compose the environment for `command` and run it.
    ///
    /// Layers, least specific first: build-tool variables, toolchain
    /// activation (when needed), then `invocation_env`.
    fn run(
        &self,
        command: &CommandLine,
        invocation_env: &EnvironmentOverlay,
        on_failure: impl FnOnce(String, String) -> MesonError,
    ) -> Result<(), MesonError> {
        let mut layers = vec![self.config.tool_env.clone()];

        if needs_toolchain_activation(
            self.compiler.as_deref(),
            &self.config.backend,
            &self.config.running_platform.os,
        ) {
            let vars = self
                .activation
                .activation_vars(&self.package.settings)
                .map_err(|e| MesonError::ToolchainActivation(format!("{:#}", e)))?;
            layers.push(activation_layer(&vars, self.config.append_vcvars, |key| {
                std::env::var(key).ok()
            }));
        }
        layers.push(invocation_env.clone());

        let env = EnvironmentOverlay::layered(&layers);
        tracing::debug!("running `{}` with {} environment entries", command, env.len());
        self.shell.verbose(command);

        let result = {
            let _scope = EnvScope::enter(&env);
            self.runner.run(command, &env)
        };

        match result {
            Ok(output) if output.is_success() => Ok(()),
            Ok(output) => Err(on_failure(command.to_string(), output.diagnostic_text())),
            Err(e) => Err(on_failure(command.to_string(), format!("{:#}", e))),
        }
    }

    fn warn(&self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::warn!("{}", msg);
        self.shell.warn(msg);
    }
}
