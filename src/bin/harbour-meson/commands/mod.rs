//! Command implementations

pub mod build;
pub mod configure;
pub mod cross_file;
pub mod install;
pub mod run;
pub mod test;
pub mod version;

use std::sync::Arc;

use anyhow::Result;

use harbour_meson::builder::{Meson, MesonConfig};
use harbour_meson::util::config::{global_config_path, load_config, project_config_path};
use harbour_meson::util::shell::ColorChoice;
use harbour_meson::util::{DryRunRunner, ProcessRunner, Profile, Shell, SystemRunner};

use crate::cli::{GlobalArgs, MessageFormat};

/// State shared by every command: the profile, the merged configuration
/// and the output shell.
pub struct Session {
    pub shell: Arc<Shell>,
    pub profile: Profile,
    pub config: MesonConfig,
    pub dry_run: bool,
}

impl Session {
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let color = if global.no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        let shell = Arc::new(Shell::from_flags(
            global.quiet,
            global.verbose,
            color,
            global.message_format == MessageFormat::Json,
        ));

        let profile = Profile::load(&global.profile)?;
        let project_root = profile.layout.source_folder.clone();
        let config = load_config(
            global_config_path().as_deref(),
            &project_config_path(&project_root),
        );
        tracing::debug!("loaded profile {}", profile.path.display());

        Ok(Session {
            config: profile.meson_config(&config),
            shell,
            profile,
            dry_run: global.dry_run,
        })
    }

    pub fn runner(&self) -> Box<dyn ProcessRunner> {
        if self.dry_run {
            Box::new(DryRunRunner)
        } else {
            Box::new(SystemRunner::new())
        }
    }

    /// A fresh adapter for the profile's package.
    pub fn meson(&self) -> Meson {
        Meson::with_shell(
            self.profile.package_context(),
            self.config.clone(),
            self.runner(),
            self.shell.clone(),
        )
    }
}
