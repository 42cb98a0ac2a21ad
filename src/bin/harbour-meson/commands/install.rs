//! `harbour-meson install` command

use anyhow::Result;

use harbour_meson::builder::PhaseOutcome;
use harbour_meson::util::shell::Status;

use super::Session;
use crate::cli::InstallArgs;

pub fn execute(session: &Session, args: InstallArgs) -> Result<()> {
    let mut meson = session.meson();
    let build_dir = args.build_dir.as_deref();

    let outcome = if args.meson {
        meson.meson_install(&args.args, build_dir)?
    } else {
        meson.install(&args.args, build_dir)?
    };

    if outcome == PhaseOutcome::Completed {
        let target = session
            .profile
            .layout
            .package_folder
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "prefix".to_string());
        session
            .shell
            .status(Status::Finished, format!("installed into {}", target));
    }
    Ok(())
}
