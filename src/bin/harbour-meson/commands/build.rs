//! `harbour-meson build` command

use anyhow::Result;

use harbour_meson::builder::PhaseOutcome;
use harbour_meson::util::shell::Status;

use super::Session;
use crate::cli::BuildArgs;

pub fn execute(session: &Session, args: BuildArgs) -> Result<()> {
    let mut meson = session.meson();

    if meson.build(&args.args, args.build_dir.as_deref(), &args.target)? == PhaseOutcome::Completed
    {
        session.shell.status(Status::Finished, "build");
    }
    Ok(())
}
