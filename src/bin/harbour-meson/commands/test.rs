//! `harbour-meson test` command

use anyhow::Result;

use harbour_meson::builder::PhaseOutcome;
use harbour_meson::util::shell::Status;

use super::Session;
use crate::cli::TestArgs;

pub fn execute(session: &Session, args: TestArgs) -> Result<()> {
    let mut meson = session.meson();
    let build_dir = args.build_dir.as_deref();

    let outcome = if args.meson {
        meson.meson_test(&args.args, build_dir)?
    } else {
        meson.test(&args.args, build_dir, &args.target)?
    };

    if outcome == PhaseOutcome::Completed {
        session.shell.status(Status::Finished, "tests passed");
    }
    Ok(())
}
