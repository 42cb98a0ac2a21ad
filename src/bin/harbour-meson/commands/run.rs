//! `harbour-meson run` command

use anyhow::Result;

use harbour_meson::builder::ConfigureArgs;
use harbour_meson::util::shell::Status;

use super::Session;
use crate::cli::{Phase, RunArgs};

pub fn execute(session: &Session, args: RunArgs) -> Result<()> {
    let mut package = session.profile.package_context();
    for phase in &args.skip {
        match phase {
            Phase::Configure => package.phases.configure = false,
            Phase::Build => package.phases.build = false,
            Phase::Install => package.phases.install = false,
            Phase::Test => package.phases.test = false,
        }
    }

    let mut meson = harbour_meson::Meson::with_shell(
        package,
        session.config.clone(),
        session.runner(),
        session.shell.clone(),
    );

    meson.configure(&ConfigureArgs::new())?;
    meson.build(&[], None, &[])?;
    meson.install(&[], None)?;
    meson.test(&[], None, &[])?;

    tracing::debug!("lifecycle finished in state {:?}", meson.state());
    session.shell.status(Status::Finished, "run");
    Ok(())
}
