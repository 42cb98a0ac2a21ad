//! `harbour-meson version` command

use anyhow::Result;

use harbour_meson::builder::env::EnvironmentOverlay;
use harbour_meson::builder::{get_version, version_command};

use super::Session;

pub fn execute(session: &Session) -> Result<()> {
    let runner = session.runner();

    // A dry run has no output to parse; show the command instead.
    if session.dry_run {
        runner.run(&version_command(), &EnvironmentOverlay::new())?;
        return Ok(());
    }

    let version = get_version(&*runner)?;
    println!("meson {}", version);
    Ok(())
}
