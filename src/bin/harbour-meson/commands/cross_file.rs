//! `harbour-meson cross-file` command

use anyhow::Result;

use harbour_meson::builder::cross_file::CROSS_FILE_NAME;
use harbour_meson::util::shell::Status;

use super::Session;
use crate::cli::CrossFileArgs;

pub fn execute(session: &Session, args: CrossFileArgs) -> Result<()> {
    let meson = session.meson();

    if !meson.is_cross_building() {
        session
            .shell
            .warn("host and build machines are the same; meson does not need a cross file");
    }

    let pkg_config_path = meson.pkg_config_path(&args.pkg_config_paths);
    let cross_file = meson.cross_file(&pkg_config_path)?;

    if session.dry_run {
        print!("{}", cross_file.render());
        return Ok(());
    }

    let output = args
        .output
        .unwrap_or_else(|| session.profile.layout.build_folder.join(CROSS_FILE_NAME));
    cross_file.write(&output)?;
    session.shell.status(Status::Created, output.display());
    Ok(())
}
