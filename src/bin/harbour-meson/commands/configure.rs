//! `harbour-meson configure` command

use anyhow::Result;

use harbour_meson::builder::{ConfigureArgs as Request, PhaseOutcome};
use harbour_meson::util::shell::Status;

use super::Session;
use crate::cli::ConfigureArgs;

pub fn execute(session: &Session, args: ConfigureArgs) -> Result<()> {
    let mut meson = session.meson();

    let request = Request {
        args: args.args,
        defs: args.defs,
        source_folder: args.source_folder,
        build_folder: args.build_folder,
        source_dir: args.source_dir,
        build_dir: args.build_dir,
        cache_build_folder: args.cache_build_folder,
        pkg_config_paths: args.pkg_config_paths,
        no_generated_cross_file: args.no_cross_file,
    };

    if meson.configure(&request)? == PhaseOutcome::Completed {
        if let Some(build_dir) = meson.build_folder() {
            session
                .shell
                .status(Status::Finished, format!("configured {}", build_dir.display()));
        }
    }
    Ok(())
}
