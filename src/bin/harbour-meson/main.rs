//! harbour-meson CLI - Drive Meson builds from Harbour package settings

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::Session;
use harbour_meson::util::diagnostic;
use harbour_meson::MesonError;

fn main() {
    let cli = Cli::parse();
    let color = !cli.global.no_color;

    if let Err(e) = run(cli) {
        match e.downcast_ref::<MesonError>() {
            Some(err) => diagnostic::emit(&err.to_diagnostic(), color),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.global.verbose {
        EnvFilter::new("harbour_meson=debug")
    } else {
        EnvFilter::new("harbour_meson=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let session = Session::load(&cli.global)?;

    // Execute command
    match cli.command {
        Commands::Configure(args) => commands::configure::execute(&session, args),
        Commands::Build(args) => commands::build::execute(&session, args),
        Commands::Install(args) => commands::install::execute(&session, args),
        Commands::Test(args) => commands::test::execute(&session, args),
        Commands::Run(args) => commands::run::execute(&session, args),
        Commands::CrossFile(args) => commands::cross_file::execute(&session, args),
        Commands::Version => commands::version::execute(&session),
    }
}
