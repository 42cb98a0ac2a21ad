//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// harbour-meson - Drive Meson builds from Harbour package settings
#[derive(Parser)]
#[command(name = "harbour-meson")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Profile describing the package settings and layout
    #[arg(
        long,
        global = true,
        env = "HARBOUR_MESON_PROFILE",
        default_value = "harbour-meson.toml"
    )]
    pub profile: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Print commands instead of running them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Output format for status messages
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configure the build directory with meson
    Configure(ConfigureArgs),

    /// Build targets with ninja
    Build(BuildArgs),

    /// Install into the package folder
    Install(InstallArgs),

    /// Run the test suite
    Test(TestArgs),

    /// Configure, build, install and test in one go
    Run(RunArgs),

    /// Write the cross file for the profile
    CrossFile(CrossFileArgs),

    /// Print the installed meson version
    Version,
}

#[derive(Args)]
pub struct ConfigureArgs {
    /// Source folder, relative to the profile's source folder
    #[arg(long)]
    pub source_folder: Option<PathBuf>,

    /// Build folder, relative to the profile's build folder
    #[arg(long)]
    pub build_folder: Option<PathBuf>,

    /// Source directory (legacy spelling)
    #[arg(long)]
    pub source_dir: Option<PathBuf>,

    /// Build directory (legacy spelling)
    #[arg(long)]
    pub build_dir: Option<PathBuf>,

    /// Build folder used when building inside the local cache
    #[arg(long)]
    pub cache_build_folder: Option<PathBuf>,

    /// Override a meson option (e.g. -D libdir=lib64)
    #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub defs: Vec<(String, String)>,

    /// Directories searched for pkg-config files
    #[arg(long = "pkg-config-path", value_name = "PATH")]
    pub pkg_config_paths: Vec<PathBuf>,

    /// Do not generate a cross file when cross building
    #[arg(long)]
    pub no_cross_file: bool,

    /// Extra arguments passed to meson
    #[arg(last = true)]
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Build directory (defaults to the profile's build folder)
    #[arg(long)]
    pub build_dir: Option<PathBuf>,

    /// Specific targets to build
    #[arg(long)]
    pub target: Vec<String>,

    /// Extra arguments passed to ninja
    #[arg(last = true)]
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct InstallArgs {
    /// Build directory (defaults to the profile's build folder)
    #[arg(long)]
    pub build_dir: Option<PathBuf>,

    /// Use `meson install` instead of the ninja install target
    #[arg(long)]
    pub meson: bool,

    /// Extra arguments passed to ninja or meson
    #[arg(last = true)]
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct TestArgs {
    /// Build directory (defaults to the profile's build folder)
    #[arg(long)]
    pub build_dir: Option<PathBuf>,

    /// Test targets to run (defaults to `test`)
    #[arg(long)]
    pub target: Vec<String>,

    /// Use `meson test` instead of ninja
    #[arg(long)]
    pub meson: bool,

    /// Extra arguments passed to ninja or meson
    #[arg(last = true)]
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct RunArgs {
    /// Phases to skip
    #[arg(long, value_enum)]
    pub skip: Vec<Phase>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Phase {
    Configure,
    Build,
    Install,
    Test,
}

#[derive(Args)]
pub struct CrossFileArgs {
    /// Where to write the cross file (defaults to <build folder>/cross_file.txt)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Directories searched for pkg-config files
    #[arg(long = "pkg-config-path", value_name = "PATH")]
    pub pkg_config_paths: Vec<PathBuf>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{}`", s)),
    }
}
