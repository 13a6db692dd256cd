mod cli;
mod commands;
mod error;
mod logging;
mod params;

use clap::Parser;
use tracing::{debug, info};

use crate::cli::{Cli, Commands};
use crate::error::Result;
use crate::params::ParameterFile;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run_app(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run_app(cli: Cli) -> Result<()> {
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;
    info!("ldft v{} starting", env!("CARGO_PKG_VERSION"));
    debug!(?cli, "parsed command line");

    let params = match &cli.params {
        Some(path) => ParameterFile::load(path)?,
        None => ParameterFile::default(),
    };
    let ctx = commands::Context::new(&cli.data_root, params);

    match cli.command {
        Commands::Relax(args) => commands::relax::run(args, &ctx),
        Commands::Resume(args) => commands::resume::run(args, &ctx),
        Commands::Series(args) => commands::series::run(args, &ctx),
        Commands::Search(args) => commands::search::run(args, &ctx),
    }
}
