use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ldft",
    version,
    about = "Equilibrium density profiles of lattice-gas models and phase-transition search"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Mirror logs into this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Root directory generated samples are stored under.
    #[arg(long, global = true, default_value = "./samples")]
    pub data_root: PathBuf,

    /// Optional TOML file supplying iteration parameter defaults.
    #[arg(long, global = true)]
    pub params: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Relax a single system to its equilibrium profile and save it.
    Relax(RelaxArgs),
    /// Continue the iteration of a previously saved system.
    Resume(ResumeArgs),
    /// Relax a series of systems over a density range.
    Series(SeriesArgs),
    /// Bisect a density interval toward a first-order phase transition.
    Search(SearchArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ModelKind {
    /// 2-D mean-field lattice gas.
    #[value(name = "2d-mf")]
    MeanField2d,
    /// 3-D mean-field lattice gas.
    #[value(name = "3d-mf")]
    MeanField3d,
    /// 2-D lattice gas with the three-species AO-Highlander functional.
    #[value(name = "2d-highl")]
    Highlander2d,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum BoundaryKind {
    #[value(name = "periodic")]
    Periodic,
    /// 45-degree tilted cell for (11) interfaces (2-D).
    #[value(name = "tilted-11")]
    Tilted11,
    /// Tilted cell for (110) interfaces (3-D).
    #[value(name = "tilted-110")]
    Tilted110,
    /// Tilted cell for (111) interfaces (3-D).
    #[value(name = "tilted-111")]
    Tilted111,
}

#[derive(Args, Debug)]
pub struct ModelArgs {
    /// Lattice-gas variant.
    #[arg(long, value_enum)]
    pub model: ModelKind,

    /// Edge length of the simulation box. Tilted boundary conditions double
    /// the last axis automatically.
    #[arg(long)]
    pub size: usize,

    /// Attraction strength (times the inverse temperature).
    #[arg(long)]
    pub epsilon: f64,

    #[arg(long, value_enum, default_value = "periodic")]
    pub boundary: BoundaryKind,
}

#[derive(Args, Debug)]
pub struct IterArgs {
    /// Picard mixing parameter in (0, 1).
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Iteration step budget.
    #[arg(long)]
    pub steps: Option<u64>,

    /// Checkpoint descriptor: an integer, 'exp#' or 'dec#'.
    #[arg(long)]
    pub checkpoints: Option<String>,

    /// Stop early once every species error falls below this value.
    #[arg(long)]
    pub min_error: Option<f64>,
}

#[derive(Args, Debug)]
pub struct RelaxArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Average density of the system.
    #[arg(long)]
    pub density: f64,

    /// Initial profile: hom, sph, cyl, sl, or the path of a saved sample.
    #[arg(long, default_value = "hom")]
    pub seed: String,

    #[command(flatten)]
    pub iter: IterArgs,
}

#[derive(Args, Debug)]
pub struct ResumeArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Path of the saved sample to continue.
    #[arg(long)]
    pub sample: PathBuf,

    #[command(flatten)]
    pub iter: IterArgs,
}

#[derive(Args, Debug)]
pub struct SeriesArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// First density of the sweep.
    #[arg(long)]
    pub start_density: f64,

    /// Open end of the sweep.
    #[arg(long)]
    pub end_density: f64,

    /// Step width; negative to walk downwards.
    #[arg(long)]
    pub step_width: f64,

    /// Initial profile of the first (or every) system.
    #[arg(long, default_value = "hom")]
    pub seed: String,

    /// Seed each system from the converged profile of its predecessor.
    #[arg(long)]
    pub consecutive: bool,

    #[command(flatten)]
    pub iter: IterArgs,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Lower bound of the density interval.
    #[arg(long)]
    pub min_density: f64,

    /// Upper bound of the density interval.
    #[arg(long)]
    pub max_density: f64,

    /// Width of the reported transition window.
    #[arg(long)]
    pub accuracy: Option<f64>,

    /// Seed of the low-density phase.
    #[arg(long, default_value = "hom")]
    pub seed_low: String,

    /// Seed of the high-density phase.
    #[arg(long, default_value = "sl")]
    pub seed_high: String,

    #[command(flatten)]
    pub iter: IterArgs,
}
