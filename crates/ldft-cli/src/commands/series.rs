use tracing::info;

use super::{Context, Model, build_model, parse_seed, run_with_progress};
use crate::cli::SeriesArgs;
use crate::error::Result;
use crate::params;
use ldft::core::functional::{DensityFunctional, Seed, SystemFactory};
use ldft::engine::IterationConfig;
use ldft::workflows::{self, SeriesConfig};

pub fn run(args: SeriesArgs, ctx: &Context) -> Result<()> {
    let config = params::resolve_iteration(&args.iter, &ctx.params)?;
    let mut series = SeriesConfig::new(args.start_density, args.end_density, args.step_width)?;
    if args.consecutive {
        series = series.consecutive();
    }
    let seed = parse_seed(&args.seed)?;
    match build_model(&args.model)? {
        Model::MeanField(model) => execute(&model, &series, &seed, &config, ctx),
        Model::Highlander(model) => execute(&model, &series, &seed, &config, ctx),
    }
}

fn execute<M>(
    model: &M,
    series: &SeriesConfig,
    seed: &Seed,
    config: &IterationConfig,
    ctx: &Context,
) -> Result<()>
where
    M: DensityFunctional + SystemFactory,
{
    info!(start = series.start, end = series.end, "running a density series");
    let outcomes = run_with_progress(|reporter| {
        workflows::series::run(model, series, seed, config, &ctx.store, reporter)
    })?;
    for outcome in &outcomes {
        println!(
            "dens {:.4}: {} ({} iterations) -> {}",
            outcome.system.mean_densities()[0],
            if outcome.report.converged() {
                "converged"
            } else {
                "exhausted"
            },
            outcome.system.iteration(),
            outcome.path.display()
        );
    }
    Ok(())
}
