use tracing::info;

use super::{Context, Model, build_model, parse_seed, run_with_progress};
use crate::cli::RelaxArgs;
use crate::error::Result;
use crate::params;
use ldft::core::functional::{DensityFunctional, Seed, SystemFactory};
use ldft::engine::IterationConfig;
use ldft::workflows;

pub fn run(args: RelaxArgs, ctx: &Context) -> Result<()> {
    let config = params::resolve_iteration(&args.iter, &ctx.params)?;
    let seed = parse_seed(&args.seed)?;
    match build_model(&args.model)? {
        Model::MeanField(model) => execute(&model, args.density, &seed, &config, ctx),
        Model::Highlander(model) => execute(&model, args.density, &seed, &config, ctx),
    }
}

fn execute<M>(
    model: &M,
    density: f64,
    seed: &Seed,
    config: &IterationConfig,
    ctx: &Context,
) -> Result<()>
where
    M: DensityFunctional + SystemFactory,
{
    info!(density, "relaxing a single system");
    let outcome = run_with_progress(|reporter| {
        workflows::relax::run(model, density, seed, config, &ctx.store, reporter)
    })?;
    println!(
        "{} after {} iterations (final error {:.3e})",
        if outcome.report.converged() {
            "converged"
        } else {
            "step budget exhausted"
        },
        outcome.system.iteration(),
        outcome.report.final_errors.first().copied().unwrap_or(f64::NAN)
    );
    println!("saved {}", outcome.path.display());
    Ok(())
}
