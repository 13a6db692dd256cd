use tracing::info;

use super::{Context, Model, build_model, run_with_progress};
use crate::cli::ResumeArgs;
use crate::error::Result;
use crate::params;
use ldft::core::functional::{DensityFunctional, SystemFactory};
use ldft::core::io::SampleStore;
use ldft::core::lattice::LatticeSystem;
use ldft::engine::IterationConfig;
use ldft::workflows;

pub fn run(args: ResumeArgs, ctx: &Context) -> Result<()> {
    let config = params::resolve_iteration(&args.iter, &ctx.params)?;
    let system = SampleStore::load_from(&args.sample)?;
    info!(
        sample = %args.sample.display(),
        iteration = system.iteration(),
        "continuing a saved run"
    );
    match build_model(&args.model)? {
        Model::MeanField(model) => execute(&model, system, &config, ctx),
        Model::Highlander(model) => execute(&model, system, &config, ctx),
    }
}

fn execute<M>(
    model: &M,
    system: LatticeSystem,
    config: &IterationConfig,
    ctx: &Context,
) -> Result<()>
where
    M: DensityFunctional + SystemFactory,
{
    let outcome = run_with_progress(|reporter| {
        workflows::relax::continue_run(model, system, config, &ctx.store, reporter)
    })?;
    println!(
        "now at iteration {} (final error {:.3e})",
        outcome.system.iteration(),
        outcome.report.final_errors.first().copied().unwrap_or(f64::NAN)
    );
    println!("saved {}", outcome.path.display());
    Ok(())
}
