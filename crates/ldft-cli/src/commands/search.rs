use tracing::info;

use super::{Context, Model, build_model, parse_seed, run_with_progress};
use crate::cli::SearchArgs;
use crate::error::Result;
use crate::params;
use ldft::core::functional::{DensityFunctional, Seed, SystemFactory};
use ldft::engine::ConfigError;
use ldft::workflows::{self, SearchConfig, SearchOutcome};

pub fn run(args: SearchArgs, ctx: &Context) -> Result<()> {
    let iteration = params::resolve_iteration(&args.iter, &ctx.params)?;
    let accuracy = args
        .accuracy
        .or(ctx.params.accuracy)
        .ok_or(ConfigError::MissingParameter("accuracy"))?;

    let mut builder = SearchConfig::builder()
        .alpha(iteration.alpha)
        .steps(iteration.steps)
        .checkpoints(iteration.checkpoints)
        .accuracy(accuracy);
    if let Some(min_error) = iteration.min_error {
        builder = builder.probe_min_error(min_error);
    }
    let config = builder.build()?;

    let seed_low = parse_seed(&args.seed_low)?;
    let seed_high = parse_seed(&args.seed_high)?;
    match build_model(&args.model)? {
        Model::MeanField(model) => execute(
            &model,
            args.min_density,
            args.max_density,
            seed_low,
            seed_high,
            &config,
            ctx,
        ),
        Model::Highlander(model) => execute(
            &model,
            args.min_density,
            args.max_density,
            seed_low,
            seed_high,
            &config,
            ctx,
        ),
    }
}

fn execute<M>(
    model: &M,
    low: f64,
    high: f64,
    seed_low: Seed,
    seed_high: Seed,
    config: &SearchConfig,
    ctx: &Context,
) -> Result<()>
where
    M: DensityFunctional + SystemFactory + Sync,
{
    info!(low, high, accuracy = config.accuracy, "searching for a transition");
    let outcome = run_with_progress(|reporter| {
        workflows::coexistence::run(
            model, low, high, seed_low, seed_high, config, &ctx.store, reporter,
        )
    })?;
    match outcome {
        SearchOutcome::Transition { low, high } => {
            println!("transition localized between {low:.6} and {high:.6}");
        }
        SearchOutcome::NoTransition { density } => {
            println!("no resolvable transition; probes degenerate at density {density:.6}");
        }
    }
    Ok(())
}
