use std::path::PathBuf;

use tracing::{info, instrument};

use crate::core::functional::{DensityFunctional, Seed, SystemFactory};
use crate::core::io::{SampleKey, SampleStore};
use crate::core::lattice::LatticeSystem;
use crate::engine::config::IterationConfig;
use crate::engine::error::EngineError;
use crate::engine::picard::{self, IterationReport};
use crate::engine::progress::ProgressReporter;

#[derive(Debug)]
pub struct RelaxOutcome {
    pub system: LatticeSystem,
    pub report: IterationReport,
    /// Where the converged system was persisted.
    pub path: PathBuf,
}

/// Store key of a sample produced by `model` at the given average density.
pub fn sample_key<M: SystemFactory + ?Sized>(model: &M, density: f64) -> SampleKey {
    SampleKey::new(
        model.model_tag(),
        model.shape(),
        model.interaction_strength(),
        density,
    )
}

/// Builds one system at `density` from `seed`, iterates it and persists the
/// result under a tag derived from the seed.
#[instrument(skip_all, fields(density))]
pub fn run<M>(
    model: &M,
    density: f64,
    seed: &Seed,
    config: &IterationConfig,
    store: &SampleStore,
    reporter: &ProgressReporter,
) -> Result<RelaxOutcome, EngineError>
where
    M: DensityFunctional + SystemFactory,
{
    run_tagged(model, density, seed, seed.tag(), config, store, reporter)
}

pub(crate) fn run_tagged<M>(
    model: &M,
    density: f64,
    seed: &Seed,
    tag: &str,
    config: &IterationConfig,
    store: &SampleStore,
    reporter: &ProgressReporter,
) -> Result<RelaxOutcome, EngineError>
where
    M: DensityFunctional + SystemFactory,
{
    let mut system = model.build_system(density, seed)?;
    let report = picard::iterate(&mut system, model, config, reporter)?;
    let path = store.save(&system, &sample_key(model, density).with_tag(tag))?;
    info!(
        density,
        converged = report.converged(),
        path = %path.display(),
        "relaxation finished"
    );
    Ok(RelaxOutcome {
        system,
        report,
        path,
    })
}

/// Continues the iteration of a previously persisted system, keeping its
/// accumulated history, and persists the further-iterated state.
#[instrument(skip_all)]
pub fn continue_run<M>(
    model: &M,
    mut system: LatticeSystem,
    config: &IterationConfig,
    store: &SampleStore,
    reporter: &ProgressReporter,
) -> Result<RelaxOutcome, EngineError>
where
    M: DensityFunctional + SystemFactory,
{
    let density = system.species()[0]
        .ensemble
        .average_density()
        .unwrap_or_else(|| system.mean_densities()[0]);
    let report = picard::iterate(&mut system, model, config, reporter)?;
    let path = store.save(&system, &sample_key(model, density))?;
    info!(
        density,
        iteration = system.iteration(),
        converged = report.converged(),
        "continued run persisted"
    );
    Ok(RelaxOutcome {
        system,
        report,
        path,
    })
}
