use tracing::{info, instrument};

use super::relax::{self, RelaxOutcome};
use crate::core::functional::{DensityFunctional, Seed, SystemFactory};
use crate::core::io::SampleStore;
use crate::engine::config::{ConfigError, IterationConfig};
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;

/// A sweep of average densities in `[start, end)` with the given step width.
/// The step may be negative to walk the range downwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesConfig {
    pub start: f64,
    pub end: f64,
    pub step: f64,
    /// When set, each system after the first is seeded from the converged
    /// profile of its predecessor instead of the original seed.
    pub consecutive: bool,
}

impl SeriesConfig {
    pub fn new(start: f64, end: f64, step: f64) -> Result<Self, ConfigError> {
        if step == 0.0 || (end - start).signum() != step.signum() {
            return Err(ConfigError::InvalidStepWidth(step));
        }
        Ok(Self {
            start,
            end,
            step,
            consecutive: false,
        })
    }

    pub fn consecutive(mut self) -> Self {
        self.consecutive = true;
        self
    }

    fn densities(&self) -> Vec<f64> {
        let mut densities = Vec::new();
        let mut index = 0u32;
        loop {
            let density = self.start + self.step * index as f64;
            let inside = if self.step > 0.0 {
                density < self.end
            } else {
                density > self.end
            };
            if !inside {
                break;
            }
            densities.push(density);
            index += 1;
        }
        densities
    }
}

/// Relaxes one system per density of the sweep, persisting each under the
/// `ser` tag. With `consecutive` the converged profile of each run seeds the
/// next, which tracks a phase branch through the sweep.
#[instrument(skip_all, fields(start = series.start, end = series.end))]
pub fn run<M>(
    model: &M,
    series: &SeriesConfig,
    seed: &Seed,
    config: &IterationConfig,
    store: &SampleStore,
    reporter: &ProgressReporter,
) -> Result<Vec<RelaxOutcome>, EngineError>
where
    M: DensityFunctional + SystemFactory,
{
    let densities = series.densities();
    info!(systems = densities.len(), "starting density series");

    let mut outcomes = Vec::with_capacity(densities.len());
    let mut current_seed = seed.clone();
    for density in densities {
        let outcome =
            relax::run_tagged(model, density, &current_seed, "ser", config, store, reporter)?;
        if series.consecutive {
            current_seed = Seed::Profile(Box::new(outcome.system.clone()));
        }
        outcomes.push(outcome);
    }
    Ok(outcomes)
}
