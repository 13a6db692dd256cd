use ndarray::ArrayD;
use tracing::{debug, info, instrument};

use super::config::IterationConfig;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use crate::core::functional::DensityFunctional;
use crate::core::lattice::{Ensemble, LatticeSystem};

/// How an engine run ended. Exhausting the step budget is a report, not an
/// error: callers that require convergence check the final error vector
/// against their own threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every species error fell below the configured `min_error`.
    Converged { iteration: u64 },
    /// The step budget ran out first.
    StepsExhausted,
}

#[derive(Debug, Clone)]
pub struct IterationReport {
    pub outcome: Outcome,
    /// Per-species error of the last performed update.
    pub final_errors: Vec<f64>,
}

impl IterationReport {
    pub fn converged(&self) -> bool {
        matches!(self.outcome, Outcome::Converged { .. })
    }
}

/// One Picard update of every species.
///
/// The update is evaluated for all species before any state is written, so a
/// divergence (any NaN in any Boltzmann factor) aborts with the system
/// exactly as it was. Returns the per-species sum of squared residuals
/// between the candidate and the previous field, taken before mixing.
pub fn step(
    system: &mut LatticeSystem,
    functional: &dyn DensityFunctional,
    alpha: f64,
) -> Result<Vec<f64>, EngineError> {
    let mu_ex = functional.excess_chemical_potential(system);
    debug_assert_eq!(mu_ex.len(), system.species_count());

    let mut boltzmann: Vec<ArrayD<f64>> = Vec::with_capacity(system.species_count());
    for (index, species) in system.species().iter().enumerate() {
        let factor = (&mu_ex[index] - &species.external_potential).mapv(f64::exp);
        if factor.iter().any(|v| v.is_nan()) {
            return Err(EngineError::Divergence {
                species: index,
                iteration: system.iteration(),
            });
        }
        boltzmann.push(factor);
    }

    let sites = system.sites() as f64;
    let mut errors = Vec::with_capacity(system.species_count());
    for (species, factor) in system.species_mut().iter_mut().zip(boltzmann) {
        let candidate = match &mut species.ensemble {
            Ensemble::GrandCanonical {
                chemical_potential,
                average_density,
            } => {
                let candidate = factor * chemical_potential.exp();
                *average_density = Some(candidate.sum() / sites);
                candidate
            }
            Ensemble::Canonical {
                average_density,
                chemical_potential,
            } => {
                let fugacity = *average_density / (factor.sum() / sites);
                *chemical_potential = Some(fugacity.ln());
                factor * fugacity
            }
        };

        let error = candidate
            .iter()
            .zip(species.field.iter())
            .map(|(c, f)| (c - f) * (c - f))
            .sum();
        errors.push(error);

        species
            .field
            .zip_mut_with(&candidate, |f, &c| *f = alpha * c + (1.0 - alpha) * *f);
    }
    system.advance_iteration();
    Ok(errors)
}

/// Drives up to `config.steps` Picard updates, committing snapshots at the
/// iterations scheduled by the checkpoint policy and stopping early once
/// every species error falls below `config.min_error`.
///
/// The full per-step error history is retained on the system; field
/// snapshots are sparse. On exit the history always ends with the terminal
/// state.
#[instrument(skip_all, fields(alpha = config.alpha, steps = config.steps))]
pub fn iterate(
    system: &mut LatticeSystem,
    functional: &dyn DensityFunctional,
    config: &IterationConfig,
    reporter: &ProgressReporter,
) -> Result<IterationReport, EngineError> {
    reporter.report(Progress::RunStart {
        steps: config.steps,
    });

    let last_recorded = system.history().last_iteration().unwrap_or(0);
    let mut next_checkpoint = config.checkpoints.next_after(last_recorded);
    let mut outcome = Outcome::StepsExhausted;
    let mut final_errors = Vec::new();

    for _ in 0..config.steps {
        let errors = step(system, functional, config.alpha)?;
        system.record_errors(errors.clone());

        if system.iteration() == next_checkpoint {
            debug!(
                iteration = system.iteration(),
                error = errors[0],
                "checkpoint"
            );
            reporter.report(Progress::Checkpoint {
                iteration: system.iteration(),
                error: errors[0],
            });
            system.commit_snapshot();
            next_checkpoint = config
                .checkpoints
                .next_after(system.history().last_iteration().unwrap_or(0));
        }

        final_errors = errors;
        if let Some(min_error) = config.min_error {
            if final_errors.iter().all(|&e| e < min_error) {
                outcome = Outcome::Converged {
                    iteration: system.iteration(),
                };
                reporter.report(Progress::EarlyStop {
                    iteration: system.iteration(),
                });
                break;
            }
        }
    }

    if system.history().last_iteration() != Some(system.iteration()) {
        system.commit_snapshot();
    }
    reporter.report(Progress::RunFinish);
    info!(
        iteration = system.iteration(),
        converged = matches!(outcome, Outcome::Converged { .. }),
        "iteration finished"
    );
    Ok(IterationReport {
        outcome,
        final_errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::functional::mean_field::MeanFieldLatticeGas;
    use crate::core::functional::{FunctionalError, Seed, SystemFactory};
    use crate::core::lattice::{
        BoundaryCondition, LatticeSystem, NucleusShape, SpeciesConfig,
    };
    use crate::engine::checkpoint::CheckpointPolicy;
    use approx::assert_relative_eq;
    use ndarray::{ArrayD, IxDyn};

    /// Exactly solvable saturating map: `mu_ex = ln(1/r - 1)`, whose
    /// canonical fixed point at density 0.5 is the homogeneous profile.
    struct SaturatingMap;

    impl DensityFunctional for SaturatingMap {
        fn excess_chemical_potential(&self, system: &LatticeSystem) -> Vec<ArrayD<f64>> {
            system
                .species()
                .iter()
                .map(|s| s.field.mapv(|r| (1.0 / r - 1.0).ln()))
                .collect()
        }

        fn free_energy(&self, _system: &LatticeSystem) -> f64 {
            0.0
        }

        fn bulk_pressure(&self, _densities: &[f64]) -> f64 {
            0.0
        }

        fn bulk_coexistence_densities(
            &self,
            _system: &LatticeSystem,
        ) -> Result<Vec<(f64, f64)>, FunctionalError> {
            Err(FunctionalError::NoPhaseSeparation)
        }
    }

    /// Every field is a fixed point: `candidate = exp(ln r - mu) * exp(mu)`.
    struct AnyFieldFixedPoint {
        mu: f64,
    }

    impl DensityFunctional for AnyFieldFixedPoint {
        fn excess_chemical_potential(&self, system: &LatticeSystem) -> Vec<ArrayD<f64>> {
            system
                .species()
                .iter()
                .map(|s| s.field.mapv(|r| r.ln() - self.mu))
                .collect()
        }

        fn free_energy(&self, _system: &LatticeSystem) -> f64 {
            0.0
        }

        fn bulk_pressure(&self, _densities: &[f64]) -> f64 {
            0.0
        }

        fn bulk_coexistence_densities(
            &self,
            _system: &LatticeSystem,
        ) -> Result<Vec<(f64, f64)>, FunctionalError> {
            Err(FunctionalError::NoPhaseSeparation)
        }
    }

    /// Returns NaN everywhere on the first call.
    struct PoisonedFunctional;

    impl DensityFunctional for PoisonedFunctional {
        fn excess_chemical_potential(&self, system: &LatticeSystem) -> Vec<ArrayD<f64>> {
            system
                .species()
                .iter()
                .map(|s| s.field.mapv(|_| f64::NAN))
                .collect()
        }

        fn free_energy(&self, _system: &LatticeSystem) -> f64 {
            0.0
        }

        fn bulk_pressure(&self, _densities: &[f64]) -> f64 {
            0.0
        }

        fn bulk_coexistence_densities(
            &self,
            _system: &LatticeSystem,
        ) -> Result<Vec<(f64, f64)>, FunctionalError> {
            Err(FunctionalError::NoPhaseSeparation)
        }
    }

    fn config(alpha: f64, steps: u64) -> IterationConfig {
        IterationConfig::new(alpha, steps, CheckpointPolicy::Every(5)).unwrap()
    }

    #[test]
    fn canonical_update_conserves_mass_for_any_alpha() {
        let model = MeanFieldLatticeGas::new(&[10, 10], BoundaryCondition::Periodic, 1.5).unwrap();
        for alpha in [0.05, 0.3, 0.5, 0.95] {
            let mut system = model
                .build_system(0.37, &Seed::Shape(NucleusShape::Point))
                .unwrap();
            for _ in 0..3 {
                step(&mut system, &model, alpha).unwrap();
                assert_relative_eq!(system.mean_densities()[0], 0.37, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn canonical_update_derives_the_chemical_potential() {
        let model = MeanFieldLatticeGas::new(&[8, 8], BoundaryCondition::Periodic, 1.5).unwrap();
        let mut system = model
            .build_system(0.3, &Seed::Shape(NucleusShape::Homogeneous))
            .unwrap();
        assert_eq!(system.species()[0].ensemble.chemical_potential(), None);
        step(&mut system, &model, 0.5).unwrap();
        let mu = system.species()[0].ensemble.chemical_potential().unwrap();
        // Homogeneous profile: mu = ln(dens / exp(mu_ex)).
        let mu_ex = (1.0 - 0.3f64).ln() + 1.5 * 4.0 * 0.3;
        assert_relative_eq!(mu, (0.3f64).ln() - mu_ex, max_relative = 1e-10);
    }

    #[test]
    fn grand_canonical_fixed_point_is_left_unchanged_for_any_alpha() {
        for alpha in [0.1, 0.5, 0.9] {
            let mut system = LatticeSystem::new(
                &[6, 6],
                BoundaryCondition::Periodic,
                &[SpeciesConfig::grand_canonical(0.7)],
            )
            .unwrap();
            let seed = ArrayD::from_elem(IxDyn(&[6, 6]), 0.42);
            system.seed_profiles(vec![seed.clone()]).unwrap();

            let errors = step(&mut system, &AnyFieldFixedPoint { mu: 0.7 }, alpha).unwrap();
            assert!(errors[0] < 1e-24);
            for (&after, &before) in system.species()[0].field.iter().zip(seed.iter()) {
                assert_relative_eq!(after, before, max_relative = 1e-12);
            }
            assert_relative_eq!(
                system.species()[0].ensemble.average_density().unwrap(),
                0.42,
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn divergence_is_detected_before_any_mutation() {
        let model = MeanFieldLatticeGas::new(&[6, 6], BoundaryCondition::Periodic, 1.5).unwrap();
        let mut system = model
            .build_system(0.4, &Seed::Shape(NucleusShape::Point))
            .unwrap();
        let before = system.clone();

        let reporter = ProgressReporter::new();
        let err = iterate(&mut system, &PoisonedFunctional, &config(0.5, 10), &reporter)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Divergence {
                species: 0,
                iteration: 0
            }
        ));

        assert_eq!(system.iteration(), before.iteration());
        assert_eq!(system.species()[0].field, before.species()[0].field);
        assert_eq!(
            system.species()[0].ensemble.chemical_potential(),
            before.species()[0].ensemble.chemical_potential()
        );
        assert_eq!(system.error_history().len(), before.error_history().len());
        assert_eq!(system.history().len(), before.history().len());
    }

    #[test]
    fn history_ends_with_the_terminal_state_and_increases_strictly() {
        let model = MeanFieldLatticeGas::new(&[8, 8], BoundaryCondition::Periodic, 1.5).unwrap();
        let mut system = model
            .build_system(0.4, &Seed::Shape(NucleusShape::Point))
            .unwrap();
        let reporter = ProgressReporter::new();
        iterate(&mut system, &model, &config(0.3, 17), &reporter).unwrap();

        let indices: Vec<u64> = system
            .history()
            .entries()
            .iter()
            .map(|s| s.iteration)
            .collect();
        assert_eq!(indices, vec![0, 5, 10, 15, 17]);
        assert_eq!(system.history().last_iteration(), Some(system.iteration()));
        assert_eq!(system.error_history().len(), 17);
    }

    #[test]
    fn early_stop_commits_the_terminal_snapshot_once() {
        let model = MeanFieldLatticeGas::new(&[8, 8], BoundaryCondition::Periodic, 1.0).unwrap();
        let mut system = model
            .build_system(0.3, &Seed::Shape(NucleusShape::Homogeneous))
            .unwrap();
        let reporter = ProgressReporter::new();
        // A homogeneous canonical profile is its own fixed point, so the very
        // first error vanishes.
        let report = iterate(
            &mut system,
            &model,
            &config(0.5, 1000).with_min_error(1e-20),
            &reporter,
        )
        .unwrap();
        assert!(report.converged());
        assert_eq!(system.history().last_iteration(), Some(system.iteration()));
        assert!(system.iteration() < 1000);
    }

    #[test]
    fn saturating_map_converges_from_a_homogeneous_seed() {
        let mut system = LatticeSystem::new(
            &[16, 16],
            BoundaryCondition::Periodic,
            &[SpeciesConfig::canonical(0.5)],
        )
        .unwrap();
        let reporter = ProgressReporter::new();
        let report = iterate(
            &mut system,
            &SaturatingMap,
            &config(0.5, 100).with_min_error(1e-10),
            &reporter,
        )
        .unwrap();
        assert!(report.converged());
        assert!(report.final_errors[0] < 1e-10);
    }

    #[test]
    fn saturating_map_relaxes_a_nucleus_to_the_uniform_fixed_point() {
        let mut system = LatticeSystem::new(
            &[16, 16],
            BoundaryCondition::Periodic,
            &[SpeciesConfig::canonical(0.5)],
        )
        .unwrap();
        system
            .seed_nucleus(&[0.5], &[NucleusShape::Point])
            .unwrap();
        let reporter = ProgressReporter::new();
        let report = iterate(
            &mut system,
            &SaturatingMap,
            &config(0.5, 100).with_min_error(1e-10),
            &reporter,
        )
        .unwrap();
        assert!(report.converged());
        for &v in system.species()[0].field.iter() {
            assert_relative_eq!(v, 0.5, epsilon = 1e-5);
        }
    }

    #[test]
    fn progress_events_trace_the_run() {
        use std::sync::Mutex;
        let events: Mutex<Vec<String>> = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            let label = match event {
                Progress::RunStart { .. } => "start",
                Progress::Checkpoint { .. } => "checkpoint",
                Progress::EarlyStop { .. } => "early-stop",
                Progress::RunFinish => "finish",
                Progress::Message(_) => "message",
            };
            events.lock().unwrap().push(label.to_string());
        }));

        let model = MeanFieldLatticeGas::new(&[8, 8], BoundaryCondition::Periodic, 1.5).unwrap();
        let mut system = model
            .build_system(0.4, &Seed::Shape(NucleusShape::Point))
            .unwrap();
        iterate(&mut system, &model, &config(0.3, 7), &reporter).unwrap();
        drop(reporter);

        let events = events.into_inner().unwrap();
        assert_eq!(events.first().map(String::as_str), Some("start"));
        assert_eq!(events.last().map(String::as_str), Some("finish"));
        assert!(events.iter().any(|e| e == "checkpoint"));
    }
}
