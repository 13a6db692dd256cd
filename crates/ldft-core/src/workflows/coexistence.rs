use tracing::{debug, info, instrument};

use super::relax::sample_key;
use crate::core::functional::{DensityFunctional, Seed, SystemFactory, thermo};
use crate::core::io::SampleStore;
use crate::core::lattice::LatticeSystem;
use crate::engine::checkpoint::CheckpointPolicy;
use crate::engine::config::{ConfigError, IterationConfig};
use crate::engine::error::EngineError;
use crate::engine::picard;
use crate::engine::progress::{Progress, ProgressReporter};

/// Parameters of a phase-transition bisection search.
///
/// `accuracy` bounds the width of the reported transition window;
/// `probe_min_error` is the convergence target of each probe run and
/// `degeneracy_threshold` the free-energy window below which the two probes
/// are considered the same phase.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub alpha: f64,
    pub steps: u64,
    pub checkpoints: CheckpointPolicy,
    pub accuracy: f64,
    pub probe_min_error: f64,
    pub degeneracy_threshold: f64,
}

impl SearchConfig {
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::new()
    }
}

#[derive(Default)]
pub struct SearchConfigBuilder {
    alpha: Option<f64>,
    steps: Option<u64>,
    checkpoints: Option<CheckpointPolicy>,
    accuracy: Option<f64>,
    probe_min_error: Option<f64>,
    degeneracy_threshold: Option<f64>,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }
    pub fn steps(mut self, steps: u64) -> Self {
        self.steps = Some(steps);
        self
    }
    pub fn checkpoints(mut self, checkpoints: CheckpointPolicy) -> Self {
        self.checkpoints = Some(checkpoints);
        self
    }
    pub fn accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }
    pub fn probe_min_error(mut self, min_error: f64) -> Self {
        self.probe_min_error = Some(min_error);
        self
    }
    pub fn degeneracy_threshold(mut self, threshold: f64) -> Self {
        self.degeneracy_threshold = Some(threshold);
        self
    }

    pub fn build(self) -> Result<SearchConfig, ConfigError> {
        let alpha = self.alpha.ok_or(ConfigError::MissingParameter("alpha"))?;
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(ConfigError::AlphaOutOfRange(alpha));
        }
        let accuracy = self
            .accuracy
            .ok_or(ConfigError::MissingParameter("accuracy"))?;
        if !(accuracy > 0.0) {
            return Err(ConfigError::NonPositiveAccuracy(accuracy));
        }
        Ok(SearchConfig {
            alpha,
            steps: self.steps.ok_or(ConfigError::MissingParameter("steps"))?,
            checkpoints: self
                .checkpoints
                .ok_or(ConfigError::MissingParameter("checkpoints"))?,
            accuracy,
            probe_min_error: self.probe_min_error.unwrap_or(1e-20),
            degeneracy_threshold: self.degeneracy_threshold.unwrap_or(1e-3),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The transition lies inside this interval of width <= `accuracy`.
    Transition { low: f64, high: f64 },
    /// Both probes relaxed to the same phase at this density.
    NoTransition { density: f64 },
}

/// Bisects `[low, high]` toward a first-order transition.
///
/// Each round relaxes two fully independent systems at the interval midpoint,
/// one per competing phase, and compares their semi-grand potentials: the
/// more stable side keeps the midpoint as its new interval edge and
/// warm-starts its seed with the converged probe. Every probe is persisted
/// before the interval is narrowed. Terminates once the interval is narrower
/// than the configured accuracy, or as soon as the two probes are
/// free-energy degenerate.
#[instrument(skip_all, fields(low, high))]
pub fn run<M>(
    model: &M,
    low: f64,
    high: f64,
    seed_low: Seed,
    seed_high: Seed,
    config: &SearchConfig,
    store: &SampleStore,
    reporter: &ProgressReporter,
) -> Result<SearchOutcome, EngineError>
where
    M: DensityFunctional + SystemFactory + Sync,
{
    let probe_config = IterationConfig::new(config.alpha, config.steps, config.checkpoints)?
        .with_min_error(config.probe_min_error);

    let (mut low, mut high) = (low, high);
    let (mut seed_low, mut seed_high) = (seed_low, seed_high);
    let mut round = 0u32;

    while high - low > config.accuracy {
        round += 1;
        let mid = 0.5 * (low + high);
        reporter.report(Progress::Message(format!(
            "round {round}: probing density {mid:.6}"
        )));
        info!(round, mid, "probing interval midpoint");

        let (left, right) =
            run_probes(model, mid, &seed_low, &seed_high, &probe_config, reporter)?;
        let left_potential = thermo::semi_grand_potential(model, &left);
        let right_potential = thermo::semi_grand_potential(model, &right);
        debug!(left_potential, right_potential, "probe potentials");

        // Audit trail: both probes are persisted before the interval moves.
        store.save(&left, &sample_key(model, mid).with_tag("low"))?;
        store.save(&right, &sample_key(model, mid).with_tag("high"))?;

        if (left_potential - right_potential).abs() < config.degeneracy_threshold {
            store.save(&left, &sample_key(model, mid).with_tag("noTrans"))?;
            info!(mid, "probes are free-energy degenerate, no transition here");
            return Ok(SearchOutcome::NoTransition { density: mid });
        }
        if left_potential < right_potential {
            low = mid;
            seed_low = Seed::Profile(Box::new(left));
        } else {
            high = mid;
            seed_high = Seed::Profile(Box::new(right));
        }
    }

    info!(low, high, rounds = round, "transition window localized");
    Ok(SearchOutcome::Transition { low, high })
}

/// The two probe runs are fully independent; with the `parallel` feature
/// they execute concurrently and the results are combined deterministically.
fn run_probes<M>(
    model: &M,
    density: f64,
    seed_low: &Seed,
    seed_high: &Seed,
    config: &IterationConfig,
    reporter: &ProgressReporter,
) -> Result<(LatticeSystem, LatticeSystem), EngineError>
where
    M: DensityFunctional + SystemFactory + Sync,
{
    #[cfg(feature = "parallel")]
    {
        let (left, right) = rayon::join(
            || probe(model, density, seed_low, config, reporter),
            || probe(model, density, seed_high, config, reporter),
        );
        Ok((left?, right?))
    }
    #[cfg(not(feature = "parallel"))]
    {
        Ok((
            probe(model, density, seed_low, config, reporter)?,
            probe(model, density, seed_high, config, reporter)?,
        ))
    }
}

fn probe<M>(
    model: &M,
    density: f64,
    seed: &Seed,
    config: &IterationConfig,
    reporter: &ProgressReporter,
) -> Result<LatticeSystem, EngineError>
where
    M: DensityFunctional + SystemFactory,
{
    let mut system = model.build_system(density, seed)?;
    picard::iterate(&mut system, model, config, reporter)?;
    Ok(system)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::functional::FunctionalError;
    use crate::core::io::StoreConfig;
    use crate::core::lattice::{
        BoundaryCondition, LatticeError, NucleusShape, SpeciesConfig,
    };
    use ndarray::ArrayD;

    /// Every profile is a fixed point of the iteration, and the free energy
    /// makes the homogeneous phase win below `transition` and the nucleated
    /// phase win above it. This isolates the bisection logic from any real
    /// relaxation dynamics.
    struct TwoPhaseToy {
        shape: Vec<usize>,
        transition: f64,
    }

    impl TwoPhaseToy {
        fn is_structured(system: &LatticeSystem) -> bool {
            let field = &system.species()[0].field;
            let mean = field.sum() / field.len() as f64;
            field.iter().any(|&v| (v - mean).abs() > 1e-9)
        }
    }

    impl DensityFunctional for TwoPhaseToy {
        fn excess_chemical_potential(&self, system: &LatticeSystem) -> Vec<ArrayD<f64>> {
            // candidate = z * r with z = 1 for a mass-conserving profile:
            // every seed is already a fixed point.
            system
                .species()
                .iter()
                .map(|s| s.field.mapv(f64::ln))
                .collect()
        }

        fn free_energy(&self, system: &LatticeSystem) -> f64 {
            let mean = system.mean_densities()[0];
            if Self::is_structured(system) {
                self.transition - mean
            } else {
                0.0
            }
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

    impl SystemFactory for TwoPhaseToy {
        fn model_tag(&self) -> &'static str {
            "toy"
        }
        fn shape(&self) -> &[usize] {
            &self.shape
        }
        fn boundary(&self) -> BoundaryCondition {
            BoundaryCondition::Periodic
        }
        fn interaction_strength(&self) -> f64 {
            1.0
        }
        fn build_system(&self, density: f64, seed: &Seed) -> Result<LatticeSystem, LatticeError> {
            let mut system = LatticeSystem::new(
                &self.shape,
                BoundaryCondition::Periodic,
                &[SpeciesConfig::canonical(density)],
            )?;
            match seed {
                Seed::Shape(shape) => system.seed_nucleus(&[density], &[*shape])?,
                Seed::Profile(source) => {
                    // Carry the morphology of the source, renormalized to the
                    // probe density.
                    let factor = density / (source.mean_densities()[0]);
                    let field = source.species()[0].field.mapv(|v| v * factor);
                    system.seed_profiles(vec![field])?;
                }
            }
            Ok(system)
        }
    }

    fn search_config() -> SearchConfig {
        SearchConfig::builder()
            .alpha(0.5)
            .steps(50)
            .checkpoints(CheckpointPolicy::Every(10))
            .accuracy(0.01)
            .build()
            .unwrap()
    }

    fn store() -> (tempfile::TempDir, SampleStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SampleStore::new(StoreConfig {
            root: dir.path().to_path_buf(),
        });
        (dir, store)
    }

    #[test]
    fn builder_requires_the_core_parameters() {
        let err = SearchConfig::builder().build().unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("alpha"));

        let err = SearchConfig::builder()
            .alpha(0.5)
            .steps(10)
            .checkpoints(CheckpointPolicy::Every(5))
            .accuracy(0.0)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::NonPositiveAccuracy(0.0));
    }

    #[test]
    fn bisection_localizes_the_transition_within_the_round_bound() {
        let (_dir, store) = store();
        let model = TwoPhaseToy {
            shape: vec![10, 10],
            transition: 0.3701,
        };

        let outcome = run(
            &model,
            0.1,
            0.9,
            Seed::Shape(NucleusShape::Homogeneous),
            Seed::Shape(NucleusShape::Point),
            &search_config(),
            &store,
            &ProgressReporter::new(),
        )
        .unwrap();

        match outcome {
            SearchOutcome::Transition { low, high } => {
                assert!(high - low <= 0.01);
                assert!(low <= 0.3701 && 0.3701 <= high);
            }
            SearchOutcome::NoTransition { .. } => panic!("expected a transition window"),
        }
    }

    #[test]
    fn every_probe_leaves_an_audit_trail_in_the_store() {
        let (dir, store) = store();
        let model = TwoPhaseToy {
            shape: vec![10, 10],
            transition: 0.3701,
        };
        run(
            &model,
            0.1,
            0.9,
            Seed::Shape(NucleusShape::Homogeneous),
            Seed::Shape(NucleusShape::Point),
            &search_config(),
            &store,
            &ProgressReporter::new(),
        )
        .unwrap();

        let mut low_samples = 0;
        let mut high_samples = 0;
        for entry in walkdir(dir.path()) {
            let name = entry.file_name().unwrap().to_string_lossy().to_string();
            if name.contains("(low)") {
                low_samples += 1;
            }
            if name.contains("(high)") {
                high_samples += 1;
            }
        }
        // ceil(log2(0.8 / 0.01)) = 7 rounds, two probes each.
        assert_eq!(low_samples, 7);
        assert_eq!(high_samples, 7);
    }

    #[test]
    fn degenerate_probes_record_a_no_transition_sample() {
        let (dir, store) = store();
        // With an unstructured high seed both probes relax identically.
        let model = TwoPhaseToy {
            shape: vec![10, 10],
            transition: 0.3701,
        };
        let outcome = run(
            &model,
            0.1,
            0.9,
            Seed::Shape(NucleusShape::Homogeneous),
            Seed::Shape(NucleusShape::Homogeneous),
            &search_config(),
            &store,
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(outcome, SearchOutcome::NoTransition { density: 0.5 });
        assert!(
            walkdir(dir.path())
                .iter()
                .any(|p| p.to_string_lossy().contains("(noTrans)"))
        );
    }

    fn walkdir(root: &std::path::Path) -> Vec<std::path::PathBuf> {
        let mut files = Vec::new();
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in std::fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    files.push(path);
                }
            }
        }
        files
    }
}
