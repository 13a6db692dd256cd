pub mod relax;
pub mod resume;
pub mod search;
pub mod series;

use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::{BoundaryKind, ModelArgs, ModelKind};
use crate::error::{CliError, Result};
use crate::params::ParameterFile;
use ldft::core::functional::highlander::AoHighlander2d;
use ldft::core::functional::mean_field::MeanFieldLatticeGas;
use ldft::core::functional::Seed;
use ldft::core::io::{SampleStore, StoreConfig};
use ldft::core::lattice::{BoundaryCondition, NucleusShape};
use ldft::engine::{Progress, ProgressReporter};

/// Shared command state derived from the global CLI flags.
pub struct Context {
    pub store: SampleStore,
    pub params: ParameterFile,
}

impl Context {
    pub fn new(data_root: &Path, params: ParameterFile) -> Self {
        Self {
            store: SampleStore::new(StoreConfig {
                root: data_root.to_path_buf(),
            }),
            params,
        }
    }
}

pub(crate) enum Model {
    MeanField(MeanFieldLatticeGas),
    Highlander(AoHighlander2d),
}

pub(crate) fn boundary_condition(kind: BoundaryKind) -> BoundaryCondition {
    match kind {
        BoundaryKind::Periodic => BoundaryCondition::Periodic,
        BoundaryKind::Tilted11 => BoundaryCondition::Tilted11,
        BoundaryKind::Tilted110 => BoundaryCondition::Tilted110,
        BoundaryKind::Tilted111 => BoundaryCondition::Tilted111,
    }
}

/// A quadratic (cubic) box; tilted boundary conditions double the last axis
/// to satisfy the 2:1 shape requirement.
pub(crate) fn lattice_shape(dims: usize, size: usize, boundary: BoundaryCondition) -> Vec<usize> {
    let mut shape = vec![size; dims];
    if boundary.is_tilted() {
        *shape.last_mut().expect("dims is 2 or 3") = 2 * size;
    }
    shape
}

pub(crate) fn build_model(args: &ModelArgs) -> Result<Model> {
    let boundary = boundary_condition(args.boundary);
    let dims = match args.model {
        ModelKind::MeanField2d | ModelKind::Highlander2d => 2,
        ModelKind::MeanField3d => 3,
    };
    let shape = lattice_shape(dims, args.size, boundary);
    Ok(match args.model {
        ModelKind::MeanField2d | ModelKind::MeanField3d => {
            Model::MeanField(MeanFieldLatticeGas::new(&shape, boundary, args.epsilon)?)
        }
        ModelKind::Highlander2d => {
            Model::Highlander(AoHighlander2d::new(&shape, boundary, args.epsilon)?)
        }
    })
}

/// `hom`, `sph`, `cyl`, `sl`, or the path of a previously saved sample whose
/// latest profile is taken over.
pub(crate) fn parse_seed(input: &str) -> Result<Seed> {
    match input {
        "hom" => Ok(Seed::Shape(NucleusShape::Homogeneous)),
        "sph" => Ok(Seed::Shape(NucleusShape::Point)),
        "cyl" => Ok(Seed::Shape(NucleusShape::Cylinder)),
        "sl" => Ok(Seed::Shape(NucleusShape::Slab)),
        path if Path::new(path).is_file() => {
            let system = SampleStore::load_from(Path::new(path))?;
            Ok(Seed::Profile(Box::new(system)))
        }
        other => Err(CliError::UnknownSeed(other.to_string())),
    }
}

/// Runs `f` with a reporter that renders engine progress as an indicatif bar.
pub(crate) fn run_with_progress<T>(f: impl FnOnce(&ProgressReporter) -> T) -> T {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let reporter = ProgressReporter::with_callback(Box::new({
        let bar = bar.clone();
        move |event| match event {
            Progress::RunStart { steps } => {
                bar.set_length(steps);
                bar.set_position(0);
            }
            Progress::Checkpoint { iteration, error } => {
                bar.set_position(iteration);
                bar.set_message(format!("error {error:.3e}"));
            }
            Progress::EarlyStop { iteration } => {
                bar.set_position(iteration);
                bar.set_message("converged".to_string());
            }
            Progress::RunFinish => {}
            Progress::Message(text) => bar.println(text),
        }
    }));
    let result = f(&reporter);
    bar.finish_and_clear();
    result
}
