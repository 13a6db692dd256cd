//! Model functionals and bulk thermodynamics.
//!
//! Every lattice-gas variant is a distinct structure implementing the
//! [`DensityFunctional`] capability set; the iteration engine depends only on
//! this interface, never on a concrete variant type. The companion
//! [`SystemFactory`] trait covers model-specific system construction (shape,
//! boundary condition, auxiliary species) used by the workflows.

pub mod cavity;
pub mod highlander;
pub mod mean_field;
pub mod thermo;

use ndarray::ArrayD;
use thiserror::Error;

use crate::core::lattice::{LatticeError, LatticeSystem, NucleusShape};
use crate::core::utils::roots::RootsError;

#[derive(Debug, Error)]
pub enum FunctionalError {
    #[error("no phase separation at the current parameters")]
    NoPhaseSeparation,

    #[error("chemical potential of species {index} is not known yet")]
    ChemicalPotentialUnknown { index: usize },

    #[error("bulk root finding failed: {source}")]
    Roots {
        #[from]
        source: RootsError,
    },
}

/// Capability set of a lattice-gas model.
///
/// The engine calls [`Self::excess_chemical_potential`] once per Picard step;
/// the remaining capabilities serve free-energy comparison and bulk
/// phase-equilibrium analysis.
pub trait DensityFunctional {
    /// Excess chemical potential of the current profile, one array per
    /// species. Values may be non-finite; the engine treats NaN as the
    /// divergence signal.
    fn excess_chemical_potential(&self, system: &LatticeSystem) -> Vec<ArrayD<f64>>;

    /// Free energy of the current profile with every species treated
    /// canonically.
    fn free_energy(&self, system: &LatticeSystem) -> f64;

    /// Pressure of a homogeneous bulk system at the given per-species
    /// densities.
    fn bulk_pressure(&self, densities: &[f64]) -> f64;

    /// Coexisting (vapour, liquid) bulk densities per species under the
    /// system's current chemical potential.
    fn bulk_coexistence_densities(
        &self,
        system: &LatticeSystem,
    ) -> Result<Vec<(f64, f64)>, FunctionalError>;
}

/// Initial state for a freshly built system: a named nucleus geometry or the
/// converged profile of an earlier run.
#[derive(Debug, Clone)]
pub enum Seed {
    Shape(NucleusShape),
    Profile(Box<LatticeSystem>),
}

impl Seed {
    /// Label recorded in persisted sample names.
    pub fn tag(&self) -> &'static str {
        match self {
            Seed::Shape(shape) => shape.tag(),
            Seed::Profile(_) => "inhProf",
        }
    }
}

/// Model-side construction of lattice systems, used by the workflows to
/// probe a given average density from a given seed.
pub trait SystemFactory {
    /// Short model label used in persisted sample paths.
    fn model_tag(&self) -> &'static str;

    fn shape(&self) -> &[usize];

    fn boundary(&self) -> crate::core::lattice::BoundaryCondition;

    /// Attraction strength of the model (times the inverse temperature).
    fn interaction_strength(&self) -> f64;

    /// Builds a system whose primary species averages `density`, seeded from
    /// `seed`. Auxiliary species (if any) are initialized at their bulk
    /// values for that density.
    fn build_system(&self, density: f64, seed: &Seed) -> Result<LatticeSystem, LatticeError>;
}
