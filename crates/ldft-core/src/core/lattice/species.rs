use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

/// Scalar constraint of one species during iteration.
///
/// Exactly one of the two thermodynamic scalars is authoritative at any time:
/// a grand-canonical species keeps its chemical potential fixed and derives
/// the average density each step, a canonical species keeps its average
/// density fixed and derives the chemical potential. The derived quantity is
/// `None` until the first Picard update computes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Ensemble {
    GrandCanonical {
        chemical_potential: f64,
        average_density: Option<f64>,
    },
    Canonical {
        average_density: f64,
        chemical_potential: Option<f64>,
    },
}

impl Ensemble {
    pub fn is_grand_canonical(&self) -> bool {
        matches!(self, Ensemble::GrandCanonical { .. })
    }

    /// Chemical potential, fixed or derived. `None` for a canonical species
    /// that has not been iterated yet.
    pub fn chemical_potential(&self) -> Option<f64> {
        match self {
            Ensemble::GrandCanonical {
                chemical_potential, ..
            } => Some(*chemical_potential),
            Ensemble::Canonical {
                chemical_potential, ..
            } => *chemical_potential,
        }
    }

    /// Average density, fixed or derived. `None` for a grand-canonical
    /// species that has not been iterated yet.
    pub fn average_density(&self) -> Option<f64> {
        match self {
            Ensemble::GrandCanonical {
                average_density, ..
            } => *average_density,
            Ensemble::Canonical {
                average_density, ..
            } => Some(*average_density),
        }
    }
}

/// Full state of one species: its occupation field, the additive external
/// potential, and the ensemble constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesState {
    pub field: ArrayD<f64>,
    pub external_potential: ArrayD<f64>,
    pub ensemble: Ensemble,
}

/// Per-species construction parameters for [`super::LatticeSystem::new`].
///
/// Exactly one of `chemical_potential` and `average_density` must be
/// supplied, and it must match the `grand_canonical` flag; the external
/// potential defaults to zero everywhere.
#[derive(Debug, Clone, Default)]
pub struct SpeciesConfig {
    pub grand_canonical: bool,
    pub chemical_potential: Option<f64>,
    pub average_density: Option<f64>,
    pub external_potential: Option<ArrayD<f64>>,
}

impl SpeciesConfig {
    /// Canonical species with a fixed average density.
    pub fn canonical(average_density: f64) -> Self {
        Self {
            grand_canonical: false,
            average_density: Some(average_density),
            ..Self::default()
        }
    }

    /// Grand-canonical species with a fixed chemical potential.
    pub fn grand_canonical(chemical_potential: f64) -> Self {
        Self {
            grand_canonical: true,
            chemical_potential: Some(chemical_potential),
            ..Self::default()
        }
    }

    pub fn with_external_potential(mut self, v_ext: ArrayD<f64>) -> Self {
        self.external_potential = Some(v_ext);
        self
    }
}
