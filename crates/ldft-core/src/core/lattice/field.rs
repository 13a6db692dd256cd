use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::boundary::BoundaryCondition;
use super::history::{History, Snapshot};
use super::nucleus::{self, NucleusShape};
use super::species::{Ensemble, SpeciesConfig, SpeciesState};

#[derive(Debug, Error, PartialEq)]
pub enum LatticeError {
    #[error("unsupported lattice dimension {0}: expected 2 or 3 axes")]
    UnsupportedDimension(usize),

    #[error("boundary condition {boundary:?} is incompatible with a {axes}-axis lattice")]
    BoundaryDimension {
        boundary: BoundaryCondition,
        axes: usize,
    },

    #[error(
        "tilted boundary conditions require exactly one axis of twice the extent of the others, got shape {shape:?}"
    )]
    TiltedShape { shape: Vec<usize> },

    #[error("lattice axes must have nonzero extent, got shape {shape:?}")]
    EmptyAxis { shape: Vec<usize> },

    #[error("species {index}: exactly one of chemical potential and average density must be set")]
    AmbiguousEnsemble { index: usize },

    #[error("species {index} is grand-canonical but no chemical potential was supplied")]
    MissingChemicalPotential { index: usize },

    #[error("species {index} is canonical but no average density was supplied")]
    MissingAverageDensity { index: usize },

    #[error("species {index}: array shape {got:?} does not match the lattice shape {expected:?}")]
    ShapeMismatch {
        index: usize,
        got: Vec<usize>,
        expected: Vec<usize>,
    },

    #[error("expected {expected} per-species entries, got {got}")]
    SpeciesCount { expected: usize, got: usize },
}

/// One lattice-gas system instance: per-species occupation fields plus the
/// scalar ensemble state, under a common shape and boundary condition.
///
/// A fresh system starts with a homogeneous profile per species (at the fixed
/// average density for canonical species, at 0.5 for grand-canonical ones);
/// the seeding operations replace it. Every seeding operation resets the
/// iteration counter to zero and truncates the history to a single seed
/// entry. During iteration only the engine mutates the fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatticeSystem {
    shape: Vec<usize>,
    boundary: BoundaryCondition,
    species: Vec<SpeciesState>,
    iteration: u64,
    history: History,
    error_history: Vec<Vec<f64>>,
}

impl LatticeSystem {
    pub fn new(
        shape: &[usize],
        boundary: BoundaryCondition,
        species: &[SpeciesConfig],
    ) -> Result<Self, LatticeError> {
        let axes = shape.len();
        if !(2..=3).contains(&axes) {
            return Err(LatticeError::UnsupportedDimension(axes));
        }
        if shape.contains(&0) {
            return Err(LatticeError::EmptyAxis {
                shape: shape.to_vec(),
            });
        }
        if !boundary.supports_axis_count(axes) {
            return Err(LatticeError::BoundaryDimension { boundary, axes });
        }
        if boundary.is_tilted() && !has_one_doubled_axis(shape) {
            return Err(LatticeError::TiltedShape {
                shape: shape.to_vec(),
            });
        }

        let states = species
            .iter()
            .enumerate()
            .map(|(index, config)| build_species(index, config, shape))
            .collect::<Result<Vec<_>, _>>()?;

        let seed_fields = states.iter().map(|s| s.field.clone()).collect();
        Ok(Self {
            shape: shape.to_vec(),
            boundary,
            species: states,
            iteration: 0,
            history: History::seeded(seed_fields),
            error_history: Vec::new(),
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of lattice sites.
    pub fn sites(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn boundary(&self) -> BoundaryCondition {
        self.boundary
    }

    /// Iterations performed since the system was last (re)seeded.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn species(&self) -> &[SpeciesState] {
        &self.species
    }

    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    /// Checkpoint history: sparse field snapshots plus the seed entry.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Per-step per-species error, retained in full for convergence
    /// diagnostics.
    pub fn error_history(&self) -> &[Vec<f64>] {
        &self.error_history
    }

    /// Current spatial average of each species field.
    pub fn mean_densities(&self) -> Vec<f64> {
        let sites = self.sites() as f64;
        self.species
            .iter()
            .map(|s| s.field.sum() / sites)
            .collect()
    }

    /// Seeds every species with a homogeneous profile carrying a centered
    /// nucleus of the given shape, sheared to match tilted boundary
    /// conditions. An all-zero extent (the `Homogeneous` shape) leaves the
    /// profile flat.
    pub fn seed_nucleus(
        &mut self,
        densities: &[f64],
        shapes: &[NucleusShape],
    ) -> Result<(), LatticeError> {
        let extents: Vec<Vec<usize>> = shapes.iter().map(|s| s.extents(&self.shape)).collect();
        let extent_refs: Vec<&[usize]> = extents.iter().map(|e| e.as_slice()).collect();
        self.seed_nucleus_extents(densities, &extent_refs)
    }

    /// As [`Self::seed_nucleus`], with explicit per-axis block extents.
    pub fn seed_nucleus_extents(
        &mut self,
        densities: &[f64],
        extents: &[&[usize]],
    ) -> Result<(), LatticeError> {
        self.check_species_count(densities.len())?;
        self.check_species_count(extents.len())?;
        let fields: Vec<ArrayD<f64>> = densities
            .iter()
            .zip(extents)
            .map(|(&density, extent)| {
                nucleus::nucleus_profile(&self.shape, self.boundary, density, extent)
            })
            .collect();
        self.reset_with(fields);
        Ok(())
    }

    /// Seeds from explicit per-species profiles.
    pub fn seed_profiles(&mut self, fields: Vec<ArrayD<f64>>) -> Result<(), LatticeError> {
        self.check_species_count(fields.len())?;
        for (index, field) in fields.iter().enumerate() {
            if field.shape() != self.shape.as_slice() {
                return Err(LatticeError::ShapeMismatch {
                    index,
                    got: field.shape().to_vec(),
                    expected: self.shape.clone(),
                });
            }
        }
        self.reset_with(fields);
        Ok(())
    }

    /// Copies another instance's current fields as the new initial state,
    /// discarding that instance's history.
    pub fn seed_from(&mut self, other: &LatticeSystem) -> Result<(), LatticeError> {
        let fields = other.species.iter().map(|s| s.field.clone()).collect();
        self.seed_profiles(fields)
    }

    fn check_species_count(&self, got: usize) -> Result<(), LatticeError> {
        if got != self.species.len() {
            return Err(LatticeError::SpeciesCount {
                expected: self.species.len(),
                got,
            });
        }
        Ok(())
    }

    fn reset_with(&mut self, fields: Vec<ArrayD<f64>>) {
        for (state, field) in self.species.iter_mut().zip(fields.iter()) {
            state.field = field.clone();
        }
        self.iteration = 0;
        self.history = History::seeded(fields);
        self.error_history.clear();
    }

    // Mutation surface reserved for the iteration engine.

    pub(crate) fn species_mut(&mut self) -> &mut [SpeciesState] {
        &mut self.species
    }

    pub(crate) fn advance_iteration(&mut self) {
        self.iteration += 1;
    }

    pub(crate) fn record_errors(&mut self, errors: Vec<f64>) {
        self.error_history.push(errors);
    }

    /// Appends a snapshot of the current fields to the history.
    pub(crate) fn commit_snapshot(&mut self) {
        let errors = self.error_history.last().cloned();
        let snapshot = Snapshot {
            iteration: self.iteration,
            fields: self.species.iter().map(|s| s.field.clone()).collect(),
            errors,
        };
        self.history.append(snapshot);
    }
}

fn has_one_doubled_axis(shape: &[usize]) -> bool {
    let max = match shape.iter().copied().max() {
        Some(m) => m,
        None => return false,
    };
    let long_axes = shape.iter().filter(|&&n| n == max).count();
    long_axes == 1 && shape.iter().filter(|&&n| n != max).all(|&n| n * 2 == max)
}

fn build_species(
    index: usize,
    config: &SpeciesConfig,
    shape: &[usize],
) -> Result<SpeciesState, LatticeError> {
    let ensemble = match (config.chemical_potential, config.average_density) {
        (Some(_), Some(_)) | (None, None) => {
            return Err(LatticeError::AmbiguousEnsemble { index });
        }
        (Some(mu), None) => {
            if !config.grand_canonical {
                return Err(LatticeError::MissingAverageDensity { index });
            }
            Ensemble::GrandCanonical {
                chemical_potential: mu,
                average_density: None,
            }
        }
        (None, Some(density)) => {
            if config.grand_canonical {
                return Err(LatticeError::MissingChemicalPotential { index });
            }
            Ensemble::Canonical {
                average_density: density,
                chemical_potential: None,
            }
        }
    };

    let external_potential = match &config.external_potential {
        Some(v_ext) => {
            if v_ext.shape() != shape {
                return Err(LatticeError::ShapeMismatch {
                    index,
                    got: v_ext.shape().to_vec(),
                    expected: shape.to_vec(),
                });
            }
            v_ext.clone()
        }
        None => ArrayD::zeros(IxDyn(shape)),
    };

    let initial_density = ensemble.average_density().unwrap_or(0.5);
    Ok(SpeciesState {
        field: ArrayD::from_elem(IxDyn(shape), initial_density),
        external_potential,
        ensemble,
    })
}
