use ndarray::ArrayD;

use super::cavity;
use super::{DensityFunctional, FunctionalError, Seed, SystemFactory};
use crate::core::lattice::{
    BoundaryCondition, LatticeError, LatticeSystem, SpeciesConfig, boundary,
};
use crate::core::utils::roots;

/// Single-component lattice gas with sticky nearest-neighbour attraction on a
/// simple cubic lattice, treated in mean-field density functional theory.
///
/// Works in two and three dimensions; the coordination number is `2 * ndim`.
/// The only species (index 0) is the lattice-gas particle itself.
#[derive(Debug, Clone)]
pub struct MeanFieldLatticeGas {
    shape: Vec<usize>,
    boundary: BoundaryCondition,
    epsilon: f64,
}

impl MeanFieldLatticeGas {
    /// `epsilon` is the attraction strength times the inverse temperature.
    pub fn new(
        shape: &[usize],
        boundary: BoundaryCondition,
        epsilon: f64,
    ) -> Result<Self, LatticeError> {
        // Delegate shape/boundary validation to the system constructor.
        LatticeSystem::new(shape, boundary, &[SpeciesConfig::canonical(0.5)])?;
        Ok(Self {
            shape: shape.to_vec(),
            boundary,
            epsilon,
        })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Number of nearest neighbours per site.
    pub fn coordination(&self) -> usize {
        2 * self.shape.len()
    }

    /// Sum of the occupation field over all nearest neighbours of each site,
    /// honouring the boundary condition.
    fn neighbor_sum(&self, field: &ArrayD<f64>) -> ArrayD<f64> {
        let mut sum = ArrayD::zeros(field.raw_dim());
        for axis in 0..self.shape.len() {
            sum += &boundary::shift(field.view(), -1, axis, self.boundary);
            sum += &boundary::shift(field.view(), 1, axis, self.boundary);
        }
        sum
    }

    /// Bulk free energy density at density `rho`.
    pub fn bulk_free_energy_density(&self, rho: f64) -> f64 {
        let z = self.coordination() as f64;
        cavity::ideal_gas(rho) + cavity::phi_0(rho) - 0.5 * z * self.epsilon * rho * rho
    }

    /// Bulk chemical potential at density `rho`.
    pub fn bulk_chemical_potential(&self, rho: f64) -> f64 {
        let z = self.coordination() as f64;
        (rho / (1.0 - rho)).ln() - z * self.epsilon * rho
    }

    /// Bulk grand potential density at density `rho`.
    pub fn bulk_grand_potential_density(&self, rho: f64) -> f64 {
        self.bulk_free_energy_density(rho) - self.bulk_chemical_potential(rho) * rho
    }

    /// Spinodal densities, if the system is below its mean-field critical
    /// point (`z * epsilon > 4`).
    fn spinodal_densities(&self) -> Option<(f64, f64)> {
        let z_epsilon = self.coordination() as f64 * self.epsilon;
        if z_epsilon <= 4.0 {
            return None;
        }
        let half_width = 0.5 * (1.0 - 4.0 / z_epsilon).sqrt();
        Some((0.5 - half_width, 0.5 + half_width))
    }

    /// Coexisting (vapour, liquid) bulk densities at chemical potential `mu`.
    pub fn bulk_coexistence_for(&self, mu: f64) -> Result<(f64, f64), FunctionalError> {
        let (lower_spinodal, upper_spinodal) = self
            .spinodal_densities()
            .ok_or(FunctionalError::NoPhaseSeparation)?;
        let residual = |rho: f64| self.bulk_chemical_potential(rho) - mu;
        let vapour = roots::bisect(residual, 1e-12, lower_spinodal, 1e-12, 200)?;
        let liquid = roots::bisect(residual, upper_spinodal, 1.0 - 1e-12, 1e-12, 200)?;
        Ok((vapour, liquid))
    }
}

impl DensityFunctional for MeanFieldLatticeGas {
    fn excess_chemical_potential(&self, system: &LatticeSystem) -> Vec<ArrayD<f64>> {
        let field = &system.species()[0].field;
        let neighbors = self.neighbor_sum(field);
        let mu_ex = field.mapv(|r| (1.0 - r).ln()) + &(neighbors * self.epsilon);
        vec![mu_ex]
    }

    fn free_energy(&self, system: &LatticeSystem) -> f64 {
        let field = &system.species()[0].field;
        let ideal: f64 = field.mapv(cavity::ideal_gas).sum();
        let hard_core: f64 = field.mapv(cavity::phi_0).sum();
        let attraction = -0.5 * self.epsilon * (field * &self.neighbor_sum(field)).sum();
        ideal + hard_core + attraction
    }

    fn bulk_pressure(&self, densities: &[f64]) -> f64 {
        -self.bulk_grand_potential_density(densities[0])
    }

    fn bulk_coexistence_densities(
        &self,
        system: &LatticeSystem,
    ) -> Result<Vec<(f64, f64)>, FunctionalError> {
        let mu = system.species()[0]
            .ensemble
            .chemical_potential()
            .ok_or(FunctionalError::ChemicalPotentialUnknown { index: 0 })?;
        Ok(vec![self.bulk_coexistence_for(mu)?])
    }
}

impl SystemFactory for MeanFieldLatticeGas {
    fn model_tag(&self) -> &'static str {
        if self.shape.len() == 2 { "2d-mf" } else { "3d-mf" }
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn boundary(&self) -> BoundaryCondition {
        self.boundary
    }

    fn interaction_strength(&self) -> f64 {
        self.epsilon
    }

    fn build_system(&self, density: f64, seed: &Seed) -> Result<LatticeSystem, LatticeError> {
        let mut system = LatticeSystem::new(
            &self.shape,
            self.boundary,
            &[SpeciesConfig::canonical(density)],
        )?;
        match seed {
            Seed::Shape(shape) => system.seed_nucleus(&[density], &[*shape])?,
            Seed::Profile(source) => system.seed_from(source)?,
        }
        Ok(system)
    }
}
