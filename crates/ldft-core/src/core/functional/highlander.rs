use ndarray::ArrayD;

use super::cavity::{d2phi_0, dphi_0, ideal_gas, phi_0};
use super::{DensityFunctional, FunctionalError, Seed, SystemFactory};
use crate::core::lattice::{
    BoundaryCondition, LatticeError, LatticeSystem, NucleusShape, SpeciesConfig, boundary,
};
use crate::core::utils::roots;

/// Species index of the lattice-gas particles (the colloids of the AO
/// mapping).
pub const COLLOID: usize = 0;
/// Species index of the polymer clusters mediating attraction along axis 1.
pub const POLYMER_X: usize = 1;
/// Species index of the polymer clusters mediating attraction along axis 0.
pub const POLYMER_Y: usize = 2;

/// Single-component 2-D lattice gas with sticky nearest-neighbour attraction,
/// described by translating the model to the Asakura-Oosawa (AO)
/// colloid-polymer mixture and setting up the functional of the resulting
/// three-species dispersion with the Highlander construction.
///
/// The three species are the colloids plus one polymer-cluster species per
/// lattice direction; both polymer species are always grand-canonical with a
/// chemical potential fixed by the attraction strength. The lattice-gas free
/// energy is the semi-grand potential in which the polymers are traced out.
#[derive(Debug, Clone)]
pub struct AoHighlander2d {
    shape: Vec<usize>,
    boundary: BoundaryCondition,
    epsilon: f64,
    polymer_mu: f64,
}

/// Maps the lattice-gas attraction strength to the polymer-cluster chemical
/// potential of the AO mixture.
pub fn polymer_mu_from_epsilon(epsilon: f64) -> f64 {
    (epsilon.exp() - 1.0).ln()
}

/// Inverse of [`polymer_mu_from_epsilon`].
pub fn epsilon_from_polymer_mu(polymer_mu: f64) -> f64 {
    (polymer_mu.exp() + 1.0).ln()
}

impl AoHighlander2d {
    /// `epsilon` is the attraction strength times the inverse temperature.
    pub fn new(
        shape: &[usize],
        boundary: BoundaryCondition,
        epsilon: f64,
    ) -> Result<Self, LatticeError> {
        if shape.len() != 2 {
            return Err(LatticeError::UnsupportedDimension(shape.len()));
        }
        // Delegate the remaining shape/boundary validation.
        LatticeSystem::new(shape, boundary, &[SpeciesConfig::canonical(0.5)])?;
        Ok(Self {
            shape: shape.to_vec(),
            boundary,
            epsilon,
            polymer_mu: polymer_mu_from_epsilon(epsilon),
        })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn polymer_mu(&self) -> f64 {
        self.polymer_mu
    }

    /// Weighted densities n1..n7 of the Highlander functional. Each pair
    /// (n1, n2) and (n3, n4) couples the colloid field to one polymer
    /// direction through a boundary-aware shift.
    fn weighted_densities(&self, system: &LatticeSystem) -> [ArrayD<f64>; 7] {
        let bc = system.boundary();
        let r_c = &system.species()[COLLOID].field;
        let r_px = &system.species()[POLYMER_X].field;
        let r_py = &system.species()[POLYMER_Y].field;
        [
            r_c + r_px,
            boundary::shift(r_c.view(), -1, 1, bc) + r_px,
            r_c + r_py,
            boundary::shift(r_c.view(), -1, 0, bc) + r_py,
            r_px.clone(),
            r_py.clone(),
            r_c.clone(),
        ]
    }

    /// Bulk polymer-cluster density coexisting with colloid density `r_c`.
    pub fn bulk_polymer_density(&self, r_c: f64) -> f64 {
        let z = self.polymer_mu.exp();
        let a = 1.0 + 2.0 * z * (1.0 - r_c);
        (a - (a * a - 4.0 * z * (z + 1.0) * (1.0 - r_c) * (1.0 - r_c)).sqrt())
            / (2.0 * (z + 1.0))
    }

    /// Derivative of the bulk polymer density with respect to `r_c`.
    pub fn bulk_polymer_density_derivative(&self, r_c: f64) -> f64 {
        let z = self.polymer_mu.exp();
        -z / (z + 1.0) * (1.0 + (1.0 - 2.0 * r_c) / (4.0 * z * (1.0 - r_c) * r_c + 1.0).sqrt())
    }

    /// Bulk lattice-gas chemical potential at colloid density `r_c`.
    pub fn bulk_chemical_potential(&self, r_c: f64) -> f64 {
        let z = self.polymer_mu.exp();
        let r_pc = self.bulk_polymer_density(r_c);
        r_c.ln() + 4.0 * dphi_0(r_c + r_pc) - 3.0 * dphi_0(r_c) - 4.0 * (z + 1.0).ln()
    }

    /// Derivative of the bulk lattice-gas chemical potential.
    pub fn bulk_chemical_potential_derivative(&self, r_c: f64) -> f64 {
        let r_pc = self.bulk_polymer_density(r_c);
        let dr_pc = self.bulk_polymer_density_derivative(r_c);
        1.0 / r_c + 4.0 * d2phi_0(r_c + r_pc) * (1.0 + dr_pc) - 3.0 * d2phi_0(r_c)
    }

    /// Bulk lattice-gas free energy density at colloid density `r_c` (the
    /// polymers traced out at their coexisting bulk density).
    pub fn bulk_free_energy_density(&self, r_c: f64) -> f64 {
        let z = self.polymer_mu.exp();
        let r_pc = self.bulk_polymer_density(r_c);
        let f_ao_id = ideal_gas(r_c) + 2.0 * r_pc * (r_pc.ln() - 1.0);
        let f_ao_ex = 4.0 * phi_0(r_c + r_pc) - 3.0 * phi_0(r_c) - 2.0 * phi_0(r_pc);
        let f_tilde = f_ao_id + f_ao_ex - 2.0 * (z + 1.0).ln() * (2.0 * r_c - 1.0);
        f_tilde - 2.0 * r_pc * self.polymer_mu
    }

    /// Bulk lattice-gas grand potential density at colloid density `r_c`.
    pub fn bulk_grand_potential_density(&self, r_c: f64) -> f64 {
        self.bulk_free_energy_density(r_c) - self.bulk_chemical_potential(r_c) * r_c
    }

    /// Coexisting (vapour, liquid) colloid densities at lattice-gas chemical
    /// potential `mu`.
    pub fn bulk_coexistence_for(&self, mu: f64) -> Result<(f64, f64), FunctionalError> {
        let spinodals = roots::sign_changes(
            |r| self.bulk_chemical_potential_derivative(r),
            1e-6,
            1.0 - 1e-6,
            512,
            1e-10,
        );
        if spinodals.len() < 2 {
            return Err(FunctionalError::NoPhaseSeparation);
        }
        let lower = spinodals[0];
        let upper = spinodals[spinodals.len() - 1];
        let residual = |r: f64| self.bulk_chemical_potential(r) - mu;
        let vapour = roots::bisect(residual, 1e-9, lower, 1e-12, 200)?;
        let liquid = roots::bisect(residual, upper, 1.0 - 1e-9, 1e-12, 200)?;
        Ok((vapour, liquid))
    }

    /// Free energy of the lattice gas: the three-species free energy with the
    /// polymer contributions subtracted at their fixed chemical potential.
    pub fn lattice_gas_free_energy(&self, system: &LatticeSystem) -> f64 {
        let polymers = system.species()[POLYMER_X].field.sum()
            + system.species()[POLYMER_Y].field.sum();
        self.free_energy(system) - self.polymer_mu * polymers
    }
}

impl DensityFunctional for AoHighlander2d {
    fn excess_chemical_potential(&self, system: &LatticeSystem) -> Vec<ArrayD<f64>> {
        let bc = system.boundary();
        let [n1, n2, n3, n4, n5, n6, n7] = self.weighted_densities(system);
        let z = self.polymer_mu.exp();

        let n2_back = boundary::shift(n2.view(), 1, 1, bc);
        let n4_back = boundary::shift(n4.view(), 1, 0, bc);

        let mut mu_colloid = ArrayD::zeros(n1.raw_dim());
        ndarray::Zip::from(&mut mu_colloid)
            .and(&n1)
            .and(&n2_back)
            .and(&n3)
            .and(&n4_back)
            .and(&n7)
            .for_each(|out, &a, &b, &c, &d, &g| {
                *out = ((1.0 - a) * (1.0 - b) * (1.0 - c) * (1.0 - d)
                    / (1.0 - g).powi(3))
                .ln()
                    + 4.0 * (z + 1.0).ln();
            });

        let mut mu_polymer_x = ArrayD::zeros(n1.raw_dim());
        ndarray::Zip::from(&mut mu_polymer_x)
            .and(&n1)
            .and(&n2)
            .and(&n5)
            .for_each(|out, &a, &b, &e| {
                *out = ((1.0 - a) * (1.0 - b) / (1.0 - e)).ln();
            });

        let mut mu_polymer_y = ArrayD::zeros(n1.raw_dim());
        ndarray::Zip::from(&mut mu_polymer_y)
            .and(&n3)
            .and(&n4)
            .and(&n6)
            .for_each(|out, &c, &d, &e| {
                *out = ((1.0 - c) * (1.0 - d) / (1.0 - e)).ln();
            });

        vec![mu_colloid, mu_polymer_x, mu_polymer_y]
    }

    fn free_energy(&self, system: &LatticeSystem) -> f64 {
        let bc = system.boundary();
        let r_c = &system.species()[COLLOID].field;
        let [n1, n2, n3, n4, n5, n6, n7] = self.weighted_densities(system);
        let z = self.polymer_mu.exp();

        let ideal: f64 = system
            .species()
            .iter()
            .map(|s| s.field.mapv(ideal_gas).sum())
            .sum();
        let excess = n1.mapv(phi_0).sum() + n2.mapv(phi_0).sum() + n3.mapv(phi_0).sum()
            + n4.mapv(phi_0).sum()
            - n5.mapv(phi_0).sum()
            - n6.mapv(phi_0).sum()
            - 3.0 * n7.mapv(phi_0).sum();

        let one_body_x =
            (boundary::shift(r_c.view(), -1, 1, bc) + r_c).sum() - system.sites() as f64;
        let one_body_y =
            (boundary::shift(r_c.view(), -1, 0, bc) + r_c).sum() - system.sites() as f64;

        ideal + excess - (z + 1.0).ln() * (one_body_x + one_body_y)
    }

    fn bulk_pressure(&self, densities: &[f64]) -> f64 {
        -self.bulk_grand_potential_density(densities[COLLOID])
    }

    fn bulk_coexistence_densities(
        &self,
        system: &LatticeSystem,
    ) -> Result<Vec<(f64, f64)>, FunctionalError> {
        let mu = system.species()[COLLOID]
            .ensemble
            .chemical_potential()
            .ok_or(FunctionalError::ChemicalPotentialUnknown { index: COLLOID })?;
        let (vapour, liquid) = self.bulk_coexistence_for(mu)?;
        let polymer = (
            self.bulk_polymer_density(vapour),
            self.bulk_polymer_density(liquid),
        );
        Ok(vec![(vapour, liquid), polymer, polymer])
    }
}

impl SystemFactory for AoHighlander2d {
    fn model_tag(&self) -> &'static str {
        "2d-highl"
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
            &[
                SpeciesConfig::canonical(density),
                SpeciesConfig::grand_canonical(self.polymer_mu),
                SpeciesConfig::grand_canonical(self.polymer_mu),
            ],
        )?;
        match seed {
            Seed::Shape(shape) => {
                let polymer = self.bulk_polymer_density(density);
                system.seed_nucleus(
                    &[density, polymer, polymer],
                    &[*shape, NucleusShape::Homogeneous, NucleusShape::Homogeneous],
                )?;
            }
            Seed::Profile(source) => system.seed_from(source)?,
        }
        Ok(system)
    }
}
