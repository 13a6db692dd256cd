//! Thermodynamic potentials of the current density profile.
//!
//! All three potentials are pure functions of the current fields and the
//! fixed ensemble parameters; they never mutate the system.

use super::{DensityFunctional, FunctionalError};
use crate::core::lattice::LatticeSystem;

/// Free energy with every species treated canonically.
pub fn free_energy(functional: &dyn DensityFunctional, system: &LatticeSystem) -> f64 {
    functional.free_energy(system)
}

/// Grand potential: free energy minus `mu_i * N_i` for every species.
///
/// Fails if any chemical potential is still unknown (a canonical species
/// before its first Picard update).
pub fn grand_potential(
    functional: &dyn DensityFunctional,
    system: &LatticeSystem,
) -> Result<f64, FunctionalError> {
    let mut omega = functional.free_energy(system);
    for (index, species) in system.species().iter().enumerate() {
        let mu = species
            .ensemble
            .chemical_potential()
            .ok_or(FunctionalError::ChemicalPotentialUnknown { index })?;
        omega -= mu * species.field.sum();
    }
    Ok(omega)
}

/// Semi-grand potential: only chemical-potential-fixed species contribute a
/// `mu_i * N_i` subtraction; canonical species stay at their free energy.
pub fn semi_grand_potential(functional: &dyn DensityFunctional, system: &LatticeSystem) -> f64 {
    let mut omega = functional.free_energy(system);
    for species in system.species() {
        if let Some(mu) = species.ensemble.chemical_potential() {
            if species.ensemble.is_grand_canonical() {
                omega -= mu * species.field.sum();
            }
        }
    }
    omega
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lattice::{BoundaryCondition, LatticeSystem, SpeciesConfig};
    use approx::assert_relative_eq;
    use ndarray::ArrayD;

    /// Functional with zero excess contribution; free energy is the plain
    /// ideal-gas sum, which makes the potentials easy to check by hand.
    struct IdealGas;

    impl DensityFunctional for IdealGas {
        fn excess_chemical_potential(&self, system: &LatticeSystem) -> Vec<ArrayD<f64>> {
            system
                .species()
                .iter()
                .map(|s| s.field.mapv(|_| 0.0))
                .collect()
        }

        fn free_energy(&self, system: &LatticeSystem) -> f64 {
            system
                .species()
                .iter()
                .map(|s| s.field.mapv(super::super::cavity::ideal_gas).sum())
                .sum()
        }

        fn bulk_pressure(&self, densities: &[f64]) -> f64 {
            densities[0]
        }

        fn bulk_coexistence_densities(
            &self,
            _system: &LatticeSystem,
        ) -> Result<Vec<(f64, f64)>, FunctionalError> {
            Err(FunctionalError::NoPhaseSeparation)
        }
    }

    #[test]
    fn grand_potential_subtracts_every_species() {
        let system = LatticeSystem::new(
            &[4, 4],
            BoundaryCondition::Periodic,
            &[
                SpeciesConfig::grand_canonical(0.2),
                SpeciesConfig::grand_canonical(-0.1),
            ],
        )
        .unwrap();
        let f = free_energy(&IdealGas, &system);
        let omega = grand_potential(&IdealGas, &system).unwrap();
        let particles: f64 = system.species()[0].field.sum();
        assert_relative_eq!(omega, f - 0.2 * particles + 0.1 * particles, max_relative = 1e-12);
    }

    #[test]
    fn grand_potential_requires_known_chemical_potentials() {
        let system = LatticeSystem::new(
            &[4, 4],
            BoundaryCondition::Periodic,
            &[SpeciesConfig::canonical(0.4)],
        )
        .unwrap();
        let err = grand_potential(&IdealGas, &system).unwrap_err();
        assert!(matches!(
            err,
            FunctionalError::ChemicalPotentialUnknown { index: 0 }
        ));
    }

    #[test]
    fn semi_grand_potential_skips_canonical_species() {
        let system = LatticeSystem::new(
            &[4, 4],
            BoundaryCondition::Periodic,
            &[
                SpeciesConfig::canonical(0.4),
                SpeciesConfig::grand_canonical(0.3),
            ],
        )
        .unwrap();
        let f = free_energy(&IdealGas, &system);
        let semi = semi_grand_potential(&IdealGas, &system);
        let gc_particles: f64 = system.species()[1].field.sum();
        assert_relative_eq!(semi, f - 0.3 * gc_particles, max_relative = 1e-12);
    }
}
