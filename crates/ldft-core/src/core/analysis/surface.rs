//! Surface and interface properties of a converged profile: interface shape
//! detection, excess grand potential, characteristic radii, surface tensions
//! and adsorption.
//!
//! The closed forms assume a single condensed inhomogeneity centered in the
//! simulation box and embedded in a (possibly supersaturated) vapour; for
//! bubble configurations the signs of the equimolar quantities are wrong.

use std::f64::consts::PI;

use ndarray::Axis;
use thiserror::Error;

use crate::core::functional::{DensityFunctional, FunctionalError, thermo};
use crate::core::lattice::LatticeSystem;

const FLATNESS_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceShape {
    Droplet,
    Cylinder,
    Slab,
    Homogeneous,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no closed form for a {shape:?} interface in {dims} dimensions")]
    UnsupportedShape { shape: InterfaceShape, dims: usize },

    #[error(transparent)]
    Functional(#[from] FunctionalError),
}

/// Mean deviation between the boundary slice and the central slice of the
/// species-0 field along `axis`. Vanishes when the profile is translation
/// invariant along that axis.
fn axis_deviation(system: &LatticeSystem, axis: usize) -> f64 {
    let field = &system.species()[0].field;
    let mid = system.shape()[axis] / 2;
    let edge = field.index_axis(Axis(axis), 0);
    let center = field.index_axis(Axis(axis), mid);
    let len = edge.len() as f64;
    (&edge.to_owned() - &center).sum() / len
}

/// Classifies the interface of the current configuration from the axis
/// deviations of the species-0 profile. Requires the inhomogeneity to be
/// centered in the box.
pub fn interface_shape(system: &LatticeSystem) -> InterfaceShape {
    let dims = system.ndim();
    let flat_axes = (0..dims)
        .filter(|&axis| axis_deviation(system, axis).abs() < FLATNESS_TOLERANCE)
        .count();
    match (dims, flat_axes) {
        (_, 0) => InterfaceShape::Droplet,
        (3, 1) => InterfaceShape::Cylinder,
        (2, 1) | (3, 2) => InterfaceShape::Slab,
        _ => InterfaceShape::Homogeneous,
    }
}

/// Pressure of the coexisting bulk vapour under the system's chemical
/// potential.
pub fn vapor_pressure(
    functional: &dyn DensityFunctional,
    system: &LatticeSystem,
) -> Result<f64, FunctionalError> {
    let coexistence = functional.bulk_coexistence_densities(system)?;
    let vapour: Vec<f64> = coexistence.iter().map(|&(v, _)| v).collect();
    Ok(functional.bulk_pressure(&vapour))
}

/// Pressure of the coexisting bulk liquid under the system's chemical
/// potential.
pub fn liquid_pressure(
    functional: &dyn DensityFunctional,
    system: &LatticeSystem,
) -> Result<f64, FunctionalError> {
    let coexistence = functional.bulk_coexistence_densities(system)?;
    let liquid: Vec<f64> = coexistence.iter().map(|&(_, l)| l).collect();
    Ok(functional.bulk_pressure(&liquid))
}

/// Grand-potential excess over a homogeneous (oversaturated) vapour at the
/// same chemical potential: `delta_omega = omega + p_vapour * V`.
pub fn excess_grand_potential(
    functional: &dyn DensityFunctional,
    system: &LatticeSystem,
) -> Result<f64, FunctionalError> {
    let omega = thermo::grand_potential(functional, system)?;
    Ok(omega + vapor_pressure(functional, system)? * system.sites() as f64)
}

/// Radius of the surface of tension of a centered droplet or cylinder. A
/// cylinder must point along axis 0.
pub fn surface_of_tension_radius(
    functional: &dyn DensityFunctional,
    system: &LatticeSystem,
) -> Result<f64, AnalysisError> {
    let delta_omega = excess_grand_potential(functional, system)?;
    let delta_p =
        liquid_pressure(functional, system)? - vapor_pressure(functional, system)?;
    let shape = interface_shape(system);
    let dims = system.ndim();
    match (dims, shape) {
        (3, InterfaceShape::Droplet) => {
            Ok((3.0 * delta_omega / (2.0 * delta_p * PI)).powf(1.0 / 3.0))
        }
        (2, InterfaceShape::Droplet) => Ok((delta_omega / (delta_p * PI)).sqrt()),
        (3, InterfaceShape::Cylinder) => {
            let height = system.shape()[0] as f64;
            Ok((delta_omega / (delta_p * PI * height)).sqrt())
        }
        _ => Err(AnalysisError::UnsupportedShape { shape, dims }),
    }
}

/// Equimolar radius of a droplet or cylinder for the given species. A pure
/// function of the field; no bulk information enters.
pub fn equimolar_radius(system: &LatticeSystem, species: usize) -> Result<f64, AnalysisError> {
    let field = &system.species()[species].field;
    let sites = system.sites() as f64;
    let mean = field.sum() / sites;
    let liquid = field.iter().cloned().fold(f64::MIN, f64::max);
    let vapour = field.iter().cloned().fold(f64::MAX, f64::min);
    let filled_fraction = (mean - vapour) / (liquid - vapour);
    let volume = filled_fraction * sites;

    let shape = interface_shape(system);
    let dims = system.ndim();
    match (dims, shape) {
        (3, InterfaceShape::Droplet) => Ok((volume * 3.0 / (4.0 * PI)).powf(1.0 / 3.0)),
        (2, InterfaceShape::Droplet) => Ok((volume / PI).sqrt()),
        (3, InterfaceShape::Cylinder) => {
            let height = system.shape()[0] as f64;
            Ok((volume / (PI * height)).sqrt())
        }
        _ => Err(AnalysisError::UnsupportedShape { shape, dims }),
    }
}

/// Surface tension attributed to a dividing surface of radius `radius`.
pub fn surface_tension_at_radius(
    functional: &dyn DensityFunctional,
    system: &LatticeSystem,
    radius: f64,
) -> Result<f64, AnalysisError> {
    let delta_omega = excess_grand_potential(functional, system)?;
    let delta_p =
        liquid_pressure(functional, system)? - vapor_pressure(functional, system)?;
    let shape = interface_shape(system);
    let dims = system.ndim();
    let (area, volume) = match (dims, shape) {
        (3, InterfaceShape::Droplet) => (
            4.0 * PI * radius * radius,
            4.0 * PI * radius.powi(3) / 3.0,
        ),
        (2, InterfaceShape::Droplet) => (2.0 * PI * radius, PI * radius * radius),
        (3, InterfaceShape::Cylinder) => {
            let height = system.shape()[0] as f64;
            (2.0 * PI * radius * height, PI * radius * radius * height)
        }
        _ => return Err(AnalysisError::UnsupportedShape { shape, dims }),
    };
    Ok(delta_omega / area + delta_p * volume / area)
}

/// Surface tension evaluated at the surface of tension.
pub fn surface_tension(
    functional: &dyn DensityFunctional,
    system: &LatticeSystem,
) -> Result<f64, AnalysisError> {
    let delta_omega = excess_grand_potential(functional, system)?;
    let delta_p =
        liquid_pressure(functional, system)? - vapor_pressure(functional, system)?;
    let shape = interface_shape(system);
    let dims = system.ndim();
    match (dims, shape) {
        (3, InterfaceShape::Droplet) => {
            Ok((delta_omega * delta_p * delta_p * 3.0 / (16.0 * PI)).powf(1.0 / 3.0))
        }
        (2, InterfaceShape::Droplet) => Ok((delta_omega * delta_p / PI).sqrt()),
        (3, InterfaceShape::Cylinder) => {
            let height = system.shape()[0] as f64;
            Ok((delta_omega * delta_p / (PI * height)).sqrt())
        }
        _ => Err(AnalysisError::UnsupportedShape { shape, dims }),
    }
}

/// Surface tension evaluated at the equimolar surface of the given species.
pub fn equimolar_surface_tension(
    functional: &dyn DensityFunctional,
    system: &LatticeSystem,
    species: usize,
) -> Result<f64, AnalysisError> {
    let radius = equimolar_radius(system, species)?;
    surface_tension_at_radius(functional, system, radius)
}

/// Adsorbed particle number and adsorption at the surface of tension for the
/// given species.
pub fn adsorption(
    functional: &dyn DensityFunctional,
    system: &LatticeSystem,
    species: usize,
) -> Result<(f64, f64), AnalysisError> {
    let field = &system.species()[species].field;
    let sites = system.sites() as f64;
    let mean = field.sum() / sites;
    let liquid = field.iter().cloned().fold(f64::MIN, f64::max);
    let vapour = field.iter().cloned().fold(f64::MAX, f64::min);

    let radius = surface_of_tension_radius(functional, system)?;
    let shape = interface_shape(system);
    let dims = system.ndim();
    let (area, droplet_volume) = match (dims, shape) {
        (3, InterfaceShape::Droplet) => (
            4.0 * PI * radius * radius,
            4.0 * PI * radius.powi(3) / 3.0,
        ),
        (2, InterfaceShape::Droplet) => (2.0 * PI * radius, PI * radius * radius),
        (3, InterfaceShape::Cylinder) => {
            let height = system.shape()[0] as f64;
            (2.0 * PI * radius * height, PI * radius * radius * height)
        }
        _ => return Err(AnalysisError::UnsupportedShape { shape, dims }),
    };

    let surrounding_volume = sites - droplet_volume;
    let excess = sites * mean - droplet_volume * liquid - surrounding_volume * vapour;
    Ok((excess, excess / area))
}

/// Surface tension of a flat interface of the given one-sided area. Every
/// slab configuration has two such interfaces.
pub fn planar_surface_tension(
    functional: &dyn DensityFunctional,
    system: &LatticeSystem,
    area: f64,
) -> Result<f64, FunctionalError> {
    Ok(excess_grand_potential(functional, system)? / (2.0 * area))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lattice::{BoundaryCondition, SpeciesConfig};
    use approx::assert_relative_eq;
    use ndarray::ArrayD;

    /// Bulk behaviour pinned to constants so the surface formulas can be
    /// checked by hand.
    struct PinnedBulk;

    impl DensityFunctional for PinnedBulk {
        fn excess_chemical_potential(&self, system: &LatticeSystem) -> Vec<ArrayD<f64>> {
            system
                .species()
                .iter()
                .map(|s| s.field.mapv(|_| 0.0))
                .collect()
        }

        fn free_energy(&self, _system: &LatticeSystem) -> f64 {
            0.0
        }

        fn bulk_pressure(&self, densities: &[f64]) -> f64 {
            if densities[0] < 0.5 { 0.002 } else { 0.004 }
        }

        fn bulk_coexistence_densities(
            &self,
            _system: &LatticeSystem,
        ) -> Result<Vec<(f64, f64)>, FunctionalError> {
            Ok(vec![(0.1, 0.9)])
        }
    }

    fn system_with_field(shape: &[usize], field: ArrayD<f64>) -> LatticeSystem {
        let mut system = LatticeSystem::new(
            shape,
            BoundaryCondition::Periodic,
            &[SpeciesConfig::grand_canonical(0.0)],
        )
        .unwrap();
        system.seed_profiles(vec![field]).unwrap();
        system
    }

    fn droplet_field(shape: &[usize]) -> ArrayD<f64> {
        let mut field = ArrayD::from_elem(ndarray::IxDyn(shape), 0.1);
        let center: Vec<usize> = shape.iter().map(|&n| n / 2).collect();
        for (index, value) in field.indexed_iter_mut() {
            let distance_sq: usize = (0..shape.len())
                .map(|ax| {
                    let d = index[ax] as isize - center[ax] as isize;
                    (d * d) as usize
                })
                .sum();
            if distance_sq <= 4 {
                *value = 0.9;
            }
        }
        field
    }

    #[test]
    fn homogeneous_profile_is_classified_as_homogeneous() {
        let field = ArrayD::from_elem(ndarray::IxDyn(&[8, 8]), 0.3);
        let system = system_with_field(&[8, 8], field);
        assert_eq!(interface_shape(&system), InterfaceShape::Homogeneous);
    }

    #[test]
    fn profile_varying_along_one_axis_is_a_slab() {
        let mut field = ArrayD::from_elem(ndarray::IxDyn(&[8, 8]), 0.1);
        for (index, value) in field.indexed_iter_mut() {
            if index[0] < 3 {
                *value = 0.9;
            }
        }
        let system = system_with_field(&[8, 8], field);
        assert_eq!(interface_shape(&system), InterfaceShape::Slab);
    }

    #[test]
    fn centered_bump_is_a_droplet() {
        let system = system_with_field(&[9, 9], droplet_field(&[9, 9]));
        assert_eq!(interface_shape(&system), InterfaceShape::Droplet);
    }

    #[test]
    fn bump_extended_along_axis_zero_is_a_cylinder_in_3d() {
        let shape = [6, 9, 9];
        let mut field = ArrayD::from_elem(ndarray::IxDyn(&shape), 0.1);
        for (index, value) in field.indexed_iter_mut() {
            let dy = index[1] as isize - 4;
            let dz = index[2] as isize - 4;
            if dy * dy + dz * dz <= 4 {
                *value = 0.9;
            }
        }
        let system = system_with_field(&shape, field);
        assert_eq!(interface_shape(&system), InterfaceShape::Cylinder);
    }

    #[test]
    fn excess_grand_potential_adds_the_vapour_work() {
        let system = system_with_field(&[9, 9], droplet_field(&[9, 9]));
        // Free energy is zero and mu = 0, so omega = 0 and
        // delta_omega = p_v * V.
        let delta = excess_grand_potential(&PinnedBulk, &system).unwrap();
        assert_relative_eq!(delta, 0.002 * 81.0, max_relative = 1e-12);
    }

    #[test]
    fn surface_of_tension_radius_follows_the_2d_closed_form() {
        let system = system_with_field(&[9, 9], droplet_field(&[9, 9]));
        let radius = surface_of_tension_radius(&PinnedBulk, &system).unwrap();
        let delta_omega = 0.002 * 81.0;
        let delta_p = 0.004 - 0.002;
        assert_relative_eq!(
            radius,
            (delta_omega / (delta_p * PI)).sqrt(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn radii_are_unavailable_for_slab_configurations() {
        let mut field = ArrayD::from_elem(ndarray::IxDyn(&[8, 8]), 0.1);
        for (index, value) in field.indexed_iter_mut() {
            if index[0] < 3 {
                *value = 0.9;
            }
        }
        let system = system_with_field(&[8, 8], field);
        let err = surface_of_tension_radius(&PinnedBulk, &system).unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedShape { .. }));
    }

    #[test]
    fn equimolar_radius_recovers_the_area_of_a_sharp_droplet() {
        let system = system_with_field(&[9, 9], droplet_field(&[9, 9]));
        let field = &system.species()[0].field;
        let filled = field.iter().filter(|&&v| v > 0.5).count() as f64;
        let radius = equimolar_radius(&system, 0).unwrap();
        assert_relative_eq!(radius, (filled / PI).sqrt(), max_relative = 1e-10);
    }
}
