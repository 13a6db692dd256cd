use ndarray::{ArrayD, Axis, IxDyn, Slice};
use serde::{Deserialize, Serialize};

use super::boundary::{self, BoundaryCondition};

/// Named seed geometries for the initial density profile.
///
/// The nucleus is a centered sub-block of elevated (or depressed) density
/// that biases convergence toward a particular phase morphology. The block
/// side used by `Point`, `Cylinder` and `Slab` is `max(shape[0] / 20, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NucleusShape {
    /// No nucleus: a homogeneous profile.
    Homogeneous,
    /// A small cube (square in 2-D) in the center.
    Point,
    /// A small cross-section extended over the full extent of axis 0.
    Cylinder,
    /// A thin layer spanning every axis except the last.
    Slab,
}

impl NucleusShape {
    /// Per-axis extent of the nucleus block for a lattice of the given shape.
    pub fn extents(&self, shape: &[usize]) -> Vec<usize> {
        let side = (shape[0] / 20).max(1);
        match self {
            NucleusShape::Homogeneous => vec![0; shape.len()],
            NucleusShape::Point => vec![side; shape.len()],
            NucleusShape::Cylinder => {
                let mut extent = vec![side; shape.len()];
                extent[0] = shape[0];
                extent
            }
            NucleusShape::Slab => {
                let mut extent = shape.to_vec();
                *extent.last_mut().expect("shape is never empty") = side;
                extent
            }
        }
    }

    /// Short label used in persisted sample names.
    pub fn tag(&self) -> &'static str {
        match self {
            NucleusShape::Homogeneous => "hom",
            NucleusShape::Point => "sph",
            NucleusShape::Cylinder => "cyl",
            NucleusShape::Slab => "sl",
        }
    }
}

/// Builds a single-species profile with spatial average exactly `density` and
/// a centered nucleus block of the given per-axis `extent`.
///
/// The block is set to `density ± 0.05` (toward the interval midpoint 0.5).
/// For tilted boundary conditions every lattice layer along the tilt axis is
/// cyclically rotated by `layer_count - layer_index` along the companion
/// axis, so the nucleus is compatible with the staircase periodicity. The
/// whole profile is rescaled by `density / mean` at the end, which makes the
/// realized average exact.
pub fn nucleus_profile(
    shape: &[usize],
    boundary: BoundaryCondition,
    density: f64,
    extent: &[usize],
) -> ArrayD<f64> {
    let mut profile = ArrayD::from_elem(IxDyn(shape), density);
    let block_density = if density < 0.5 {
        density + 0.05
    } else {
        density - 0.05
    };

    profile
        .slice_each_axis_mut(|ad| {
            let n = shape[ad.axis.index()];
            let e = extent[ad.axis.index()].min(n);
            Slice::from(((n - e) / 2) as isize..((n + e) / 2) as isize)
        })
        .fill(block_density);

    apply_shear(&mut profile, boundary);

    let mean = profile.sum() / profile.len() as f64;
    profile *= density / mean;
    profile
}

/// Layer-by-layer rotation that aligns the nucleus with the tilted
/// identification of opposite faces.
fn apply_shear(profile: &mut ArrayD<f64>, boundary: BoundaryCondition) {
    match boundary {
        BoundaryCondition::Periodic => {}
        BoundaryCondition::Tilted11 => {
            let layers = profile.shape()[0];
            for i in 0..layers {
                let sheared = boundary::roll(
                    profile.index_axis(Axis(0), i),
                    (layers - i) as isize,
                    Axis(0),
                );
                profile.index_axis_mut(Axis(0), i).assign(&sheared);
            }
        }
        BoundaryCondition::Tilted110 | BoundaryCondition::Tilted111 => {
            let layers = profile.shape()[0];
            for i in 0..layers {
                // Slice axes are (0, 2) of the profile; its axis 1 is the
                // companion axis of the shear.
                let sheared = boundary::roll(
                    profile.index_axis(Axis(1), i),
                    (layers - i) as isize,
                    Axis(1),
                );
                profile.index_axis_mut(Axis(1), i).assign(&sheared);
            }
            if boundary == BoundaryCondition::Tilted111 {
                for i in 0..layers {
                    let sheared = boundary::roll(
                        profile.index_axis(Axis(0), i),
                        (layers - i) as isize,
                        Axis(1),
                    );
                    profile.index_axis_mut(Axis(0), i).assign(&sheared);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn named_shapes_map_to_the_documented_extents() {
        let shape = [64, 64, 64];
        assert_eq!(NucleusShape::Homogeneous.extents(&shape), vec![0, 0, 0]);
        assert_eq!(NucleusShape::Point.extents(&shape), vec![3, 3, 3]);
        assert_eq!(NucleusShape::Cylinder.extents(&shape), vec![64, 3, 3]);
        assert_eq!(NucleusShape::Slab.extents(&shape), vec![64, 64, 3]);
    }

    #[test]
    fn small_lattices_clamp_the_block_side_to_one() {
        assert_eq!(NucleusShape::Point.extents(&[8, 8]), vec![1, 1]);
    }

    #[test]
    fn zero_extent_produces_a_homogeneous_profile() {
        let profile = nucleus_profile(&[6, 6], BoundaryCondition::Periodic, 0.3, &[0, 0]);
        for &v in profile.iter() {
            assert_relative_eq!(v, 0.3, max_relative = 1e-12);
        }
    }

    #[test]
    fn realized_average_equals_the_requested_density_exactly() {
        for density in [0.1, 0.45, 0.5, 0.8] {
            let profile = nucleus_profile(&[10, 10], BoundaryCondition::Periodic, density, &[4, 4]);
            let mean = profile.sum() / profile.len() as f64;
            assert_relative_eq!(mean, density, max_relative = 1e-12);
        }
    }

    #[test]
    fn nucleus_block_is_denser_toward_the_midpoint() {
        let low = nucleus_profile(&[10, 10], BoundaryCondition::Periodic, 0.2, &[4, 4]);
        let max = low.iter().cloned().fold(f64::MIN, f64::max);
        let min = low.iter().cloned().fold(f64::MAX, f64::min);
        assert!(max > min, "nucleus must stand out from the background");
        // Background below the block value for a sub-midpoint density.
        assert!(max / min < 1.5);

        let high = nucleus_profile(&[10, 10], BoundaryCondition::Periodic, 0.8, &[4, 4]);
        let max = high.iter().cloned().fold(f64::MIN, f64::max);
        let min = high.iter().cloned().fold(f64::MAX, f64::min);
        assert!(min < max, "depressed nucleus for a dense background");
    }

    #[test]
    fn sheared_profile_keeps_the_exact_average() {
        let profile = nucleus_profile(&[4, 8], BoundaryCondition::Tilted11, 0.35, &[2, 2]);
        let mean = profile.sum() / profile.len() as f64;
        assert_relative_eq!(mean, 0.35, max_relative = 1e-12);
    }
}
