use ndarray::{ArrayD, ArrayViewD, Axis, Slice};
use serde::{Deserialize, Serialize};

/// Boundary identification applied to every field of a lattice system.
///
/// The tilted variants wrap periodically along the rolled axis but offset the
/// wrapped-around slice by half the extent of the longest axis, producing a
/// staircase identification of opposite faces. This corresponds to a 45°
/// tilted simulation cell and is used to stabilize slab interfaces with (11),
/// (110) or (111) orientation without rotating the underlying lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryCondition {
    /// Plain cyclic wrap on every axis.
    Periodic,
    /// 2-D cell tilted with respect to one axis, for (11) interfaces.
    Tilted11,
    /// 3-D cell tilted with respect to one axis, for (110) interfaces.
    Tilted110,
    /// 3-D cell tilted with respect to two axes, for (111) interfaces.
    Tilted111,
}

impl BoundaryCondition {
    /// Whether this boundary condition is defined for a lattice with the
    /// given number of axes.
    pub fn supports_axis_count(&self, axes: usize) -> bool {
        match self {
            BoundaryCondition::Periodic => axes == 2 || axes == 3,
            BoundaryCondition::Tilted11 => axes == 2,
            BoundaryCondition::Tilted110 | BoundaryCondition::Tilted111 => axes == 3,
        }
    }

    pub fn is_tilted(&self) -> bool {
        !matches!(self, BoundaryCondition::Periodic)
    }
}

/// Index of the axis with the largest extent (the untilted "long" axis).
/// Ties resolve to the lowest index.
pub(crate) fn longest_axis(shape: &[usize]) -> usize {
    let max = shape.iter().copied().max().unwrap_or(0);
    shape.iter().position(|&n| n == max).unwrap_or(0)
}

/// Cyclic roll of `field` by `steps` positions along `axis`.
///
/// `out[.., k, ..] = field[.., (k - steps) mod n, ..]`; negative `steps` roll
/// in the opposite direction. Pure: the input is never mutated.
pub fn roll(field: ArrayViewD<'_, f64>, steps: isize, axis: Axis) -> ArrayD<f64> {
    let n = field.len_of(axis) as isize;
    if n == 0 {
        return field.to_owned();
    }
    let k = steps.rem_euclid(n);
    if k == 0 {
        return field.to_owned();
    }
    let mut rolled = field.to_owned();
    rolled
        .slice_axis_mut(axis, Slice::from(k..))
        .assign(&field.slice_axis(axis, Slice::from(..n - k)));
    rolled
        .slice_axis_mut(axis, Slice::from(..k))
        .assign(&field.slice_axis(axis, Slice::from(n - k..)));
    rolled
}

/// Roll with a sheared wrap: the slice that wraps around (`[n-steps..n]` for
/// positive `steps`, `[0..-steps]` for negative) is first rolled by `offset`
/// along `offset_axis`, then the ordinary cyclic roll along `roll_axis` is
/// applied.
///
/// `offset_axis` must differ from `roll_axis`; callers degrade to [`roll`]
/// when the two coincide.
pub fn tilted_roll(
    field: ArrayViewD<'_, f64>,
    steps: isize,
    roll_axis: Axis,
    offset: isize,
    offset_axis: Axis,
) -> ArrayD<f64> {
    let n = field.len_of(roll_axis) as isize;
    let mut work = field.to_owned();
    if steps != 0 && n > 0 {
        let wrap = (steps.unsigned_abs() as isize).min(n);
        let range = if steps > 0 {
            Slice::from(n - wrap..n)
        } else {
            Slice::from(..wrap)
        };
        let sheared = roll(field.slice_axis(roll_axis, range), offset, offset_axis);
        work.slice_axis_mut(roll_axis, range).assign(&sheared);
    }
    roll(work.view(), steps, roll_axis)
}

/// Boundary-aware translation of a field by `steps` positions along `axis`.
///
/// For the tilted boundary conditions the offset axis is the axis of largest
/// extent and the lateral offset is half its extent, so the shear is
/// self-inverse: `shift(shift(f, s, a), -s, a) == f` whenever the lattice
/// satisfies the 2:1 shape precondition enforced at system construction.
pub fn shift(
    field: ArrayViewD<'_, f64>,
    steps: isize,
    axis: usize,
    boundary: BoundaryCondition,
) -> ArrayD<f64> {
    match boundary {
        BoundaryCondition::Periodic => roll(field, steps, Axis(axis)),
        BoundaryCondition::Tilted11 | BoundaryCondition::Tilted111 => {
            let offset_axis = longest_axis(field.shape());
            if offset_axis == axis {
                roll(field, steps, Axis(axis))
            } else {
                let offset = (field.shape()[offset_axis] / 2) as isize;
                tilted_roll(field, steps, Axis(axis), offset, Axis(offset_axis))
            }
        }
        BoundaryCondition::Tilted110 => {
            let offset_axis = longest_axis(field.shape());
            // Only one axis pair is tilted for (110) interfaces; the axis
            // following the long axis keeps its plain periodic wrap.
            if offset_axis == axis || (offset_axis + 1) % 3 == axis {
                roll(field, steps, Axis(axis))
            } else {
                let offset = (field.shape()[offset_axis] / 2) as isize;
                tilted_roll(field, steps, Axis(axis), offset, Axis(offset_axis))
            }
        }
    }
}
