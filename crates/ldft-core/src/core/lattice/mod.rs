//! Lattice data model: occupation fields, boundary conditions and seeding.
//!
//! A [`LatticeSystem`] bundles one multi-dimensional occupation field per
//! species with the scalar state that fixes its ensemble (chemical potential
//! or average density), the boundary condition shared by every field of the
//! instance, and the checkpoint history accumulated during iteration.
//!
//! All neighbour access goes through [`boundary::shift`], which realizes
//! either plain periodic wrapping or the tilted ("staircase") identification
//! of opposite faces used to study diagonally oriented interfaces.

pub mod boundary;
pub mod field;
pub mod history;
pub mod nucleus;
pub mod species;

pub use boundary::BoundaryCondition;
pub use field::{LatticeError, LatticeSystem};
pub use history::{History, Snapshot};
pub use nucleus::NucleusShape;
pub use species::{Ensemble, SpeciesConfig, SpeciesState};
