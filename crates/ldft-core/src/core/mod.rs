//! # Core Module
//!
//! Foundational data structures and mathematics for lattice density
//! functional theory.
//!
//! The submodules are intentionally stateless with respect to iteration: they
//! describe *what* a lattice system is and *which* functional governs it,
//! while the [`crate::engine`] module owns every mutation performed during
//! iteration.
//!
//! - **Lattice model** ([`lattice`]) - per-species occupation fields, boundary
//!   conditions, nucleus seeding, and the checkpoint history store
//! - **Functionals** ([`functional`]) - the capability interface every
//!   lattice-gas variant implements, together with the concrete variants and
//!   bulk thermodynamics
//! - **Analysis** ([`analysis`]) - surface and interface properties of
//!   converged profiles
//! - **I/O** ([`io`]) - the persistence collaborator for saving and loading
//!   systems
//! - **Utilities** ([`utils`]) - shared numerical helpers

pub mod analysis;
pub mod functional;
pub mod io;
pub mod lattice;
pub mod utils;
