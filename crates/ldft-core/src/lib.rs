//! # Lattice-DFT Core Library
//!
//! A library for computing equilibrium density profiles of lattice-gas models
//! within lattice density functional theory (LDFT), and for locating
//! first-order phase transitions by free-energy comparison of competing
//! phases.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains the lattice data model
//!   (`LatticeSystem`), the boundary-aware shift operator used to realize
//!   tilted interface geometries, the model functionals (`MeanFieldLatticeGas`,
//!   `AoHighlander2d`), bulk thermodynamics, and persistence.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer drives the Picard
//!   (self-consistent field) iteration: mixing, divergence detection,
//!   checkpoint scheduling, and progress reporting. It depends on the model
//!   physics only through the [`core::functional::DensityFunctional`]
//!   capability interface.
//!
//! - **[`workflows`]: The Public API.** This is the highest-level, user-facing
//!   layer. It ties the `engine` and `core` together to execute complete
//!   procedures: relaxing a single system to equilibrium, sweeping a density
//!   series, and bisecting a density interval to localize a phase transition.

pub mod core;
pub mod engine;
pub mod workflows;
