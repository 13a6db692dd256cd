//! # Workflows Module
//!
//! Complete, user-facing procedures built from the engine and the core data
//! model:
//!
//! - **Relax** ([`relax`]) - build one system from a seed, iterate it to
//!   equilibrium and persist the result; also continues persisted runs
//! - **Series** ([`series`]) - relax a sweep of average densities, optionally
//!   warm-starting each system from the previous one
//! - **Coexistence search** ([`coexistence`]) - localize a first-order phase
//!   transition by bisection on density, comparing the semi-grand potentials
//!   of two competing phases per probe

pub mod coexistence;
pub mod relax;
pub mod series;

pub use coexistence::{SearchConfig, SearchConfigBuilder, SearchOutcome};
pub use relax::RelaxOutcome;
pub use series::SeriesConfig;
