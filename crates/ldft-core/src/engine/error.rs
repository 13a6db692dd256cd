use thiserror::Error;

use super::config::ConfigError;
use crate::core::functional::FunctionalError;
use crate::core::io::store::StoreError;
use crate::core::lattice::LatticeError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// An update step produced a non-finite value. Fatal to the current run:
    /// the system state at the moment of detection is the last valid one, and
    /// nothing computed afterwards may be kept or persisted.
    #[error(
        "iteration diverged: species {species} produced a non-finite update at iteration {iteration}"
    )]
    Divergence { species: usize, iteration: u64 },

    #[error("invalid iteration parameters: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("invalid lattice specification: {source}")]
    Lattice {
        #[from]
        source: LatticeError,
    },

    #[error("functional evaluation failed: {source}")]
    Functional {
        #[from]
        source: FunctionalError,
    },

    #[error("persistence failed: {source}")]
    Store {
        #[from]
        source: StoreError,
    },
}
