use std::path::PathBuf;
use thiserror::Error;

use ldft::core::io::StoreError;
use ldft::core::lattice::LatticeError;
use ldft::engine::{ConfigError, EngineError};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lattice(#[from] LatticeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid parameter file {path}: {message}")]
    Params { path: PathBuf, message: String },

    #[error("unknown seed '{0}': expected hom, sph, cyl, sl or the path of a saved sample")]
    UnknownSeed(String),
}
