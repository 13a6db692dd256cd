//! Persistence of lattice systems.
//!
//! The on-disk format is an implementation detail of this module; the
//! contract is that a loaded system reproduces the exact fields, history and
//! per-species fixation flags it was saved with.

pub mod store;

pub use store::{SampleKey, SampleStore, StoreConfig, StoreError};
