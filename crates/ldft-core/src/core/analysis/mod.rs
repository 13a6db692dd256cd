//! Analysis of converged density profiles.

pub mod surface;

pub use surface::{AnalysisError, InterfaceShape};
