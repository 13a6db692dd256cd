use thiserror::Error;

use super::checkpoint::CheckpointPolicy;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("mixing parameter alpha must lie in the open interval (0, 1), got {0}")]
    AlphaOutOfRange(f64),

    #[error("unknown checkpoint descriptor '{0}'")]
    UnknownCheckpointPolicy(String),

    #[error("accuracy must be positive, got {0}")]
    NonPositiveAccuracy(f64),

    #[error("step width {0} does not walk the density range toward its end")]
    InvalidStepWidth(f64),

    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// Parameters of one engine run.
///
/// `alpha` damps the fixed-point update (larger converges faster but risks
/// divergence); `steps` bounds the run; `min_error` optionally stops early
/// once every species error falls below it.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationConfig {
    pub alpha: f64,
    pub steps: u64,
    pub checkpoints: CheckpointPolicy,
    pub min_error: Option<f64>,
}

impl IterationConfig {
    pub fn new(
        alpha: f64,
        steps: u64,
        checkpoints: CheckpointPolicy,
    ) -> Result<Self, ConfigError> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(ConfigError::AlphaOutOfRange(alpha));
        }
        Ok(Self {
            alpha,
            steps,
            checkpoints,
            min_error: None,
        })
    }

    pub fn with_min_error(mut self, min_error: f64) -> Self {
        self.min_error = Some(min_error);
        self
    }
}
