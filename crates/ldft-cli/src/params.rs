use std::path::Path;

use serde::Deserialize;

use crate::cli::IterArgs;
use crate::error::{CliError, Result};
use ldft::engine::{CheckpointPolicy, ConfigError, IterationConfig};

/// Iteration defaults loaded from a TOML file; explicit command-line flags
/// always win over file values.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterFile {
    pub alpha: Option<f64>,
    pub steps: Option<u64>,
    pub checkpoints: Option<String>,
    pub min_error: Option<f64>,
    pub accuracy: Option<f64>,
}

impl ParameterFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| CliError::Params {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Merges flags over file defaults into a validated engine configuration.
pub fn resolve_iteration(args: &IterArgs, file: &ParameterFile) -> Result<IterationConfig> {
    let alpha = args
        .alpha
        .or(file.alpha)
        .ok_or(ConfigError::MissingParameter("alpha"))?;
    let steps = args
        .steps
        .or(file.steps)
        .ok_or(ConfigError::MissingParameter("steps"))?;
    let descriptor = args
        .checkpoints
        .clone()
        .or_else(|| file.checkpoints.clone())
        .unwrap_or_else(|| "dec2".to_string());
    let checkpoints: CheckpointPolicy = descriptor.parse().map_err(CliError::Config)?;

    let mut config = IterationConfig::new(alpha, steps, checkpoints)?;
    if let Some(min_error) = args.min_error.or(file.min_error) {
        config = config.with_min_error(min_error);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(alpha: Option<f64>, steps: Option<u64>) -> IterArgs {
        IterArgs {
            alpha,
            steps,
            checkpoints: None,
            min_error: None,
        }
    }

    #[test]
    fn flags_take_precedence_over_file_defaults() {
        let file = ParameterFile {
            alpha: Some(0.1),
            steps: Some(1000),
            ..ParameterFile::default()
        };
        let config = resolve_iteration(&args(Some(0.5), None), &file).unwrap();
        assert_eq!(config.alpha, 0.5);
        assert_eq!(config.steps, 1000);
    }

    #[test]
    fn missing_alpha_is_reported() {
        let err = resolve_iteration(&args(None, Some(10)), &ParameterFile::default()).unwrap_err();
        assert!(matches!(
            err,
            CliError::Config(ConfigError::MissingParameter("alpha"))
        ));
    }

    #[test]
    fn parameter_files_parse_and_reject_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "alpha = 0.2\nsteps = 5000\ncheckpoints = \"dec2\"").unwrap();
        let params = ParameterFile::load(file.path()).unwrap();
        assert_eq!(params.alpha, Some(0.2));

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "mixing = 0.2").unwrap();
        assert!(matches!(
            ParameterFile::load(bad.path()),
            Err(CliError::Params { .. })
        ));
    }
}
