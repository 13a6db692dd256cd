use std::fmt;
use std::str::FromStr;

use super::config::ConfigError;

/// Schedule deciding at which iteration indices a field snapshot is committed
/// to the history.
///
/// Parsed from a string descriptor: a bare integer for [`Self::Every`],
/// `exp#` for [`Self::Exponential`] and `dec#` for [`Self::Decade`], where
/// `#` is the policy parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckpointPolicy {
    /// Equidistant sampling: next = last + k.
    Every(u64),
    /// Multiplicatively growing intervals: next = floor(last ^ p), bumped by
    /// one whenever that would not increase.
    Exponential(f64),
    /// Dense at low iteration counts, sparse later:
    /// next = last + d * 10^floor(log10 last), with exponent 1 at last = 0.
    Decade(u64),
}

impl CheckpointPolicy {
    /// The first checkpoint strictly after the last recorded one.
    pub fn next_after(&self, last: u64) -> u64 {
        match *self {
            CheckpointPolicy::Every(k) => last + k,
            CheckpointPolicy::Exponential(p) => {
                let next = (last as f64).powf(p).floor() as u64;
                if next <= last { last + 1 } else { next }
            }
            CheckpointPolicy::Decade(d) => {
                let exponent = if last == 0 {
                    1
                } else {
                    (last as f64).log10().floor() as u32
                };
                last + d * 10u64.pow(exponent)
            }
        }
    }
}

impl FromStr for CheckpointPolicy {
    type Err = ConfigError;

    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        let unknown = || ConfigError::UnknownCheckpointPolicy(descriptor.to_string());
        let trimmed = descriptor.trim();
        if let Some(parameter) = trimmed.strip_prefix("exp") {
            let p: f64 = parameter.parse().map_err(|_| unknown())?;
            if !p.is_finite() || p <= 0.0 {
                return Err(unknown());
            }
            return Ok(CheckpointPolicy::Exponential(p));
        }
        if let Some(parameter) = trimmed.strip_prefix("dec") {
            let d: u64 = parameter.parse().map_err(|_| unknown())?;
            if d == 0 {
                return Err(unknown());
            }
            return Ok(CheckpointPolicy::Decade(d));
        }
        let k: u64 = trimmed.parse().map_err(|_| unknown())?;
        if k == 0 {
            return Err(unknown());
        }
        Ok(CheckpointPolicy::Every(k))
    }
}

impl fmt::Display for CheckpointPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointPolicy::Every(k) => write!(f, "{k}"),
            CheckpointPolicy::Exponential(p) => write!(f, "exp{p}"),
            CheckpointPolicy::Decade(d) => write!(f, "dec{d}"),
        }
    }
}
