use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::lattice::LatticeSystem;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("(de)serialization failed: {source}")]
    Format {
        #[from]
        source: serde_json::Error,
    },
}

/// Where samples live on disk. Passed explicitly to [`SampleStore::new`];
/// there is no process-wide default.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub root: PathBuf,
}

/// Identifies one persisted sample inside a store.
///
/// Maps to the directory layout `<model>/size=<s>/epsi=<e>/dens=<d>(<tag>)`,
/// with decimal points written as commas in the file-system components.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleKey {
    pub model: String,
    pub shape: Vec<usize>,
    pub epsilon: f64,
    pub density: f64,
    pub tag: Option<String>,
}

impl SampleKey {
    pub fn new(model: &str, shape: &[usize], epsilon: f64, density: f64) -> Self {
        Self {
            model: model.to_string(),
            shape: shape.to_vec(),
            epsilon,
            density,
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    fn size_component(&self) -> String {
        let all_equal = self.shape.iter().all(|&n| n == self.shape[0]);
        if all_equal {
            format!("size={}", self.shape[0])
        } else {
            let joined: Vec<String> = self.shape.iter().map(|n| n.to_string()).collect();
            format!("size={}", joined.join("x"))
        }
    }

    fn directory(&self) -> PathBuf {
        let epsi = format!("epsi={}", decimal_comma(self.epsilon, 3));
        PathBuf::from(&self.model)
            .join(self.size_component())
            .join(epsi)
    }

    fn file_name(&self) -> String {
        let tag = self
            .tag
            .as_deref()
            .map(|t| format!("({t})"))
            .unwrap_or_default();
        format!("dens={}{tag}.json", decimal_comma(self.density, 4))
    }
}

fn decimal_comma(value: f64, digits: u32) -> String {
    let scale = 10f64.powi(digits as i32);
    let rounded = (value * scale).round() / scale;
    format!("{rounded}").replace('.', ",")
}

/// Filesystem-backed collection of persisted lattice systems.
pub struct SampleStore {
    root: PathBuf,
}

impl SampleStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { root: config.root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location a sample with this key is stored at.
    pub fn path_for(&self, key: &SampleKey) -> PathBuf {
        self.root.join(key.directory()).join(key.file_name())
    }

    /// Persists the complete system state (fields, ensembles, history, error
    /// history) and returns the written path.
    pub fn save(&self, system: &LatticeSystem, key: &SampleKey) -> Result<PathBuf, StoreError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let file = File::create(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::to_writer(BufWriter::new(file), system)?;
        Ok(path)
    }

    pub fn load(&self, key: &SampleKey) -> Result<LatticeSystem, StoreError> {
        Self::load_from(&self.path_for(key))
    }

    /// Loads a system from an explicit path, regardless of store layout.
    pub fn load_from(path: &Path) -> Result<LatticeSystem, StoreError> {
        let file = File::open(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}
