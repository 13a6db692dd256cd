use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

/// One committed state of the iteration: the iteration index, a copy of every
/// species field, and the per-species error at that step. The seed entry at
/// iteration 0 carries no error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub iteration: u64,
    pub fields: Vec<ArrayD<f64>>,
    pub errors: Option<Vec<f64>>,
}

/// Append-only log of [`Snapshot`]s taken at checkpoint iterations.
///
/// Entries are immutable once appended and their iteration indices are
/// strictly increasing; the only permitted reset is the truncation to a single
/// seed entry when the owning system is reseeded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    entries: Vec<Snapshot>,
}

impl History {
    /// History of a freshly seeded system: a single entry at iteration 0.
    pub(crate) fn seeded(fields: Vec<ArrayD<f64>>) -> Self {
        Self {
            entries: vec![Snapshot {
                iteration: 0,
                fields,
                errors: None,
            }],
        }
    }

    pub(crate) fn append(&mut self, snapshot: Snapshot) {
        debug_assert!(
            self.last_iteration().is_none_or(|it| snapshot.iteration > it),
            "history iteration indices must be strictly increasing"
        );
        self.entries.push(snapshot);
    }

    pub fn entries(&self) -> &[Snapshot] {
        &self.entries
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.entries.last()
    }

    /// Iteration index of the most recent entry.
    pub fn last_iteration(&self) -> Option<u64> {
        self.entries.last().map(|s| s.iteration)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
