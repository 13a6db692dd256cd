/// Events emitted by the engine and the workflows while they run. Consumers
/// (e.g. a CLI progress bar) subscribe through a [`ProgressReporter`].
#[derive(Debug, Clone)]
pub enum Progress {
    /// An engine run started with the given step budget.
    RunStart { steps: u64 },
    /// A field snapshot was committed; `error` is the species-0 error.
    Checkpoint { iteration: u64, error: f64 },
    /// Every species error fell below the configured minimum.
    EarlyStop { iteration: u64 },
    /// The engine run finished (converged or exhausted).
    RunFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
