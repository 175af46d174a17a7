use thiserror::Error;

use super::model::MenuSource;

/// Errors raised by the acquisition pipeline.
///
/// Adapter and corruption failures are stage-local: the orchestrator logs and
/// swallows them, falling through to the next stage. Only `AcquisitionFailed`
/// crosses the orchestrator boundary; `NoDataAvailable` is the terminal case
/// where not even a stale cache entry exists.
#[derive(Error, Debug)]
pub enum MenuError {
    #[error("{stage} adapter failed: {reason}")]
    Adapter { stage: MenuSource, reason: String },

    #[error("extracted content looks corrupted: {0}")]
    Corrupted(String),

    #[error("menu extraction failed: {0}")]
    AcquisitionFailed(String),

    #[error("no menu data available: {0}")]
    NoDataAvailable(String),
}

impl MenuError {
    pub fn adapter(stage: MenuSource, reason: impl Into<String>) -> Self {
        MenuError::Adapter {
            stage,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for MenuSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
