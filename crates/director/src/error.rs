use aurora_core::PhaseId;
use progress::ProgressError;
use thiserror::Error;

use crate::resources::LedgerReleased;

#[derive(Debug, Error)]
pub enum DirectorError {
    #[error("Invalid lifecycle transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Phase {0} is not implemented")]
    PhaseNotImplemented(PhaseId),

    #[error("Director is no longer running")]
    Closed,

    #[error("Progress error: {0}")]
    Progress(#[from] ProgressError),
}

pub type Result<T> = std::result::Result<T, DirectorError>;

/// Error returned by phase scripts and the beats they await.
#[derive(Debug, Error)]
pub enum PhaseError {
    /// The phase was torn down while the beat was suspended.
    #[error("Phase was torn down")]
    Cancelled,

    #[error("Progress error: {0}")]
    Progress(#[from] ProgressError),

    #[error("Script error: {0}")]
    Script(String),
}

impl PhaseError {
    pub fn script(reason: impl Into<String>) -> Self {
        Self::Script(reason.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<LedgerReleased> for PhaseError {
    fn from(_: LedgerReleased) -> Self {
        Self::Cancelled
    }
}

pub type PhaseResult<T> = std::result::Result<T, PhaseError>;
