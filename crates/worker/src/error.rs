use notigate_core::CoreError;

/// Worker-level error type.
///
/// Wraps [`CoreError`] for configuration and parsing failures and adds the
/// runtime failures of the intake pipeline.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<serde_json::Error> for WorkerError {
    fn from(err: serde_json::Error) -> Self {
        WorkerError::Core(CoreError::Json(err))
    }
}

pub type WorkerResult<T> = Result<T, WorkerError>;
