use tokio::task::JoinError;

pub type Result<T, E = PropertySyncWorkerError> = core::result::Result<T, E>;

/// Errors raised while stopping the property sync worker.
#[derive(Debug, thiserror::Error)]
pub enum PropertySyncWorkerError {
    /// The worker stopped before the shutdown message could be queued.
    #[error("property sync worker is gone")]
    Sender,

    /// The worker task panicked or was cancelled.
    #[error("property sync worker failed: {0}")]
    Join(#[from] JoinError),
}
