use diesel_async::pooled_connection::deadpool::BuildError;
use tokio::task::JoinError;

/// Errors raised while building a connection pool.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Loading the native root certificates panicked or was cancelled.
    #[error("join error: {0}")]
    Join(#[from] JoinError),

    /// The pool configuration was rejected.
    #[error("build error: {0}")]
    Build(#[from] BuildError),
}
