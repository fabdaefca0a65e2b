//! Deadline and cancellation guard for single storage calls.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::storage::StorageError;

/// Why one storage attempt did not complete.
#[derive(Debug, Error)]
pub(crate) enum AttemptError {
    /// The store answered with an error.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The call did not answer within its deadline.
    #[error("storage call timed out after {0:?}")]
    TimedOut(Duration),

    /// The service is shutting down.
    #[error("storage call cancelled")]
    Cancelled,
}

impl AttemptError {
    /// Returns true if another attempt may succeed.
    pub(crate) const fn is_retryable(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            Self::TimedOut(_) => true,
            Self::Cancelled => false,
        }
    }
}

/// Runs one storage call, aborting it on cancellation or after `timeout`.
///
/// Cancellation wins over a result that is ready at the same time.
pub(crate) async fn guarded<T, F>(
    cancel: &CancellationToken,
    timeout: Option<Duration>,
    call: F,
) -> Result<T, AttemptError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    let bounded = async {
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result.map_err(AttemptError::from),
                Err(_) => Err(AttemptError::TimedOut(limit)),
            },
            None => call.await.map_err(AttemptError::from),
        }
    };

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(AttemptError::Cancelled),
        result = bounded => result,
    }
}
