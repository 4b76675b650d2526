pub mod fallback;
pub mod file;
pub mod health;

use std::future::Future;

use tokio_util::task::TaskTracker;

use crate::error::AppError;

/// Run a side-effect sequence on its own task.
///
/// A client disconnect drops the handler future; the spawned task keeps going
/// so gateway calls already in flight finish and the two stores are never left
/// halfway through a step. A panic in `fut` becomes `AppError::Internal`.
///
/// The task is registered with `tasks`, so shutdown can wait for it.
pub(crate) async fn run_to_completion<F, T>(
    tasks: &TaskTracker,
    operation: &'static str,
    fut: F,
) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>> + Send + 'static,
    T: Send + 'static,
{
    tasks
        .spawn(fut)
        .await
        .map_err(|e| AppError::Internal(format!("{operation} task aborted: {e}")))?
}
