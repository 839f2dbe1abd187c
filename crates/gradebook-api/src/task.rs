use tracing::error;

use gradebook_db::Database;

use crate::auth::AppState;
use crate::error::ApiError;

/// Run a blocking store call off the async runtime.
pub async fn blocking<T, E, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal("Internal server error", e)
        })?
        .map_err(Into::into)
}
