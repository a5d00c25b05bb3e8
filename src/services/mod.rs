//! Entity services: business validation and authorization layered over the
//! persistence traits. Services hold no state of their own beyond shared handles.

mod category;
mod post;
mod user;

pub use category::CategoryService;
pub use post::PostService;
pub use user::{UserService, is_valid_email};

use crate::error::AppError;

/// Runs CPU-heavy work (password hashing) off the async worker threads.
pub(crate) async fn blocking<F, T>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {e}")))
}
