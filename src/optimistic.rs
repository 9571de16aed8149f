//! Optimistic-update helper for page-level callers.
//!
//! Pages that mutate UI state before the backend confirms used to hand-roll
//! the revert; this wraps the pattern once. The facade itself never rolls
//! back (its local write-through only happens after the remote succeeds);
//! this helper is for caller-owned state that is updated eagerly.

use std::future::Future;

/// Apply a local change, attempt the remote commit, and revert the local
/// change if the commit fails. The commit's error is returned unchanged.
pub async fn with_optimistic_update<T, E, Fut>(
    apply_locally: impl FnOnce(),
    commit_remotely: Fut,
    revert_locally: impl FnOnce(),
) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
{
    apply_locally();
    match commit_remotely.await {
        Ok(value) => Ok(value),
        Err(err) => {
            revert_locally();
            Err(err)
        }
    }
}
