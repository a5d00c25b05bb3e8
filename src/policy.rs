//! Owner-or-admin authorization.
//!
//! Every update or delete of a post, and every update or delete of a user
//! account, runs through [`ensure_can_mutate`] after the target has been loaded
//! and before any submitted change is applied.

use crate::{auth::AuthUser, error::AppError};

/// True iff the actor is an admin or owns the resource.
pub fn can_mutate(actor: &AuthUser, owner_id: i64) -> bool {
    actor.role.is_admin() || actor.id == owner_id
}

/// Fails with `AppError::Authorization` when `actor` may not mutate a resource
/// owned by `owner_id`. `action` completes the sentence "You are not allowed to …".
pub fn ensure_can_mutate(actor: &AuthUser, owner_id: i64, action: &str) -> Result<(), AppError> {
    if can_mutate(actor, owner_id) {
        return Ok(());
    }

    tracing::warn!(
        actor_id = actor.id,
        actor_role = %actor.role,
        owner_id,
        action,
        "mutation denied"
    );
    Err(AppError::Authorization(format!(
        "You are not allowed to {action}"
    )))
}
