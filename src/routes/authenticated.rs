use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{patch, post, put},
};

/// Authenticated Router Module
///
/// Every route here sits behind the `auth_middleware` layer, and each handler also
/// takes `AuthUser` so the caller's identity reaches the owner-or-admin check.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // PUT/DELETE /users/{id}
        // Owner or admin. Only an admin may change a role.
        .route(
            "/users/{id}",
            put(handlers::update_user).delete(handlers::delete_user),
        )
        // POST /api/blog-post
        // The owner is taken from the token, never from the body.
        .route("/api/blog-post", post(handlers::create_post))
        .route(
            "/api/blog-post/{id}",
            patch(handlers::update_post).delete(handlers::delete_post),
        )
}
