use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token. Category creation is open as well,
/// matching the documented API surface.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check; never touches the database.
        .route("/health", get(handlers::health))
        // POST /users
        .route("/users", post(handlers::register_user))
        // POST /login
        // Returns a signed bearer token on valid credentials.
        .route("/login", post(handlers::login))
        .route("/users/{id}", get(handlers::get_user))
        .route("/api/blog-post/{id}", get(handlers::get_post))
        // GET /api/blog-posts?page=&limit=&sort=&order=&search=
        // Paginates only when both page and limit are given.
        .route("/api/blog-posts", get(handlers::list_posts))
        .route(
            "/api/categories",
            post(handlers::create_category).get(handlers::list_categories),
        )
}
