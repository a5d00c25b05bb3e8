use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod password;
pub mod policy;
pub mod repository;
pub mod response;
pub mod services;
pub mod shutdown;

// Routing, split by access level (public / authenticated).
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use auth::TokenManager;
pub use config::AppConfig;
pub use error::AppError;
pub use password::PasswordHasher;
pub use repository::{InMemoryRepository, PostgresRepository, Repositories};
pub use services::{CategoryService, PostService, UserService};

/// Registers the bearer-token scheme referenced by the protected operations.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// ApiDoc
///
/// OpenAPI document for every handler and request/response model, served at
/// `/api-docs/openapi.json` and browsable through Swagger UI.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        handlers::health, handlers::register_user, handlers::login, handlers::get_user,
        handlers::update_user, handlers::delete_user, handlers::create_post,
        handlers::get_post, handlers::update_post, handlers::delete_post,
        handlers::list_posts, handlers::create_category, handlers::list_categories
    ),
    components(
        schemas(
            models::Role, models::User, models::Post, models::Category,
            models::RegisterUserRequest, models::LoginRequest, models::LoginResponse,
            models::UpdateUserRequest, models::CreatePostRequest, models::UpdatePostRequest,
            models::CategoryRequest,
        )
    ),
    tags(
        (name = "blog-backend", description = "Blog platform API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, cloneable container of everything a request may need. Services
/// hold `Arc` handles to their repositories, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub posts: PostService,
    pub categories: CategoryService,
    /// Shared with the `AuthUser` extractor through `FromRef`.
    pub tokens: TokenManager,
}

impl AppState {
    /// Wires the services over the given repositories using the token and
    /// hashing parameters from `config`.
    pub fn new(repos: Repositories, config: AppConfig) -> Self {
        let ttl_hours = config
            .token_ttl_hours
            .clamp(1, crate::config::MAX_TOKEN_TTL_HOURS);
        let tokens = TokenManager::new(&config.jwt_secret, chrono::Duration::hours(ttl_hours));
        let passwords = PasswordHasher::new(config.bcrypt_cost);

        Self {
            users: UserService::new(
                repos.users,
                passwords,
                tokens.clone(),
                config.allow_admin_signup,
            ),
            posts: PostService::new(repos.posts, repos.categories.clone()),
            categories: CategoryService::new(repos.categories),
            tokens,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for TokenManager {
    fn from_ref(app_state: &AppState) -> TokenManager {
        app_state.tokens.clone()
    }
}

/// auth_middleware
///
/// Guards the authenticated router. Extracting `AuthUser` validates the bearer
/// token; on failure the extractor's 401 envelope is returned and the handler
/// never runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles public and authenticated routes, the Swagger UI, and the request-id,
/// tracing and CORS layers around them.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // Same paths as some public routes (e.g. /users/{id}); the method routers
        // are merged and only the authenticated methods carry the layer.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: every log line of a request carries its method,
/// URI and `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
