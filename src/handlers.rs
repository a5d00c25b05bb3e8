use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::AuthUser,
    error::AppError,
    extract::{ApiJson, ApiPath, ApiQuery},
    models::{
        Category, CategoryRequest, CreatePostRequest, LoginRequest, LoginResponse, Post,
        RegisterUserRequest, UpdatePostRequest, UpdateUserRequest, User,
    },
    pagination::{ListPostsQuery, PostListing},
    response::ApiResponse,
};

type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), AppError>;

fn ok<T>(message: &str, data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(message, data))))
}

fn created<T>(message: &str, data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(message, data))))
}

/// health
///
/// Liveness check for load balancers. Touches no storage.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> Json<ApiResponse<()>> {
    Json(ApiResponse::message("ok"))
}

// --- Users ---

/// register_user
///
/// [Public Route] Creates an account. The response never carries the password hash.
#[utoipa::path(
    post,
    path = "/users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User registered", body = ApiResponse<User>),
        (status = 400, description = "Missing fields or invalid email"),
        (status = 403, description = "Admin role requested while admin signup is disabled"),
        (status = 409, description = "Email already taken")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterUserRequest>,
) -> ApiResult<User> {
    let user = state.users.register(payload).await?;
    created("User registered successfully", user)
}

/// login
///
/// [Public Route] Exchanges credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let session = state.users.login(payload).await?;
    ok("Login successful", session)
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = ApiResponse<User>),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<User> {
    let user = state.users.get(id).await?;
    ok("User fetched successfully", user)
}

/// update_user
///
/// [Authenticated Route] Partial update of an account by its owner or an admin.
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<User>),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Email already taken")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    actor: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> ApiResult<User> {
    let user = state.users.update(&actor, id, payload).await?;
    ok("User updated successfully", user)
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    actor: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.users.delete(&actor, id).await?;
    Ok(Json(ApiResponse::message("User deleted successfully")))
}

// --- Blog posts ---

/// create_post
///
/// [Authenticated Route] The new post is owned by the caller.
#[utoipa::path(
    post,
    path = "/api/blog-post",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = ApiResponse<Post>),
        (status = 400, description = "Missing fields or unknown category"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_post(
    actor: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreatePostRequest>,
) -> ApiResult<Post> {
    let post = state.posts.create(&actor, payload).await?;
    created("Post created successfully", post)
}

#[utoipa::path(
    get,
    path = "/api/blog-post/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post", body = ApiResponse<Post>),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Post> {
    let post = state.posts.get(id).await?;
    ok("Post fetched successfully", post)
}

/// update_post
///
/// [Authenticated Route] Owner or admin. The post's owner never changes.
#[utoipa::path(
    patch,
    path = "/api/blog-post/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = ApiResponse<Post>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_post(
    actor: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdatePostRequest>,
) -> ApiResult<Post> {
    let post = state.posts.update(&actor, id, payload).await?;
    ok("Post updated successfully", post)
}

#[utoipa::path(
    delete,
    path = "/api/blog-post/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_post(
    actor: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.posts.delete(&actor, id).await?;
    Ok(Json(ApiResponse::message("Post deleted successfully")))
}

/// list_posts
///
/// [Public Route] Every post newest first, or one page of them when both `page`
/// and `limit` are supplied.
#[utoipa::path(
    get,
    path = "/api/blog-posts",
    params(ListPostsQuery),
    responses(
        (status = 200, description = "Posts", body = ApiResponse<Vec<Post>>),
        (status = 400, description = "Invalid pagination params")
    )
)]
pub async fn list_posts(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListPostsQuery>,
) -> ApiResult<Vec<Post>> {
    let listing = query.resolve()?;
    let posts = state.posts.list(&listing).await?;

    let message = match listing {
        PostListing::All => "All posts fetched",
        PostListing::Page(_) => "Paginated posts fetched",
    };
    ok(message, posts)
}

// --- Categories ---

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<Category>),
        (status = 400, description = "Empty name")
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CategoryRequest>,
) -> ApiResult<Category> {
    let category = state.categories.create(payload).await?;
    created("Category created successfully", category)
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "Categories", body = ApiResponse<Vec<Category>>))
)]
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    let categories = state.categories.list().await?;
    ok("Categories fetched successfully", categories)
}
