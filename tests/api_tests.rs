use blog_backend::{AppConfig, AppState, Repositories, create_router};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

/// Serves the full router over the in-memory backing store on a random port.
async fn spawn_app() -> TestApp {
    let state = AppState::new(Repositories::in_memory(), AppConfig::default());
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn register(&self, username: &str, email: &str) -> Value {
        let response = self
            .client
            .post(self.url("/users"))
            .json(&json!({"username": username, "email": email, "password": "pw-123456"}))
            .send()
            .await
            .expect("req fail");
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().await.unwrap()
    }

    async fn login(&self, email: &str) -> String {
        let body: Value = self
            .client
            .post(self.url("/login"))
            .json(&json!({"email": email, "password": "pw-123456"}))
            .send()
            .await
            .expect("req fail")
            .json()
            .await
            .unwrap();
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn create_category(&self, name: &str) -> i64 {
        let body: Value = self
            .client
            .post(self.url("/api/categories"))
            .json(&json!({"name": name}))
            .send()
            .await
            .expect("req fail")
            .json()
            .await
            .unwrap();
        body["data"]["id"].as_i64().unwrap()
    }

    async fn create_post(&self, token: &str, title: &str, category_id: i64) -> reqwest::Response {
        self.client
            .post(self.url("/api/blog-post"))
            .bearer_auth(token)
            .json(&json!({
                "title": title,
                "description": format!("{title} description"),
                "category_id": category_id,
                "user_id": 999
            }))
            .send()
            .await
            .expect("req fail")
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(app.url("/health"))
        .send()
        .await
        .expect("req fail");

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], true);
}

#[tokio::test]
async fn test_registration_response_hides_password() {
    let app = spawn_app().await;
    let body = app.register("alice", "alice@example.com").await;

    assert_eq!(body["status"], true);
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["role"], "user");
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_protected_route_without_token_returns_envelope() {
    let app = spawn_app().await;
    let response = app
        .client
        .post(app.url("/api/blog-post"))
        .json(&json!({"title": "t", "description": "d", "category_id": 1}))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], false);
    assert_eq!(body["error"], "authentication_error");
    assert_eq!(body["message"], "Authorization header missing");
}

#[tokio::test]
async fn test_public_and_protected_methods_share_a_path() {
    let app = spawn_app().await;
    let registered = app.register("bob", "bob@example.com").await;
    let id = registered["data"]["id"].as_i64().unwrap();

    let response = app
        .client
        .get(app.url(&format!("/users/{id}")))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .client
        .put(app.url(&format!("/users/{id}")))
        .json(&json!({"username": "robert"}))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_numeric_id_is_a_validation_error() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(app.url("/api/blog-post/abc"))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid ID");
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_post_lifecycle() {
    let app = spawn_app().await;
    app.register("owner", "owner@example.com").await;
    app.register("other", "other@example.com").await;
    let owner = app.login("owner@example.com").await;
    let other = app.login("other@example.com").await;
    let category = app.create_category("General").await;

    // Create: owner comes from the token, not the body.
    let response = app.create_post(&owner, "First", category).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    let post_id = body["data"]["post_id"].as_i64().unwrap();
    let owner_id = body["data"]["user_id"].as_i64().unwrap();
    assert_ne!(owner_id, 999);

    // Another user may not edit it.
    let response = app
        .client
        .patch(app.url(&format!("/api/blog-post/{post_id}")))
        .bearer_auth(&other)
        .json(&json!({"title": "Hijacked"}))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "authorization_error");

    // The owner may, and ownership cannot be reassigned.
    let response = app
        .client
        .patch(app.url(&format!("/api/blog-post/{post_id}")))
        .bearer_auth(&owner)
        .json(&json!({"title": "Renamed", "user_id": 999}))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Renamed");
    assert_eq!(body["data"]["user_id"].as_i64(), Some(owner_id));

    let response = app
        .client
        .delete(app.url(&format!("/api/blog-post/{post_id}")))
        .bearer_auth(&owner)
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .client
        .get(app.url(&format!("/api/blog-post/{post_id}")))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_second_page_returns_posts_six_to_ten() {
    let app = spawn_app().await;
    app.register("writer", "writer@example.com").await;
    let token = app.login("writer@example.com").await;
    let category = app.create_category("General").await;

    for n in 1..=12 {
        let response = app.create_post(&token, &format!("Post {n:02}"), category).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let body: Value = app
        .client
        .get(app.url("/api/blog-posts?page=2&limit=5&sort=title&order=asc"))
        .send()
        .await
        .expect("req fail")
        .json()
        .await
        .unwrap();

    assert_eq!(body["message"], "Paginated posts fetched");
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Post 06", "Post 07", "Post 08", "Post 09", "Post 10"]);
}

#[tokio::test]
async fn test_listing_with_bad_sort_falls_back_and_bad_page_fails() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/api/blog-posts?page=1&limit=5&sort=malicious_value&order=sideways"))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .client
        .get(app.url("/api/blog-posts?page=zero&limit=5"))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid pagination params");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = spawn_app().await;
    let body: Value = app
        .client
        .get(app.url("/api-docs/openapi.json"))
        .send()
        .await
        .expect("req fail")
        .json()
        .await
        .unwrap();

    assert!(body["paths"].get("/api/blog-posts").is_some());
    assert!(body["components"]["securitySchemes"].get("bearer_auth").is_some());
}
