use axum::{
    extract::FromRequestParts,
    http::{Request, StatusCode, header, request::Parts},
    response::IntoResponse,
};
use blog_backend::{
    PasswordHasher,
    auth::{AuthUser, TokenError, TokenManager},
    error::AppError,
    models::Role,
    password::PasswordError,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::Serialize;

const SECRET: &str = "auth-tests-secret";

fn manager() -> TokenManager {
    TokenManager::new(SECRET, Duration::hours(24))
}

fn parts_with_auth(value: Option<&str>) -> Parts {
    let mut builder = Request::builder().uri("/api/blog-post");
    if let Some(value) = value {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(()).unwrap().into_parts().0
}

async fn extract(tokens: &TokenManager, value: Option<&str>) -> Result<AuthUser, AppError> {
    let mut parts = parts_with_auth(value);
    AuthUser::from_request_parts(&mut parts, tokens).await
}

// --- Token Manager ---

#[test]
fn test_issued_token_validates_with_same_claims() {
    let tokens = manager();
    let issued = tokens.issue_token(7, Role::User).unwrap();

    let claims = tokens.validate_token(&issued.token).unwrap();
    assert_eq!(claims.user_id, 7);
    assert_eq!(claims.role, Role::User);
    assert_eq!(
        claims.expires_at().map(|t| t.timestamp()),
        Some(issued.expires_at.timestamp())
    );
    assert_eq!(claims.exp - claims.iat, Duration::hours(24).num_seconds());
}

#[test]
fn test_unrepresentable_expiry_is_an_error() {
    let tokens = TokenManager::new(SECRET, Duration::MAX);

    assert!(matches!(
        tokens.issue_token(7, Role::User),
        Err(TokenError::ExpiryOverflow)
    ));
}

#[test]
fn test_token_past_its_window_is_expired() {
    let tokens = manager();
    let issued = tokens
        .issue_token_at(7, Role::User, Utc::now() - Duration::hours(25))
        .unwrap();

    assert!(matches!(
        tokens.validate_token(&issued.token),
        Err(TokenError::Expired)
    ));
}

#[test]
fn test_token_expiring_right_now_is_rejected() {
    let tokens = manager();
    let issued = tokens
        .issue_token_at(7, Role::User, Utc::now() - Duration::hours(24))
        .unwrap();

    assert!(matches!(
        tokens.validate_token(&issued.token),
        Err(TokenError::Expired)
    ));
}

#[test]
fn test_token_signed_with_other_secret_is_rejected() {
    let forged = TokenManager::new("some-other-secret", Duration::hours(24))
        .issue_token(1, Role::Admin)
        .unwrap();

    assert!(matches!(
        manager().validate_token(&forged.token),
        Err(TokenError::InvalidSignature)
    ));
}

#[test]
fn test_garbage_token_is_malformed() {
    assert!(matches!(
        manager().validate_token("not.a.jwt"),
        Err(TokenError::Malformed)
    ));
    assert!(matches!(
        manager().validate_token(""),
        Err(TokenError::Malformed)
    ));
}

#[test]
fn test_token_with_unknown_role_is_malformed() {
    #[derive(Serialize)]
    struct RawClaims<'a> {
        user_id: i64,
        role: &'a str,
        iat: i64,
        exp: i64,
    }

    let now = Utc::now();
    let token = encode(
        &Header::default(),
        &RawClaims {
            user_id: 1,
            role: "superuser",
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        },
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    assert!(matches!(
        manager().validate_token(&token),
        Err(TokenError::Malformed)
    ));
}

// --- AuthUser Extractor ---

#[tokio::test]
async fn test_extractor_accepts_bearer_token() {
    let tokens = manager();
    let issued = tokens.issue_token(3, Role::Admin).unwrap();

    let user = extract(&tokens, Some(&format!("Bearer {}", issued.token)))
        .await
        .unwrap();
    assert_eq!(user, AuthUser { id: 3, role: Role::Admin });
}

#[tokio::test]
async fn test_extractor_rejects_missing_header() {
    let err = extract(&manager(), None).await.unwrap_err();
    assert!(matches!(&err, AppError::Authentication(msg) if msg == "Authorization header missing"));
    assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_extractor_rejects_non_bearer_scheme() {
    let tokens = manager();
    let issued = tokens.issue_token(3, Role::User).unwrap();

    for value in [issued.token.as_str(), "Basic dXNlcjpwYXNz", "Bearer ", "bearer x"] {
        let err = extract(&tokens, Some(value)).await.unwrap_err();
        assert!(
            matches!(&err, AppError::Authentication(msg) if msg == "Invalid Authorization header format"),
            "unexpected rejection for {value:?}: {err:?}"
        );
    }
}

#[tokio::test]
async fn test_extractor_rejects_expired_token() {
    let tokens = manager();
    let issued = tokens
        .issue_token_at(3, Role::User, Utc::now() - Duration::days(2))
        .unwrap();

    let err = extract(&tokens, Some(&format!("Bearer {}", issued.token)))
        .await
        .unwrap_err();
    assert!(matches!(&err, AppError::Authentication(msg) if msg.starts_with("Invalid token")));
}

// --- Password Hashing ---

#[test]
fn test_password_hash_never_equals_plaintext_and_verifies() {
    let hasher = PasswordHasher::new(4 /* bcrypt minimum cost */);
    let hash = hasher.hash("correct horse battery staple").unwrap();

    assert_ne!(hash, "correct horse battery staple");
    assert!(hasher.verify(&hash, "correct horse battery staple"));
    assert!(!hasher.verify(&hash, "Correct horse battery staple"));
}

#[test]
fn test_password_hashes_are_salted() {
    let hasher = PasswordHasher::new(4 /* bcrypt minimum cost */);

    let first = hasher.hash("password-one").unwrap();
    let second = hasher.hash("password-two").unwrap();
    let again = hasher.hash("password-one").unwrap();

    assert_ne!(first, second);
    assert_ne!(first, again);
    assert!(hasher.verify(&again, "password-one"));
}

#[test]
fn test_password_beyond_bcrypt_input_limit_is_refused() {
    let hasher = PasswordHasher::new(4 /* bcrypt minimum cost */);

    assert!(hasher.hash(&"x".repeat(72)).is_ok());
    assert!(matches!(
        hasher.hash(&"x".repeat(73)),
        Err(PasswordError::TooLong)
    ));
}

#[test]
fn test_malformed_stored_hash_never_verifies() {
    let hasher = PasswordHasher::new(4 /* bcrypt minimum cost */);
    assert!(!hasher.verify("plaintext-stored-by-mistake", "plaintext-stored-by-mistake"));
}
