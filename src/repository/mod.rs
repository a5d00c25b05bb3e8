use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::{
    models::{Category, NewPost, NewUser, Post, PostChanges, UserChanges, UserRecord},
    pagination::PageRequest,
};

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("unique constraint violated")]
    UniqueViolation,
    #[error("foreign key constraint violated")]
    ForeignKeyViolation,
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return Self::UniqueViolation;
            }
            if db.is_foreign_key_violation() {
                return Self::ForeignKeyViolation;
            }
        }
        Self::Database(err)
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// UserRepository
///
/// Persistence operations for user accounts. All values reach storage as bound
/// parameters.
///
/// **Send + Sync + async_trait** make `Arc<dyn UserRepository>` shareable across
/// Axum's task boundaries.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> RepoResult<UserRecord>;
    async fn get_by_id(&self, id: i64) -> RepoResult<Option<UserRecord>>;
    async fn get_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>>;
    /// True if a user other than `exclude_id` already owns `email`.
    async fn email_taken(&self, email: &str, exclude_id: i64) -> RepoResult<bool>;
    /// Applies `changes` and refreshes `updated_at`. `None` if no such user.
    async fn update(&self, id: i64, changes: UserChanges) -> RepoResult<Option<UserRecord>>;
    /// Returns true if a row was removed. Owned posts are removed with it.
    async fn delete(&self, id: i64) -> RepoResult<bool>;
}

/// PostRepository
///
/// Persistence operations for blog posts. `update` never touches `user_id`.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: NewPost) -> RepoResult<Post>;
    async fn get_by_id(&self, id: i64) -> RepoResult<Option<Post>>;
    async fn update(&self, id: i64, changes: PostChanges) -> RepoResult<Option<Post>>;
    async fn delete(&self, id: i64) -> RepoResult<bool>;
    /// Every post, newest first.
    async fn list_all(&self) -> RepoResult<Vec<Post>>;
    /// One page ordered by the request's validated sort column and direction,
    /// ties broken by id in the same direction.
    async fn list_page(&self, page: &PageRequest) -> RepoResult<Vec<Post>>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, name: &str) -> RepoResult<Category>;
    async fn get_by_id(&self, id: i64) -> RepoResult<Option<Category>>;
    async fn list(&self) -> RepoResult<Vec<Category>>;
}

/// Repositories
///
/// The per-entity persistence capabilities the services are built from. Any
/// backing store that implements the three traits can be plugged in here.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub categories: Arc<dyn CategoryRepository>,
}

impl Repositories {
    /// All three capabilities served by one store.
    pub fn from_store<R>(store: Arc<R>) -> Self
    where
        R: UserRepository + PostRepository + CategoryRepository + 'static,
    {
        Self {
            users: store.clone(),
            posts: store.clone(),
            categories: store,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::from_store(Arc::new(PostgresRepository::new(pool)))
    }

    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(InMemoryRepository::new()))
    }
}
