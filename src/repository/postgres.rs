use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{CategoryRepository, PostRepository, RepoResult, UserRepository};
use crate::{
    models::{Category, NewPost, NewUser, Post, PostChanges, UserChanges, UserRecord},
    pagination::PageRequest,
};

const USER_COLUMNS: &str = "id, name, email, password, role, created_at, updated_at";
const POST_COLUMNS: &str =
    "id, user_id, title, description, body, category_id, created_at, updated_at";

/// PostgresRepository
///
/// The Postgres implementation of every persistence trait. Queries are checked at
/// runtime, so the crate builds without a live database.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn create(&self, user: NewUser) -> RepoResult<UserRecord> {
        let query = format!(
            "INSERT INTO users (name, email, password, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, NOW(), NOW()) RETURNING {USER_COLUMNS}"
        );
        let record = sqlx::query_as::<_, UserRecord>(&query)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(record)
    }

    async fn get_by_id(&self, id: i64) -> RepoResult<Option<UserRecord>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let record = sqlx::query_as::<_, UserRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn get_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let record = sqlx::query_as::<_, UserRecord>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn email_taken(&self, email: &str, exclude_id: i64) -> RepoResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND id <> $2)",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    /// Uses `COALESCE` so that only the columns present in `changes` are written.
    async fn update(&self, id: i64, changes: UserChanges) -> RepoResult<Option<UserRecord>> {
        let query = format!(
            "UPDATE users \
             SET name = COALESCE($2, name), \
                 email = COALESCE($3, email), \
                 password = COALESCE($4, password), \
                 role = COALESCE($5, role), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let record = sqlx::query_as::<_, UserRecord>(&query)
            .bind(id)
            .bind(changes.name)
            .bind(changes.email)
            .bind(changes.password_hash)
            .bind(changes.role.map(|r| r.as_str()))
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PostRepository for PostgresRepository {
    async fn create(&self, post: NewPost) -> RepoResult<Post> {
        let query = format!(
            "INSERT INTO posts (user_id, title, description, body, category_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) RETURNING {POST_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Post>(&query)
            .bind(post.user_id)
            .bind(&post.title)
            .bind(&post.description)
            .bind(&post.body)
            .bind(post.category_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> RepoResult<Option<Post>> {
        let query = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let post = sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    /// The `SET` list has no `user_id` entry, so ownership survives every update.
    async fn update(&self, id: i64, changes: PostChanges) -> RepoResult<Option<Post>> {
        let query = format!(
            "UPDATE posts \
             SET title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 body = COALESCE($4, body), \
                 category_id = COALESCE($5, category_id), \
                 updated_at = GREATEST(NOW(), updated_at) \
             WHERE id = $1 \
             RETURNING {POST_COLUMNS}"
        );
        let post = sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .bind(changes.title)
            .bind(changes.description)
            .bind(changes.body)
            .bind(changes.category_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self) -> RepoResult<Vec<Post>> {
        let query = format!("SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, id DESC");
        let posts = sqlx::query_as::<_, Post>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    /// list_page
    ///
    /// Builds the listing with `QueryBuilder`. The search pattern, limit and offset
    /// are bound parameters. The ORDER BY identifiers come only from the
    /// `SortField`/`SortOrder` allow-lists, since identifiers cannot be bound.
    async fn list_page(&self, page: &PageRequest) -> RepoResult<Vec<Post>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {POST_COLUMNS} FROM posts"));

        if let Some(pattern) = page.search_pattern() {
            builder.push(" WHERE (title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR description ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        let direction = page.order.keyword();
        builder.push(format!(
            " ORDER BY {} {direction}, id {direction}",
            page.sort.column()
        ));

        builder.push(" LIMIT ");
        builder.push_bind(i64::from(page.limit));
        builder.push(" OFFSET ");
        builder.push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let posts = builder
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }
}

#[async_trait]
impl CategoryRepository for PostgresRepository {
    async fn create(&self, name: &str) -> RepoResult<Category> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    async fn get_by_id(&self, id: i64) -> RepoResult<Option<Category>> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(category)
    }

    async fn list(&self) -> RepoResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }
}
