use std::{cmp::Ordering, collections::BTreeMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{CategoryRepository, PostRepository, RepoResult, RepositoryError, UserRepository};
use crate::{
    models::{Category, NewPost, NewUser, Post, PostChanges, UserChanges, UserRecord},
    pagination::{PageRequest, SortField, SortOrder},
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, UserRecord>,
    posts: BTreeMap<i64, Post>,
    categories: BTreeMap<i64, Category>,
    last_user_id: i64,
    last_post_id: i64,
    last_category_id: i64,
}

/// InMemoryRepository
///
/// A process-local backing store implementing every persistence trait with the
/// same observable rules as the Postgres schema: unique emails, post → user and
/// post → category references, cascade of posts on user deletion, and the same
/// search semantics. Title sorting is case-insensitive with byte order as the
/// tiebreak; a Postgres collation may order accents and punctuation differently.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

// Timestamps never move backwards for a row, even if the wall clock does.
fn touch(previous: DateTime<Utc>) -> DateTime<Utc> {
    previous.max(Utc::now())
}

fn matches_search(post: &Post, needle: &str) -> bool {
    post.title.to_lowercase().contains(needle) || post.description.to_lowercase().contains(needle)
}

fn compare(a: &Post, b: &Post, sort: SortField, order: SortOrder) -> Ordering {
    let ascending = match sort {
        SortField::Title => a
            .title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.title.cmp(&b.title)),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
    }
    .then(a.id.cmp(&b.id));

    match order {
        SortOrder::Asc => ascending,
        SortOrder::Desc => ascending.reverse(),
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn create(&self, user: NewUser) -> RepoResult<UserRecord> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::UniqueViolation);
        }

        tables.last_user_id += 1;
        let now = Utc::now();
        let record = UserRecord {
            id: tables.last_user_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: i64) -> RepoResult<Option<UserRecord>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn email_taken(&self, email: &str, exclude_id: i64) -> RepoResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .any(|u| u.email == email && u.id != exclude_id))
    }

    async fn update(&self, id: i64, changes: UserChanges) -> RepoResult<Option<UserRecord>> {
        let mut tables = self.tables.write().await;

        if let Some(email) = &changes.email {
            if tables.users.values().any(|u| &u.email == email && u.id != id) {
                return Err(RepositoryError::UniqueViolation);
            }
        }

        let Some(record) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            record.name = name;
        }
        if let Some(email) = changes.email {
            record.email = email;
        }
        if let Some(hash) = changes.password_hash {
            record.password_hash = hash;
        }
        if let Some(role) = changes.role {
            record.role = role;
        }
        record.updated_at = touch(record.updated_at);
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.posts.retain(|_, post| post.user_id != id);
        Ok(true)
    }
}

#[async_trait]
impl PostRepository for InMemoryRepository {
    async fn create(&self, post: NewPost) -> RepoResult<Post> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&post.user_id)
            || !tables.categories.contains_key(&post.category_id)
        {
            return Err(RepositoryError::ForeignKeyViolation);
        }

        tables.last_post_id += 1;
        let now = Utc::now();
        let created = Post {
            id: tables.last_post_id,
            user_id: post.user_id,
            title: post.title,
            description: post.description,
            body: post.body,
            category_id: post.category_id,
            created_at: now,
            updated_at: now,
        };
        tables.posts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> RepoResult<Option<Post>> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn update(&self, id: i64, changes: PostChanges) -> RepoResult<Option<Post>> {
        let mut tables = self.tables.write().await;

        if let Some(category_id) = changes.category_id {
            if !tables.categories.contains_key(&category_id) {
                return Err(RepositoryError::ForeignKeyViolation);
            }
        }

        let Some(post) = tables.posts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(description) = changes.description {
            post.description = description;
        }
        if let Some(body) = changes.body {
            post.body = Some(body);
        }
        if let Some(category_id) = changes.category_id {
            post.category_id = category_id;
        }
        post.updated_at = touch(post.updated_at);
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        Ok(self.tables.write().await.posts.remove(&id).is_some())
    }

    async fn list_all(&self) -> RepoResult<Vec<Post>> {
        let tables = self.tables.read().await;
        let mut posts: Vec<Post> = tables.posts.values().cloned().collect();
        posts.sort_by(|a, b| compare(a, b, SortField::CreatedAt, SortOrder::Desc));
        Ok(posts)
    }

    async fn list_page(&self, page: &PageRequest) -> RepoResult<Vec<Post>> {
        let tables = self.tables.read().await;
        let needle = page.search.as_deref().map(str::to_lowercase);

        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|p| needle.as_deref().is_none_or(|n| matches_search(p, n)))
            .cloned()
            .collect();
        posts.sort_by(|a, b| compare(a, b, page.sort, page.order));

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
        Ok(posts.into_iter().skip(offset).take(limit).collect())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryRepository {
    async fn create(&self, name: &str) -> RepoResult<Category> {
        let mut tables = self.tables.write().await;
        tables.last_category_id += 1;
        let category = Category {
            id: tables.last_category_id,
            name: name.to_string(),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn get_by_id(&self, id: i64) -> RepoResult<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn list(&self) -> RepoResult<Vec<Category>> {
        Ok(self.tables.read().await.categories.values().cloned().collect())
    }
}
