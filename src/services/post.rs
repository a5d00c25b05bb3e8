use std::sync::Arc;

use crate::{
    auth::AuthUser,
    error::AppError,
    models::{CreatePostRequest, NewPost, Post, PostChanges, UpdatePostRequest},
    pagination::PostListing,
    policy,
    repository::{CategoryRepository, PostRepository},
};

/// PostService
///
/// Blog post lifecycle. Ownership is always taken from the authenticated actor and
/// is never changed afterwards.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, categories: Arc<dyn CategoryRepository>) -> Self {
        Self { posts, categories }
    }

    async fn ensure_category_exists(&self, category_id: i64) -> Result<(), AppError> {
        match self.categories.get_by_id(category_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::Validation(format!(
                "Category not found with ID: {category_id}"
            ))),
        }
    }

    fn not_found(id: i64) -> AppError {
        AppError::NotFound(format!("Post not found with ID: {id}"))
    }

    /// create
    ///
    /// Title, description and a non-zero category are required. The owner is the
    /// actor; the request has no way to name another one.
    pub async fn create(&self, actor: &AuthUser, req: CreatePostRequest) -> Result<Post, AppError> {
        if req.title.trim().is_empty() || req.description.trim().is_empty() || req.category_id == 0
        {
            return Err(AppError::Validation(
                "All fields (title, description, category_id) are required".to_string(),
            ));
        }
        self.ensure_category_exists(req.category_id).await?;

        let post = self
            .posts
            .create(NewPost {
                user_id: actor.id,
                title: req.title,
                description: req.description,
                body: req.body,
                category_id: req.category_id,
            })
            .await?;

        tracing::info!(post_id = post.id, user_id = actor.id, "post created");
        Ok(post)
    }

    pub async fn get(&self, id: i64) -> Result<Post, AppError> {
        self.posts
            .get_by_id(id)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    /// update
    ///
    /// Loads the post, runs the owner-or-admin check against its stored owner, and
    /// only then validates and applies the submitted changes.
    pub async fn update(
        &self,
        actor: &AuthUser,
        id: i64,
        req: UpdatePostRequest,
    ) -> Result<Post, AppError> {
        let existing = self.get(id).await?;
        policy::ensure_can_mutate(actor, existing.user_id, "update this post")?;

        if req.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(AppError::Validation("Title cannot be empty".to_string()));
        }
        if req
            .description
            .as_deref()
            .is_some_and(|d| d.trim().is_empty())
        {
            return Err(AppError::Validation("Description cannot be empty".to_string()));
        }
        if let Some(category_id) = req.category_id {
            if category_id == 0 {
                return Err(AppError::Validation("Category ID cannot be zero".to_string()));
            }
            self.ensure_category_exists(category_id).await?;
        }

        let changes = PostChanges {
            title: req.title,
            description: req.description,
            body: req.body,
            category_id: req.category_id,
        };

        let updated = self
            .posts
            .update(id, changes)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        tracing::info!(post_id = id, actor_id = actor.id, "post updated");
        Ok(updated)
    }

    pub async fn delete(&self, actor: &AuthUser, id: i64) -> Result<(), AppError> {
        let existing = self.get(id).await?;
        policy::ensure_can_mutate(actor, existing.user_id, "delete this post")?;

        if !self.posts.delete(id).await? {
            return Err(Self::not_found(id));
        }

        tracing::info!(post_id = id, actor_id = actor.id, "post deleted");
        Ok(())
    }

    pub async fn list(&self, listing: &PostListing) -> Result<Vec<Post>, AppError> {
        let posts = match listing {
            PostListing::All => self.posts.list_all().await?,
            PostListing::Page(page) => self.posts.list_page(page).await?,
        };
        Ok(posts)
    }
}
