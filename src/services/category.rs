use std::sync::Arc;

use crate::{
    error::AppError,
    models::{Category, CategoryRequest},
    repository::CategoryRepository,
};

#[derive(Clone)]
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(categories: Arc<dyn CategoryRepository>) -> Self {
        Self { categories }
    }

    pub async fn create(&self, req: CategoryRequest) -> Result<Category, AppError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Category name cannot be empty".to_string()));
        }

        let category = self.categories.create(name).await?;
        tracing::info!(category_id = category.id, "category created");
        Ok(category)
    }

    pub async fn list(&self) -> Result<Vec<Category>, AppError> {
        Ok(self.categories.list().await?)
    }
}
