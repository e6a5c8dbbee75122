//! News repository.

use std::sync::Arc;

use gad_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::entities::{News, news};

/// Repository for news operations.
#[derive(Clone)]
pub struct NewsRepository {
    db: Arc<DatabaseConnection>,
}

impl NewsRepository {
    /// Create a new news repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a news post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<news::Model>> {
        News::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a news post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<news::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("News not found: {id}")))
    }

    /// Create a news post.
    pub async fn create(&self, model: news::ActiveModel) -> AppResult<news::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a news post.
    pub async fn update(&self, model: news::ActiveModel) -> AppResult<news::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a news post.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let post = self.get_by_id(id).await?;
        post.delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List news, newest first. Drafts are included only when asked for.
    pub async fn find(
        &self,
        include_drafts: bool,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<news::Model>> {
        let mut query = News::find().order_by_desc(news::Column::CreatedAt);

        if !include_drafts {
            query = query.filter(news::Column::IsPublished.eq(true));
        }

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_news(id: &str, published: bool) -> news::Model {
        news::Model {
            id: id.to_string(),
            title: "GAD Week Highlights".to_string(),
            content: "Photos and stories from the week.".to_string(),
            image_url: None,
            is_published: published,
            created_by: "admin1".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_published() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_news("n1", true)]])
                .into_connection(),
        );

        let repo = NewsRepository::new(db);
        let posts = repo.find(false, 10, 0).await.unwrap();

        assert_eq!(posts.len(), 1);
        assert!(posts[0].is_published);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<news::Model>::new()])
                .into_connection(),
        );

        let repo = NewsRepository::new(db);
        assert!(matches!(repo.get_by_id("n9").await, Err(AppError::NotFound(_))));
    }
}
