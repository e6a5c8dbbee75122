//! News service.

use crate::services::{
    activity_log::{ActivityEntry, ActivityLogService},
    event_publisher::{ChangeEvent, ChangeKind, Collection, EventPublisherService, publish},
};
use gad_common::{AppResult, IdGenerator};
use gad_db::{entities::news, repositories::NewsRepository};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Input for creating a news post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNewsInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(min = 1, max = 50000))]
    pub content: String,
    #[validate(url)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

/// Input for updating a news post.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNewsInput {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 50000))]
    pub content: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    pub is_published: Option<bool>,
}

/// News service for business logic.
#[derive(Clone)]
pub struct NewsService {
    news_repo: NewsRepository,
    activity_log: ActivityLogService,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

impl NewsService {
    /// Create a new news service.
    #[must_use]
    pub const fn new(news_repo: NewsRepository, activity_log: ActivityLogService) -> Self {
        Self {
            news_repo,
            activity_log,
            event_publisher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Create a news post.
    pub async fn create(&self, author_id: &str, input: CreateNewsInput) -> AppResult<news::Model> {
        input.validate()?;

        let model = news::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title.trim().to_string()),
            content: Set(input.content),
            image_url: Set(input.image_url),
            is_published: Set(input.is_published),
            created_by: Set(author_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let post = self.news_repo.create(model).await?;

        self.activity_log
            .record(ActivityEntry::success(Some(author_id), "news.create", "news").entity(&post.id))
            .await;
        self.publish(ChangeKind::Created, &post).await;

        Ok(post)
    }

    /// Get a news post by ID.
    pub async fn get(&self, id: &str) -> AppResult<news::Model> {
        self.news_repo.get_by_id(id).await
    }

    /// Published posts, newest first.
    pub async fn published(&self, limit: u64, offset: u64) -> AppResult<Vec<news::Model>> {
        self.news_repo.find(false, limit, offset).await
    }

    /// All posts including drafts, newest first.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<news::Model>> {
        self.news_repo.find(true, limit, offset).await
    }

    /// Update a news post.
    pub async fn update(
        &self,
        actor_id: &str,
        id: &str,
        input: UpdateNewsInput,
    ) -> AppResult<news::Model> {
        input.validate()?;
        let post = self.news_repo.get_by_id(id).await?;

        let mut active: news::ActiveModel = post.into();
        if let Some(title) = input.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(content) = input.content {
            active.content = Set(content);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(is_published) = input.is_published {
            active.is_published = Set(is_published);
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let post = self.news_repo.update(active).await?;

        self.activity_log
            .record(ActivityEntry::success(Some(actor_id), "news.update", "news").entity(&post.id))
            .await;
        self.publish(ChangeKind::Updated, &post).await;

        Ok(post)
    }

    /// Delete a news post.
    pub async fn delete(&self, actor_id: &str, id: &str) -> AppResult<()> {
        self.news_repo.delete(id).await?;

        self.activity_log
            .record(ActivityEntry::success(Some(actor_id), "news.delete", "news").entity(id))
            .await;
        publish(
            self.event_publisher.as_ref(),
            ChangeEvent {
                collection: Collection::News,
                kind: ChangeKind::Deleted,
                id: Some(id.to_string()),
                body: serde_json::Value::Null,
            },
        )
        .await;

        Ok(())
    }

    async fn publish(&self, kind: ChangeKind, post: &news::Model) {
        publish(
            self.event_publisher.as_ref(),
            ChangeEvent::record(Collection::News, kind, &post.id, post),
        )
        .await;
    }
}
