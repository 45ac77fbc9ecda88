use std::sync::Arc;

use storage::repository::{TopicRepository, UserRepository};
use study_core::model::{Topic, TopicId, TopicItemDraft, UserId};

use crate::Clock;
use crate::error::TopicServiceError;

/// Assigns topics (ordered lists of study links) to users.
#[derive(Clone)]
pub struct TopicService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    topics: Arc<dyn TopicRepository>,
}

impl TopicService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        topics: Arc<dyn TopicRepository>,
    ) -> Self {
        Self {
            clock,
            users,
            topics,
        }
    }

    /// Validate the items and assign a new topic to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `TopicServiceError::UserNotFound` for an unknown user,
    /// `TopicServiceError::Topic` for an invalid item, or
    /// `TopicServiceError::Storage` if persistence fails.
    pub async fn create_topic(
        &self,
        user_id: UserId,
        items: Vec<TopicItemDraft>,
    ) -> Result<Topic, TopicServiceError> {
        if self.users.get_user(user_id).await?.is_none() {
            return Err(TopicServiceError::UserNotFound(user_id));
        }
        let topic = Topic::new(TopicId::new(0), user_id, items, self.clock.now())?;
        let id = self.topics.insert_new_topic(&topic).await?;
        tracing::info!(%id, user = %user_id, items = topic.item_count(), "assigned topic");
        Ok(topic.with_id(id))
    }

    /// # Errors
    ///
    /// Returns `TopicServiceError::Storage` if repository access fails.
    pub async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, TopicServiceError> {
        Ok(self.topics.get_topic(id).await?)
    }

    /// Every topic, newest first.
    ///
    /// # Errors
    ///
    /// Returns `TopicServiceError::Storage` if repository access fails.
    pub async fn list_topics(&self) -> Result<Vec<Topic>, TopicServiceError> {
        Ok(self.topics.list_topics().await?)
    }

    /// Topics assigned to one user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `TopicServiceError::Storage` if repository access fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Topic>, TopicServiceError> {
        Ok(self.topics.list_topics_for_user(user_id).await?)
    }

    /// # Errors
    ///
    /// Returns `TopicServiceError::Storage` with `StorageError::NotFound` for an
    /// unknown id.
    pub async fn delete_topic(&self, id: TopicId) -> Result<(), TopicServiceError> {
        self.topics.delete_topic(id).await?;
        tracing::info!(%id, "deleted topic");
        Ok(())
    }
}
