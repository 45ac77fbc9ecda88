use study_core::model::{Topic, TopicId, UserId};

use super::SqliteRepository;
use super::mapping::{encode_items, id_i64, map_topic_row, topic_id_from_i64, unavailable};
use crate::repository::{StorageError, TopicRepository};

#[async_trait::async_trait]
impl TopicRepository for SqliteRepository {
    async fn insert_new_topic(&self, topic: &Topic) -> Result<TopicId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO topics (user_id, items, created_at)
                VALUES (?1, ?2, ?3)
            ",
        )
        .bind(id_i64("user_id", topic.user_id().value())?)
        .bind(encode_items(topic)?)
        .bind(topic.created_at())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        topic_id_from_i64(res.last_insert_rowid())
    }

    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, StorageError> {
        let row = sqlx::query("SELECT id, user_id, items, created_at FROM topics WHERE id = ?1")
            .bind(id_i64("topic_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;
        row.as_ref().map(map_topic_row).transpose()
    }

    async fn list_topics(&self) -> Result<Vec<Topic>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, user_id, items, created_at
                FROM topics
                ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;
        rows.iter().map(map_topic_row).collect()
    }

    async fn list_topics_for_user(&self, user_id: UserId) -> Result<Vec<Topic>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, user_id, items, created_at
                FROM topics
                WHERE user_id = ?1
                ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;
        rows.iter().map(map_topic_row).collect()
    }

    async fn delete_topic(&self, id: TopicId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM topics WHERE id = ?1")
            .bind(id_i64("topic_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
