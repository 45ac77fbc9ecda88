use chrono::NaiveDate;
use study_core::model::{ProgressKey, ProgressRecord, UserId};

use super::SqliteRepository;
use super::mapping::{id_i64, map_progress_row, unavailable};
use crate::repository::{ProgressRepository, StorageError};

const PROGRESS_COLUMNS: &str = "user_id, topic_id, topic_item_id, completed, completed_at, updated_at";

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let key = record.key();
        sqlx::query(
            r"
                INSERT INTO topic_progress (
                    user_id, topic_id, topic_item_id,
                    completed, completed_at, completed_on, updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(user_id, topic_id, topic_item_id) DO UPDATE SET
                    completed = excluded.completed,
                    completed_at = excluded.completed_at,
                    completed_on = excluded.completed_on,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(id_i64("user_id", key.user_id.value())?)
        .bind(id_i64("topic_id", key.topic_id.value())?)
        .bind(id_i64("topic_item_id", key.topic_item_id.value())?)
        .bind(record.is_completed())
        .bind(record.completed_at())
        .bind(record.completed_on())
        .bind(record.updated_at())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(())
    }

    async fn get_progress(&self, key: ProgressKey) -> Result<Option<ProgressRecord>, StorageError> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM topic_progress
             WHERE user_id = ?1 AND topic_id = ?2 AND topic_item_id = ?3"
        );
        let row = sqlx::query(&sql)
            .bind(id_i64("user_id", key.user_id.value())?)
            .bind(id_i64("topic_id", key.topic_id.value())?)
            .bind(id_i64("topic_item_id", key.topic_item_id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;
        row.as_ref().map(map_progress_row).transpose()
    }

    async fn list_progress_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM topic_progress
             WHERE user_id = ?1
             ORDER BY topic_id, topic_item_id"
        );
        let rows = sqlx::query(&sql)
            .bind(id_i64("user_id", user_id.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;
        rows.iter().map(map_progress_row).collect()
    }

    async fn list_completed_between(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM topic_progress
             WHERE completed = 1 AND completed_on >= ?1 AND completed_on <= ?2
             ORDER BY user_id, topic_id, topic_item_id"
        );
        let rows = sqlx::query(&sql)
            .bind(from)
            .bind(until)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;
        tracing::debug!(%from, %until, rows = rows.len(), "loaded completed progress");
        rows.iter().map(map_progress_row).collect()
    }
}
