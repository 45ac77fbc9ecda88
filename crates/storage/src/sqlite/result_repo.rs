use chrono::NaiveDate;
use study_core::model::{ResultId, StudyResult, UserId};

use super::SqliteRepository;
use super::mapping::{id_i64, map_result_row, result_id_from_i64, unavailable};
use crate::repository::{ResultRepository, StorageError};

const RESULT_COLUMNS: &str =
    "id, user_id, user_name, topic_id, topic_title, score, completed_at, date";

#[async_trait::async_trait]
impl ResultRepository for SqliteRepository {
    async fn append_result(&self, result: &StudyResult) -> Result<ResultId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO results (
                    user_id, user_name, topic_id, topic_title,
                    score, completed_at, date
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(id_i64("user_id", result.user_id().value())?)
        .bind(result.user_name())
        .bind(id_i64("topic_id", result.topic_id().value())?)
        .bind(result.topic_title())
        .bind(i64::from(result.score().value()))
        .bind(result.completed_at())
        .bind(result.date())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        result_id_from_i64(res.last_insert_rowid())
    }

    async fn list_results_between(
        &self,
        from: NaiveDate,
        until: NaiveDate,
        user_id: Option<UserId>,
    ) -> Result<Vec<StudyResult>, StorageError> {
        let mut sql = format!("SELECT {RESULT_COLUMNS} FROM results WHERE date >= ?1 AND date <= ?2");
        if user_id.is_some() {
            sql.push_str(" AND user_id = ?3");
        }
        sql.push_str(" ORDER BY date ASC, completed_at ASC, id ASC");

        let mut query = sqlx::query(&sql).bind(from).bind(until);
        if let Some(user_id) = user_id {
            query = query.bind(id_i64("user_id", user_id.value())?);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(unavailable)?;
        tracing::debug!(%from, %until, rows = rows.len(), "loaded results");
        rows.iter().map(map_result_row).collect()
    }

    async fn list_results_on(&self, date: NaiveDate) -> Result<Vec<StudyResult>, StorageError> {
        let sql = format!(
            "SELECT {RESULT_COLUMNS} FROM results WHERE date = ?1
             ORDER BY completed_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;
        rows.iter().map(map_result_row).collect()
    }

    async fn list_results_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<StudyResult>, StorageError> {
        let sql = format!(
            "SELECT {RESULT_COLUMNS} FROM results WHERE user_id = ?1
             ORDER BY completed_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(id_i64("user_id", user_id.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;
        rows.iter().map(map_result_row).collect()
    }
}
