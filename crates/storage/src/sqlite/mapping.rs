use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use study_core::model::{
    ProgressKey, ProgressRecord, ResultId, Role, Score, StudyResult, Topic, TopicId, TopicItem,
    TopicItemId, User, UserId, UserProfile,
};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn unavailable(e: sqlx::Error) -> StorageError {
    StorageError::Unavailable(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn topic_id_from_i64(v: i64) -> Result<TopicId, StorageError> {
    Ok(TopicId::new(i64_to_u64("topic_id", v)?))
}

pub(crate) fn topic_item_id_from_i64(v: i64) -> Result<TopicItemId, StorageError> {
    Ok(TopicItemId::new(i64_to_u64("topic_item_id", v)?))
}

pub(crate) fn result_id_from_i64(v: i64) -> Result<ResultId, StorageError> {
    Ok(ResultId::new(i64_to_u64("result_id", v)?))
}

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<User, StorageError> {
    let role: String = row.try_get("role").map_err(ser)?;
    let role: Role = role.parse().map_err(ser)?;
    let profile = UserProfile::new(
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<String, _>("email").map_err(ser)?,
        row.try_get::<String, _>("phone").map_err(ser)?,
        role,
    );
    User::new(
        user_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        profile,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn encode_items(topic: &Topic) -> Result<String, StorageError> {
    serde_json::to_string(topic.items()).map_err(ser)
}

pub(crate) fn map_topic_row(row: &SqliteRow) -> Result<Topic, StorageError> {
    let items_json: String = row.try_get("items").map_err(ser)?;
    let items: Vec<TopicItem> = serde_json::from_str(&items_json).map_err(ser)?;
    Topic::from_persisted(
        topic_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        items,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    let key = ProgressKey::new(
        user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        topic_id_from_i64(row.try_get::<i64, _>("topic_id").map_err(ser)?)?,
        topic_item_id_from_i64(row.try_get::<i64, _>("topic_item_id").map_err(ser)?)?,
    );
    Ok(ProgressRecord::from_persisted(
        key,
        row.try_get("completed").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    ))
}

pub(crate) fn map_result_row(row: &SqliteRow) -> Result<StudyResult, StorageError> {
    let score: i64 = row.try_get("score").map_err(ser)?;
    let score = u32::try_from(score)
        .map_err(|_| StorageError::Serialization(format!("invalid score: {score}")))?;
    Ok(StudyResult::new(
        result_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        row.try_get::<String, _>("user_name").map_err(ser)?,
        topic_id_from_i64(row.try_get::<i64, _>("topic_id").map_err(ser)?)?,
        row.try_get::<String, _>("topic_title").map_err(ser)?,
        Score::new(score).map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
    ))
}
