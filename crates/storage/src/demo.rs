//! Demo fixture set: a couple of learners, one admin, an assigned topic,
//! some progress, and scored results spread over the last days.
//!
//! Loads through the `Storage` traits, so the same data can fill the
//! in-memory backend for a demo or a `SQLite` file via `app seed-demo`.

use chrono::{DateTime, Duration, Utc};
use study_core::model::{
    ProgressKey, ProgressRecord, ResultId, Role, Score, StudyResult, Topic, TopicError, TopicId,
    TopicItemDraft, TopicItemId, User, UserError, UserId, UserProfile, ResultError,
};
use thiserror::Error;

use crate::repository::{StorageError, Storage};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DemoError {
    #[error("store already holds {users} users; demo data is only loaded into an empty store")]
    AlreadySeeded { users: usize },
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Topic(#[from] TopicError),
    #[error(transparent)]
    Result(#[from] ResultError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Counts of what `load_demo_data` wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DemoSummary {
    pub users: usize,
    pub topics: usize,
    pub progress: usize,
    pub results: usize,
}

fn profile(name: &str, email: &str, phone: &str, role: Role) -> UserProfile {
    UserProfile::new(name, email, phone, role)
}

/// Insert the demo fixtures, timestamped relative to `now`.
///
/// # Errors
///
/// Returns `DemoError::AlreadySeeded` if the store already has users, or
/// `DemoError::Storage` if any read or write fails.
pub async fn load_demo_data(storage: &Storage, now: DateTime<Utc>) -> Result<DemoSummary, DemoError> {
    let existing = storage.users.list_users().await?.len();
    if existing > 0 {
        tracing::warn!(users = existing, "skipping demo data: store is not empty");
        return Err(DemoError::AlreadySeeded { users: existing });
    }

    let mut summary = DemoSummary::default();
    let placeholder = UserId::new(0);

    let admin = User::new(
        placeholder,
        profile("Admin User", "admin@example.com", "+1234567899", Role::Admin),
        now - Duration::days(30),
    )?;
    storage.users.insert_new_user(&admin).await?;

    let john = User::new(
        placeholder,
        profile("John Doe", "john@example.com", "+1234567890", Role::User),
        now - Duration::days(20),
    )?;
    let john_id = storage.users.insert_new_user(&john).await?;

    let jane = User::new(
        placeholder,
        profile("Jane Smith", "jane@example.com", "+1234567891", Role::User),
        now - Duration::days(19),
    )?;
    let jane_id = storage.users.insert_new_user(&jane).await?;
    summary.users = 3;

    let frontend = Topic::new(
        TopicId::new(0),
        john_id,
        vec![
            TopicItemDraft::new("React Basics", "https://example.com/react"),
            TopicItemDraft::new("TypeScript Fundamentals", "https://example.com/ts"),
        ],
        now - Duration::days(15),
    )?;
    let frontend_id = storage.topics.insert_new_topic(&frontend).await?;

    let backend = Topic::new(
        TopicId::new(0),
        jane_id,
        vec![
            TopicItemDraft::new("HTTP Fundamentals", "https://example.com/http"),
            TopicItemDraft::new("SQL Joins", "https://example.com/sql"),
            TopicItemDraft::new("Caching", "https://example.com/cache"),
            TopicItemDraft::new("Observability", "https://example.com/o11y"),
        ],
        now - Duration::days(14),
    )?;
    let backend_id = storage.topics.insert_new_topic(&backend).await?;
    summary.topics = 2;

    let completions = [
        (john_id, frontend_id, 1, now - Duration::days(5)),
        (jane_id, backend_id, 1, now - Duration::days(4)),
        (jane_id, backend_id, 2, now - Duration::days(4)),
        (jane_id, backend_id, 3, now - Duration::days(1)),
    ];
    for (user_id, topic_id, item, at) in completions {
        let key = ProgressKey::new(user_id, topic_id, TopicItemId::new(item));
        storage
            .progress
            .upsert_progress(&ProgressRecord::merge(None, key, true, at))
            .await?;
        summary.progress += 1;
    }
    let pending = ProgressKey::new(john_id, frontend_id, TopicItemId::new(2));
    storage
        .progress
        .upsert_progress(&ProgressRecord::merge(None, pending, false, now))
        .await?;
    summary.progress += 1;

    let results = [
        (&john, john_id, frontend_id, "React Basics", 85, now - Duration::days(5)),
        (&jane, jane_id, backend_id, "HTTP Fundamentals", 92, now - Duration::days(4)),
        (&jane, jane_id, backend_id, "SQL Joins", 78, now - Duration::days(4)),
        (&jane, jane_id, backend_id, "Caching", 64, now - Duration::days(1)),
    ];
    for (user, user_id, topic_id, title, score, at) in results {
        let result = StudyResult::new(
            ResultId::new(0),
            user_id,
            user.name(),
            topic_id,
            title,
            Score::new(score)?,
            at,
        );
        storage.results.append_result(&result).await?;
        summary.results += 1;
    }

    tracing::info!(
        users = summary.users,
        topics = summary.topics,
        progress = summary.progress,
        results = summary.results,
        "loaded demo data"
    );
    Ok(summary)
}
