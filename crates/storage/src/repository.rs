use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use study_core::model::{
    ProgressKey, ProgressRecord, ResultId, Role, StudyResult, Topic, TopicId, User, UserId,
};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    /// Whether the caller may reasonably try the same operation again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Unavailable(_))
    }
}

/// Repository contract for user profiles.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user and return the assigned ID. The ID on `user` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the user cannot be stored.
    async fn insert_new_user(&self, user: &User) -> Result<UserId, StorageError>;

    /// Persist or replace a user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the user cannot be stored.
    async fn upsert_user(&self, user: &User) -> Result<(), StorageError>;

    /// Fetch a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// List users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn list_users(&self) -> Result<Vec<User>, StorageError>;

    /// List users with the given role, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, StorageError>;

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn delete_user(&self, id: UserId) -> Result<(), StorageError>;
}

/// Repository contract for topic bundles.
#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// Insert a new topic and return the assigned ID. The ID on `topic` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the topic cannot be stored.
    async fn insert_new_topic(&self, topic: &Topic) -> Result<TopicId, StorageError>;

    /// Fetch a topic by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, StorageError>;

    /// List every topic, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn list_topics(&self) -> Result<Vec<Topic>, StorageError>;

    /// List topics assigned to a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn list_topics_for_user(&self, user_id: UserId) -> Result<Vec<Topic>, StorageError>;

    /// Delete a topic.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn delete_topic(&self, id: TopicId) -> Result<(), StorageError>;
}

/// Repository contract for per-item progress, keyed by `ProgressKey`.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Persist a record, replacing any record with the same key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), StorageError>;

    /// Fetch a record by its composite key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn get_progress(&self, key: ProgressKey) -> Result<Option<ProgressRecord>, StorageError>;

    /// List every record belonging to a user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn list_progress_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ProgressRecord>, StorageError>;

    /// List completed records whose completion date is in `from..=until`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn list_completed_between(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<ProgressRecord>, StorageError>;
}

/// Repository contract for scored results. Results are append-only.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Append a result and return the assigned ID. The ID on `result` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(&self, result: &StudyResult) -> Result<ResultId, StorageError>;

    /// List results dated in `from..=until`, optionally for one user, oldest date first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn list_results_between(
        &self,
        from: NaiveDate,
        until: NaiveDate,
        user_id: Option<UserId>,
    ) -> Result<Vec<StudyResult>, StorageError>;

    /// List results dated `date`, most recently completed first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn list_results_on(&self, date: NaiveDate) -> Result<Vec<StudyResult>, StorageError>;

    /// List a user's results, most recently completed first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn list_results_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<StudyResult>, StorageError>;
}

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    topics: HashMap<TopicId, Topic>,
    progress: HashMap<ProgressKey, ProgressRecord>,
    results: Vec<StudyResult>,
    next_user_id: u64,
    next_topic_id: u64,
    next_result_id: u64,
}

fn next_id(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

/// Simple in-memory repository implementation for demos, tests, and prototyping.
///
/// Clones share the same tables, so one instance can back every trait object
/// in a `Storage`.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }
}

fn newest_users_first(users: &mut [User]) {
    users.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.id().cmp(&a.id()))
    });
}

fn newest_topics_first(topics: &mut [Topic]) {
    topics.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.id().cmp(&a.id()))
    });
}

fn latest_results_first(results: &mut [StudyResult]) {
    results.sort_by(|a, b| {
        b.completed_at()
            .cmp(&a.completed_at())
            .then_with(|| b.id().cmp(&a.id()))
    });
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn insert_new_user(&self, user: &User) -> Result<UserId, StorageError> {
        let mut guard = self.lock()?;
        let id = UserId::new(next_id(&mut guard.next_user_id));
        guard.users.insert(id, user.with_id(id));
        Ok(id)
    }

    async fn upsert_user(&self, user: &User) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.next_user_id = guard.next_user_id.max(user.id().value());
        guard.users.insert(user.id(), user.clone());
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.users.get(&id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let guard = self.lock()?;
        let mut users: Vec<User> = guard.users.values().cloned().collect();
        newest_users_first(&mut users);
        Ok(users)
    }

    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, StorageError> {
        let guard = self.lock()?;
        let mut users: Vec<User> = guard
            .users
            .values()
            .filter(|u| u.role() == role)
            .cloned()
            .collect();
        newest_users_first(&mut users);
        Ok(users)
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl TopicRepository for InMemoryRepository {
    async fn insert_new_topic(&self, topic: &Topic) -> Result<TopicId, StorageError> {
        let mut guard = self.lock()?;
        let id = TopicId::new(next_id(&mut guard.next_topic_id));
        guard.topics.insert(id, topic.with_id(id));
        Ok(id)
    }

    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.topics.get(&id).cloned())
    }

    async fn list_topics(&self) -> Result<Vec<Topic>, StorageError> {
        let guard = self.lock()?;
        let mut topics: Vec<Topic> = guard.topics.values().cloned().collect();
        newest_topics_first(&mut topics);
        Ok(topics)
    }

    async fn list_topics_for_user(&self, user_id: UserId) -> Result<Vec<Topic>, StorageError> {
        let guard = self.lock()?;
        let mut topics: Vec<Topic> = guard
            .topics
            .values()
            .filter(|t| t.user_id() == user_id)
            .cloned()
            .collect();
        newest_topics_first(&mut topics);
        Ok(topics)
    }

    async fn delete_topic(&self, id: TopicId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard
            .topics
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.progress.insert(record.key(), record.clone());
        Ok(())
    }

    async fn get_progress(&self, key: ProgressKey) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.progress.get(&key).cloned())
    }

    async fn list_progress_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self.lock()?;
        let mut records: Vec<ProgressRecord> = guard
            .progress
            .values()
            .filter(|r| r.key().user_id == user_id)
            .cloned()
            .collect();
        records.sort_by_key(ProgressRecord::key);
        Ok(records)
    }

    async fn list_completed_between(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self.lock()?;
        let mut records: Vec<ProgressRecord> = guard
            .progress
            .values()
            .filter(|r| r.completed_on().is_some_and(|d| from <= d && d <= until))
            .cloned()
            .collect();
        records.sort_by_key(ProgressRecord::key);
        Ok(records)
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn append_result(&self, result: &StudyResult) -> Result<ResultId, StorageError> {
        let mut guard = self.lock()?;
        let id = ResultId::new(next_id(&mut guard.next_result_id));
        guard.results.push(result.with_id(id));
        Ok(id)
    }

    async fn list_results_between(
        &self,
        from: NaiveDate,
        until: NaiveDate,
        user_id: Option<UserId>,
    ) -> Result<Vec<StudyResult>, StorageError> {
        let guard = self.lock()?;
        let mut results: Vec<StudyResult> = guard
            .results
            .iter()
            .filter(|r| from <= r.date() && r.date() <= until)
            .filter(|r| user_id.is_none_or(|id| id == r.user_id()))
            .cloned()
            .collect();
        results.sort_by_key(|r| (r.date(), r.completed_at(), r.id()));
        Ok(results)
    }

    async fn list_results_on(&self, date: NaiveDate) -> Result<Vec<StudyResult>, StorageError> {
        let guard = self.lock()?;
        let mut results: Vec<StudyResult> = guard
            .results
            .iter()
            .filter(|r| r.date() == date)
            .cloned()
            .collect();
        latest_results_first(&mut results);
        Ok(results)
    }

    async fn list_results_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<StudyResult>, StorageError> {
        let guard = self.lock()?;
        let mut results: Vec<StudyResult> = guard
            .results
            .iter()
            .filter(|r| r.user_id() == user_id)
            .cloned()
            .collect();
        latest_results_first(&mut results);
        Ok(results)
    }
}

/// Aggregates per-collection repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub topics: Arc<dyn TopicRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub results: Arc<dyn ResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    /// Wrap an existing in-memory repository, e.g. one pre-filled with fixtures.
    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        let users: Arc<dyn UserRepository> = Arc::new(repo.clone());
        let topics: Arc<dyn TopicRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let results: Arc<dyn ResultRepository> = Arc::new(repo);
        Self {
            users,
            topics,
            progress,
            results,
        }
    }
}
