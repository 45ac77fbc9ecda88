use std::collections::HashMap;
use std::sync::Arc;

use storage::repository::{ProgressRepository, TopicRepository, UserRepository};
use study_core::calendar::YearMonth;
use study_core::model::{
    DailyProgress, ProgressKey, ProgressRecord, TopicId, TopicItemId, UserId,
};
use study_core::report;

use crate::Clock;
use crate::error::{ProgressError, ReportError};

/// Tracks per-item completion and builds per-user daily completion reports.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    topics: Arc<dyn TopicRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        topics: Arc<dyn TopicRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            users,
            topics,
            progress,
        }
    }

    /// One entry per (day, user with assigned items) for the given month.
    ///
    /// `month` is zero-based (January is 0).
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidInput` for an out-of-range month before
    /// touching storage, and `ReportError::Storage` if any read fails.
    pub async fn compute_month_progress(
        &self,
        year: i32,
        month: i32,
    ) -> Result<Vec<DailyProgress>, ReportError> {
        let month = YearMonth::new(year, month).inspect_err(|e| {
            tracing::warn!(year, month, error = %e, "rejected month progress request");
        })?;

        let topics = self.topics.list_topics().await?;
        let completed = self
            .progress
            .list_completed_between(month.first_day(), month.last_day())
            .await?;
        let names: HashMap<UserId, String> = self
            .users
            .list_users()
            .await?
            .into_iter()
            .map(|u| (u.id(), u.name().to_owned()))
            .collect();

        let out = report::month_progress(month, &topics, &completed, &names);
        tracing::debug!(
            %month,
            topics = topics.len(),
            completions = completed.len(),
            entries = out.len(),
            "computed month progress"
        );
        Ok(out)
    }

    /// `compute_month_progress` narrowed to one user.
    ///
    /// # Errors
    ///
    /// Same as `compute_month_progress`.
    pub async fn compute_user_month_progress(
        &self,
        user_id: UserId,
        year: i32,
        month: i32,
    ) -> Result<Vec<DailyProgress>, ReportError> {
        let all = self.compute_month_progress(year, month).await?;
        Ok(all.into_iter().filter(|p| p.user_id == user_id).collect())
    }

    /// Set an item's completion state for its assigned user.
    ///
    /// Idempotent: writing the same state twice leaves a single record, and
    /// re-completing keeps the first completion time.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the topic is missing, belongs to another
    /// user, or lacks the item, or if storage fails.
    pub async fn set_item_progress(
        &self,
        user_id: UserId,
        topic_id: TopicId,
        item_id: TopicItemId,
        completed: bool,
    ) -> Result<ProgressRecord, ProgressError> {
        let topic = self
            .topics
            .get_topic(topic_id)
            .await?
            .ok_or(ProgressError::TopicNotFound(topic_id))?;
        if topic.user_id() != user_id {
            return Err(ProgressError::NotAssigned {
                user: user_id,
                topic: topic_id,
            });
        }
        if topic.item(item_id).is_none() {
            return Err(ProgressError::ItemNotFound {
                topic: topic_id,
                item: item_id,
            });
        }

        let key = ProgressKey::new(user_id, topic_id, item_id);
        let existing = self.progress.get_progress(key).await?;
        let record = ProgressRecord::merge(existing.as_ref(), key, completed, self.clock.now());
        self.progress.upsert_progress(&record).await?;
        tracing::info!(%key, completed, "updated item progress");
        Ok(record)
    }

    /// Shorthand for `set_item_progress(.., true)`.
    ///
    /// # Errors
    ///
    /// Same as `set_item_progress`.
    pub async fn mark_item_complete(
        &self,
        user_id: UserId,
        topic_id: TopicId,
        item_id: TopicItemId,
    ) -> Result<ProgressRecord, ProgressError> {
        self.set_item_progress(user_id, topic_id, item_id, true)
            .await
    }

    /// Every progress record of a user.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if repository access fails.
    pub async fn user_progress(&self, user_id: UserId) -> Result<Vec<ProgressRecord>, ProgressError> {
        let records = self.progress.list_progress_for_user(user_id).await?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{DateTime, Duration, Utc};
    use storage::repository::{InMemoryRepository, StorageError};
    use study_core::time::{fixed_clock, fixed_now};

    use crate::test_support::{UnavailableStore, add_topic, add_user};

    fn service(repo: &InMemoryRepository, now: DateTime<Utc>) -> ProgressService {
        ProgressService::new(
            Clock::fixed(now),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    #[tokio::test]
    async fn five_of_ten_items_is_fifty_percent() {
        let repo = InMemoryRepository::new();
        let user = add_user(&repo, "Ana").await;
        let first = add_topic(&repo, user, 6).await;
        let second = add_topic(&repo, user, 4).await;

        let on_15th = service(&repo, "2025-06-15T09:30:00Z".parse().unwrap());
        for item in 1..=3 {
            on_15th
                .mark_item_complete(user, first, TopicItemId::new(item))
                .await
                .unwrap();
        }
        for item in 1..=2 {
            on_15th
                .mark_item_complete(user, second, TopicItemId::new(item))
                .await
                .unwrap();
        }

        let progress = on_15th.compute_month_progress(2025, 5).await.unwrap();
        let entry = progress
            .iter()
            .find(|p| p.date.to_string() == "2025-06-15" && p.user_id == user)
            .unwrap();
        assert_eq!(entry.user_name, "Ana");
        assert_eq!(entry.total_topics, 10);
        assert_eq!(entry.completed_topics, 5);
        assert_eq!(entry.completion_percentage, 50);
        assert_eq!(progress.len(), 30);
    }

    #[tokio::test]
    async fn users_without_topics_never_appear() {
        let repo = InMemoryRepository::new();
        let learner = add_user(&repo, "Learner").await;
        let idle = add_user(&repo, "Idle").await;
        add_topic(&repo, learner, 2).await;

        let progress = service(&repo, fixed_now())
            .compute_month_progress(2025, 5)
            .await
            .unwrap();
        assert!(!progress.is_empty());
        assert!(progress.iter().all(|p| p.user_id != idle));
    }

    #[tokio::test]
    async fn user_filter_is_a_post_filter() {
        let repo = InMemoryRepository::new();
        let a = add_user(&repo, "A").await;
        let b = add_user(&repo, "B").await;
        add_topic(&repo, a, 1).await;
        add_topic(&repo, b, 1).await;

        let svc = service(&repo, fixed_now());
        let all = svc.compute_month_progress(2025, 1).await.unwrap();
        let only_b = svc.compute_user_month_progress(b, 2025, 1).await.unwrap();
        assert_eq!(all.len(), 2 * 28);
        assert_eq!(only_b.len(), 28);
        assert_eq!(
            only_b,
            all.into_iter().filter(|p| p.user_id == b).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn marking_twice_keeps_one_record() {
        let repo = InMemoryRepository::new();
        let user = add_user(&repo, "Ana").await;
        let topic = add_topic(&repo, user, 2).await;

        let first = service(&repo, fixed_now())
            .mark_item_complete(user, topic, TopicItemId::new(1))
            .await
            .unwrap();
        let second = service(&repo, fixed_now() + Duration::days(2))
            .mark_item_complete(user, topic, TopicItemId::new(1))
            .await
            .unwrap();

        assert_eq!(first.completed_at(), second.completed_at());
        let records = service(&repo, fixed_now()).user_progress(user).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn unmarking_removes_completion_from_reports() {
        let repo = InMemoryRepository::new();
        let user = add_user(&repo, "Ana").await;
        let topic = add_topic(&repo, user, 1).await;
        let svc = service(&repo, fixed_now());

        svc.mark_item_complete(user, topic, TopicItemId::new(1))
            .await
            .unwrap();
        svc.set_item_progress(user, topic, TopicItemId::new(1), false)
            .await
            .unwrap();

        let progress = svc.compute_month_progress(2025, 5).await.unwrap();
        assert!(progress.iter().all(|p| p.completed_topics == 0));
    }

    #[tokio::test]
    async fn rejects_foreign_or_missing_items() {
        let repo = InMemoryRepository::new();
        let owner = add_user(&repo, "Owner").await;
        let other = add_user(&repo, "Other").await;
        let topic = add_topic(&repo, owner, 1).await;
        let svc = service(&repo, fixed_now());

        let err = svc
            .mark_item_complete(other, topic, TopicItemId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::NotAssigned { .. }));

        let err = svc
            .mark_item_complete(owner, topic, TopicItemId::new(2))
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::ItemNotFound { .. }));

        let err = svc
            .mark_item_complete(owner, TopicId::new(99), TopicItemId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::TopicNotFound(_)));
    }

    #[tokio::test]
    async fn invalid_month_fails_before_storage() {
        let store = Arc::new(UnavailableStore);
        let svc = ProgressService::new(fixed_clock(), store.clone(), store.clone(), store);
        let err = svc.compute_month_progress(2025, 12).await.unwrap_err();
        assert!(matches!(err, ReportError::InvalidInput(_)));
        assert!(!err.is_retryable());

        let err = svc.compute_month_progress(2025, -1).await.unwrap_err();
        assert!(matches!(err, ReportError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn store_failures_propagate() {
        let store = Arc::new(UnavailableStore);
        let svc = ProgressService::new(fixed_clock(), store.clone(), store.clone(), store);
        let err = svc.compute_month_progress(2025, 5).await.unwrap_err();
        assert!(matches!(
            err,
            ReportError::Storage(StorageError::Unavailable(_))
        ));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn failing_progress_read_after_topics_load_aborts_report() {
        let repo = InMemoryRepository::new();
        let user = add_user(&repo, "Ana").await;
        add_topic(&repo, user, 3).await;
        let svc = ProgressService::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(UnavailableStore),
        );

        let err = svc.compute_month_progress(2025, 5).await.unwrap_err();
        assert!(matches!(
            err,
            ReportError::Storage(StorageError::Unavailable(_))
        ));
        assert!(err.is_retryable());
        assert!(svc.compute_user_month_progress(user, 2025, 5).await.is_err());
    }

    #[tokio::test]
    async fn failing_user_read_after_progress_load_aborts_report() {
        let repo = InMemoryRepository::new();
        let user = add_user(&repo, "Ana").await;
        let topic = add_topic(&repo, user, 2).await;
        service(&repo, fixed_now())
            .mark_item_complete(user, topic, TopicItemId::new(1))
            .await
            .unwrap();

        let svc = ProgressService::new(
            fixed_clock(),
            Arc::new(UnavailableStore),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );
        let err = svc.compute_month_progress(2025, 5).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
