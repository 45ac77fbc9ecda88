use std::sync::Arc;

use chrono::NaiveDate;
use storage::repository::{ResultRepository, TopicRepository, UserRepository};
use study_core::model::{
    ChartDataPoint, ChartPeriod, ResultId, Score, StudyResult, TopicId, TopicItemId, UserId,
};
use study_core::report;

use crate::Clock;
use crate::error::{ReportError, ResultServiceError};

/// Records scored results and turns them into chart series.
#[derive(Clone)]
pub struct ResultService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    topics: Arc<dyn TopicRepository>,
    results: Arc<dyn ResultRepository>,
}

impl ResultService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        topics: Arc<dyn TopicRepository>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        Self {
            clock,
            users,
            topics,
            results,
        }
    }

    /// Average score per date over the period ending today, oldest first.
    ///
    /// Dates without results are omitted rather than zero-filled.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` if the results cannot be read.
    pub async fn compute_chart_series(
        &self,
        period: ChartPeriod,
        user_id: Option<UserId>,
    ) -> Result<Vec<ChartDataPoint>, ReportError> {
        let window = period.window(self.clock.today());
        let results = self
            .results
            .list_results_between(window.start, window.end, user_id)
            .await?;
        let series = report::chart_series(&results, window, user_id);
        tracing::debug!(
            %period,
            from = %window.start,
            until = %window.end,
            results = results.len(),
            points = series.len(),
            "computed chart series"
        );
        Ok(series)
    }

    /// Record a score for one item of a user's topic.
    ///
    /// The user name and item title are copied onto the result as they are now.
    ///
    /// # Errors
    ///
    /// Returns `ResultServiceError` when the score is out of range, the user,
    /// topic, or item is missing, or storage fails.
    pub async fn record_result(
        &self,
        user_id: UserId,
        topic_id: TopicId,
        item_id: TopicItemId,
        score: u32,
    ) -> Result<StudyResult, ResultServiceError> {
        let score = Score::new(score)?;
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or(ResultServiceError::UserNotFound(user_id))?;
        let topic = self
            .topics
            .get_topic(topic_id)
            .await?
            .ok_or(ResultServiceError::TopicNotFound(topic_id))?;
        let item = topic.item(item_id).ok_or(ResultServiceError::ItemNotFound {
            topic: topic_id,
            item: item_id,
        })?;

        let result = StudyResult::new(
            ResultId::new(0),
            user_id,
            user.name(),
            topic_id,
            item.title(),
            score,
            self.clock.now(),
        );
        let id = self.results.append_result(&result).await?;
        tracing::info!(%id, user = %user_id, score = score.value(), "recorded result");
        Ok(result.with_id(id))
    }

    /// Results dated `date`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` if the results cannot be read.
    pub async fn results_on(&self, date: NaiveDate) -> Result<Vec<StudyResult>, ReportError> {
        Ok(self.results.list_results_on(date).await?)
    }

    /// A user's results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` if the results cannot be read.
    pub async fn results_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<StudyResult>, ReportError> {
        Ok(self.results.list_results_for_user(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{DateTime, Duration, Utc};
    use storage::repository::{InMemoryRepository, StorageError};
    use study_core::model::ResultError;
    use study_core::time::fixed_now;

    use crate::test_support::{UnavailableStore, add_topic, add_user};

    fn service(repo: &InMemoryRepository, now: DateTime<Utc>) -> ResultService {
        ResultService::new(
            Clock::fixed(now),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    #[tokio::test]
    async fn record_result_snapshots_names() {
        let repo = InMemoryRepository::new();
        let user = add_user(&repo, "Ana").await;
        let topic = add_topic(&repo, user, 2).await;

        let saved = service(&repo, fixed_now())
            .record_result(user, topic, TopicItemId::new(2), 88)
            .await
            .unwrap();
        assert_eq!(saved.id(), ResultId::new(1));
        assert_eq!(saved.user_name(), "Ana");
        assert_eq!(saved.topic_title(), "Lesson 2");
        assert_eq!(saved.score().value(), 88);
        assert_eq!(saved.date(), fixed_now().date_naive());
    }

    #[tokio::test]
    async fn record_result_rejects_bad_input() {
        let repo = InMemoryRepository::new();
        let user = add_user(&repo, "Ana").await;
        let topic = add_topic(&repo, user, 1).await;
        let svc = service(&repo, fixed_now());

        let err = svc
            .record_result(user, topic, TopicItemId::new(1), 101)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResultServiceError::Result(ResultError::ScoreOutOfRange(101))
        ));

        let err = svc
            .record_result(UserId::new(9), topic, TopicItemId::new(1), 50)
            .await
            .unwrap_err();
        assert!(matches!(err, ResultServiceError::UserNotFound(_)));

        let err = svc
            .record_result(user, topic, TopicItemId::new(5), 50)
            .await
            .unwrap_err();
        assert!(matches!(err, ResultServiceError::ItemNotFound { .. }));
    }

    #[tokio::test]
    async fn weekly_series_is_sparse_and_averaged() {
        let repo = InMemoryRepository::new();
        let user = add_user(&repo, "Ana").await;
        let topic = add_topic(&repo, user, 1).await;
        let item = TopicItemId::new(1);

        let three_days_ago = fixed_now() - Duration::days(3);
        service(&repo, three_days_ago)
            .record_result(user, topic, item, 80)
            .await
            .unwrap();
        service(&repo, three_days_ago + Duration::minutes(5))
            .record_result(user, topic, item, 91)
            .await
            .unwrap();
        service(&repo, fixed_now())
            .record_result(user, topic, item, 60)
            .await
            .unwrap();
        // Outside the seven-day window.
        service(&repo, fixed_now() - Duration::days(9))
            .record_result(user, topic, item, 10)
            .await
            .unwrap();

        let series = service(&repo, fixed_now())
            .compute_chart_series(ChartPeriod::Week, None)
            .await
            .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, three_days_ago.date_naive());
        assert_eq!(series[0].score, 86);
        assert_eq!(series[0].count, 2);
        assert_eq!(series[1].date, fixed_now().date_naive());
        assert_eq!(series[1].score, 60);
    }

    #[tokio::test]
    async fn series_can_be_scoped_to_one_user() {
        let repo = InMemoryRepository::new();
        let a = add_user(&repo, "A").await;
        let b = add_user(&repo, "B").await;
        let ta = add_topic(&repo, a, 1).await;
        let tb = add_topic(&repo, b, 1).await;
        let svc = service(&repo, fixed_now());
        svc.record_result(a, ta, TopicItemId::new(1), 100)
            .await
            .unwrap();
        svc.record_result(b, tb, TopicItemId::new(1), 0)
            .await
            .unwrap();

        let all = svc.compute_chart_series(ChartPeriod::Day, None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].score, 50);

        let only_b = svc
            .compute_chart_series(ChartPeriod::Day, Some(b))
            .await
            .unwrap();
        assert_eq!(only_b[0].score, 0);
        assert_eq!(only_b[0].count, 1);
    }

    #[tokio::test]
    async fn empty_store_gives_empty_series() {
        let repo = InMemoryRepository::new();
        let series = service(&repo, fixed_now())
            .compute_chart_series(ChartPeriod::Year, None)
            .await
            .unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn listings_are_newest_first() {
        let repo = InMemoryRepository::new();
        let user = add_user(&repo, "Ana").await;
        let topic = add_topic(&repo, user, 1).await;
        for (minutes, score) in [(0, 40), (30, 70)] {
            service(&repo, fixed_now() + Duration::minutes(minutes))
                .record_result(user, topic, TopicItemId::new(1), score)
                .await
                .unwrap();
        }

        let svc = service(&repo, fixed_now());
        let today = svc.results_on(fixed_now().date_naive()).await.unwrap();
        let scores: Vec<u8> = today.iter().map(|r| r.score().value()).collect();
        assert_eq!(scores, vec![70, 40]);
        assert_eq!(svc.results_for_user(user).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn store_failures_are_retryable() {
        let store = Arc::new(UnavailableStore);
        let svc = ResultService::new(Clock::fixed(fixed_now()), store.clone(), store.clone(), store);
        let err = svc
            .compute_chart_series(ChartPeriod::Month, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReportError::Storage(StorageError::Unavailable(_))
        ));
        assert!(err.is_retryable());
    }
}
