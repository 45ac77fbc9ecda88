use std::sync::Arc;

use storage::demo::{DemoSummary, load_demo_data};
use storage::repository::Storage;

use crate::Clock;
use crate::calendar_service::CalendarService;
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;
use crate::result_service::ResultService;
use crate::topic_service::TopicService;
use crate::user_service::UserService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    storage: Storage,
    users: Arc<UserService>,
    topics: Arc<TopicService>,
    progress: Arc<ProgressService>,
    results: Arc<ResultService>,
    calendar: Arc<CalendarService>,
}

impl AppServices {
    #[must_use]
    pub fn new(storage: Storage, clock: Clock) -> Self {
        let progress = ProgressService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.topics),
            Arc::clone(&storage.progress),
        );
        let calendar = Arc::new(CalendarService::new(clock, progress.clone()));
        let results = Arc::new(ResultService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.topics),
            Arc::clone(&storage.results),
        ));
        let users = Arc::new(UserService::new(clock, Arc::clone(&storage.users)));
        let topics = Arc::new(TopicService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.topics),
        ));

        Self {
            clock,
            storage,
            users,
            topics,
            progress: Arc::new(progress),
            results,
            calendar,
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(storage, clock))
    }

    /// In-memory services pre-filled with the demo users, topics, and results.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Demo` if the fixtures fail to load.
    pub async fn in_memory_demo(clock: Clock) -> Result<Self, AppServicesError> {
        let services = Self::new(Storage::in_memory(), clock);
        services.load_demo().await?;
        Ok(services)
    }

    /// Load the demo fixtures into the current backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Demo` if any insert fails.
    pub async fn load_demo(&self) -> Result<DemoSummary, AppServicesError> {
        let summary = load_demo_data(&self.storage, self.clock.now()).await?;
        Ok(summary)
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn users(&self) -> Arc<UserService> {
        Arc::clone(&self.users)
    }

    #[must_use]
    pub fn topics(&self) -> Arc<TopicService> {
        Arc::clone(&self.topics)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn results(&self) -> Arc<ResultService> {
        Arc::clone(&self.results)
    }

    #[must_use]
    pub fn calendar(&self) -> Arc<CalendarService> {
        Arc::clone(&self.calendar)
    }
}
