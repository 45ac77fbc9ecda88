//! Shared error types for the services crate.

use thiserror::Error;

use storage::demo::DemoError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use study_core::calendar::CalendarError;
use study_core::model::{
    ParsePeriodError, ResultError, TopicError, TopicId, TopicItemId, UserError, UserId,
};

/// Errors emitted by the report builders (month progress, charts, calendar).
///
/// Input is checked before any store access; store failures abort the whole
/// report so a partial aggregate is never returned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ReportError {
    /// True when the failure came from an unavailable store.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            ReportError::Storage(e) => e.is_retryable(),
            ReportError::InvalidInput(_) => false,
        }
    }
}

impl From<CalendarError> for ReportError {
    fn from(e: CalendarError) -> Self {
        ReportError::InvalidInput(e.to_string())
    }
}

impl From<ParsePeriodError> for ReportError {
    fn from(e: ParsePeriodError) -> Self {
        ReportError::InvalidInput(e.to_string())
    }
}

/// Errors emitted by `ProgressService` when marking items.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("topic {0} not found")]
    TopicNotFound(TopicId),
    #[error("topic {topic} is not assigned to user {user}")]
    NotAssigned { user: UserId, topic: TopicId },
    #[error("item {item} not found in topic {topic}")]
    ItemNotFound { topic: TopicId, item: TopicItemId },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ResultService` when recording results.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResultServiceError {
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("topic {0} not found")]
    TopicNotFound(TopicId),
    #[error("item {item} not found in topic {topic}")]
    ItemNotFound { topic: TopicId, item: TopicItemId },
    #[error(transparent)]
    Result(#[from] ResultError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `UserService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UserServiceError {
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `TopicService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TopicServiceError {
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error(transparent)]
    Topic(#[from] TopicError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Demo(#[from] DemoError),
}
