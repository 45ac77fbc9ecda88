#![forbid(unsafe_code)]

pub mod app_services;
pub mod calendar_service;
pub mod error;
pub mod progress_service;
pub mod result_service;
pub mod topic_service;
pub mod user_service;

#[cfg(test)]
mod test_support;

pub use study_core::Clock;

pub use app_services::AppServices;
pub use calendar_service::CalendarService;
pub use error::{
    AppServicesError, ProgressError, ReportError, ResultServiceError, TopicServiceError,
    UserServiceError,
};
pub use progress_service::ProgressService;
pub use result_service::ResultService;
pub use topic_service::TopicService;
pub use user_service::UserService;
