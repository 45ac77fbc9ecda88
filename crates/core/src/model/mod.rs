mod ids;
mod progress;
mod result;
mod topic;
mod user;

pub use ids::{ParseIdError, ResultId, TopicId, TopicItemId, UserId};

pub use progress::{DailyProgress, ProgressKey, ProgressRecord};
pub use result::{
    ChartDataPoint, ChartPeriod, DateWindow, ParsePeriodError, ResultError, Score, StudyResult,
};
pub use topic::{Topic, TopicError, TopicItem, TopicItemDraft};
pub use user::{ParseRoleError, Role, User, UserError, UserProfile};
