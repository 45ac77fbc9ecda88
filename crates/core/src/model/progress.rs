use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::model::ids::{TopicId, TopicItemId, UserId};
use crate::ratio;

/// Composite identity of a progress record: one user, one item of one topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressKey {
    pub user_id: UserId,
    pub topic_id: TopicId,
    pub topic_item_id: TopicItemId,
}

impl ProgressKey {
    #[must_use]
    pub fn new(user_id: UserId, topic_id: TopicId, topic_item_id: TopicItemId) -> Self {
        Self {
            user_id,
            topic_id,
            topic_item_id,
        }
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.user_id, self.topic_id, self.topic_item_id
        )
    }
}

/// Completion state of one user's one topic item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    key: ProgressKey,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    #[must_use]
    pub fn from_persisted(
        key: ProgressKey,
        completed: bool,
        completed_at: Option<DateTime<Utc>>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            completed,
            completed_at,
            updated_at,
        }
    }

    /// Merge a completion write into the existing record, if any.
    ///
    /// Marking an already-completed item complete keeps its original
    /// completion time. Marking an item incomplete clears it.
    #[must_use]
    pub fn merge(
        existing: Option<&ProgressRecord>,
        key: ProgressKey,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Self {
        let completed_at = match (completed, existing) {
            (false, _) => None,
            (true, Some(prev)) if prev.completed && prev.completed_at.is_some() => {
                prev.completed_at
            }
            (true, _) => Some(now),
        };
        Self {
            key,
            completed,
            completed_at,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn key(&self) -> ProgressKey {
        self.key
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// UTC calendar date of completion; `None` unless completed with a timestamp.
    #[must_use]
    pub fn completed_on(&self) -> Option<NaiveDate> {
        if !self.completed {
            return None;
        }
        self.completed_at.map(|at| at.date_naive())
    }
}

/// Per-user, per-day completion summary. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub user_id: UserId,
    pub user_name: String,
    pub total_topics: u32,
    pub completed_topics: u32,
    pub completion_percentage: u8,
}

impl DailyProgress {
    /// Build a summary, or `None` when the user has nothing assigned.
    ///
    /// `completed` is capped at `total` so the percentage stays in 0..=100.
    #[must_use]
    pub fn new(
        date: NaiveDate,
        user_id: UserId,
        user_name: impl Into<String>,
        total: u32,
        completed: u32,
    ) -> Option<Self> {
        let completed = completed.min(total);
        let pct = ratio::percentage(u64::from(completed), u64::from(total))?;
        Some(Self {
            date,
            user_id,
            user_name: user_name.into(),
            total_topics: total,
            completed_topics: completed,
            completion_percentage: u8::try_from(pct).unwrap_or(100),
        })
    }
}
