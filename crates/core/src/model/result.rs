use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ResultId, TopicId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("score must be between 0 and 100, got {0}")]
    ScoreOutOfRange(u32),
}

/// Assessment score in 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    /// # Errors
    ///
    /// Returns `ResultError::ScoreOutOfRange` above 100.
    pub fn new(value: u32) -> Result<Self, ResultError> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .map(Self)
            .ok_or(ResultError::ScoreOutOfRange(value))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

/// A scored, completed assessment for a user and topic.
///
/// `user_name` and `topic_title` are snapshots taken when the result was
/// recorded; renaming a user later does not touch historical results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyResult {
    id: ResultId,
    user_id: UserId,
    user_name: String,
    topic_id: TopicId,
    topic_title: String,
    score: Score,
    completed_at: DateTime<Utc>,
    date: NaiveDate,
}

impl StudyResult {
    /// Build a result; `date` is the UTC calendar date of `completed_at`.
    #[must_use]
    pub fn new(
        id: ResultId,
        user_id: UserId,
        user_name: impl Into<String>,
        topic_id: TopicId,
        topic_title: impl Into<String>,
        score: Score,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            user_name: user_name.into(),
            topic_id,
            topic_title: topic_title.into(),
            score,
            completed_at,
            date: completed_at.date_naive(),
        }
    }

    /// Copy of this result under a different id, used when storage assigns ids.
    #[must_use]
    pub fn with_id(&self, id: ResultId) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn id(&self) -> ResultId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    #[must_use]
    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    #[must_use]
    pub fn topic_title(&self) -> &str {
        &self.topic_title
    }

    #[must_use]
    pub fn score(&self) -> Score {
        self.score
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

//
// ─── CHARTS ────────────────────────────────────────────────────────────────────
//

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Reporting window selector for score charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartPeriod {
    Day,
    Week,
    Month,
    Year,
}

impl ChartPeriod {
    /// Days subtracted from today to get the window start.
    #[must_use]
    pub fn lookback_days(self) -> i64 {
        match self {
            ChartPeriod::Day => 0,
            ChartPeriod::Week => 7,
            ChartPeriod::Month => 30,
            ChartPeriod::Year => 365,
        }
    }

    /// Window ending today (inclusive on both ends).
    #[must_use]
    pub fn window(self, today: NaiveDate) -> DateWindow {
        DateWindow {
            start: today - Duration::days(self.lookback_days()),
            end: today,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ChartPeriod::Day => "day",
            ChartPeriod::Week => "week",
            ChartPeriod::Month => "month",
            ChartPeriod::Year => "year",
        }
    }
}

impl fmt::Display for ChartPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown chart period: {0} (expected day, week, month or year)")]
pub struct ParsePeriodError(pub String);

impl FromStr for ChartPeriod {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(ChartPeriod::Day),
            "week" => Ok(ChartPeriod::Week),
            "month" => Ok(ChartPeriod::Month),
            "year" => Ok(ChartPeriod::Year),
            _ => Err(ParsePeriodError(s.to_string())),
        }
    }
}

/// Average score and number of results for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartDataPoint {
    pub date: NaiveDate,
    pub score: u8,
    pub count: u32,
}
