use study_core::calendar::{CalendarGrid, YearMonth, build_calendar_grid};
use study_core::model::UserId;

use crate::Clock;
use crate::error::ReportError;
use crate::progress_service::ProgressService;

/// Builds the month calendar shown on the dashboards.
#[derive(Clone)]
pub struct CalendarService {
    clock: Clock,
    progress: ProgressService,
}

impl CalendarService {
    #[must_use]
    pub fn new(clock: Clock, progress: ProgressService) -> Self {
        Self { clock, progress }
    }

    /// Sunday-first grid for a zero-based month with per-day completion bands.
    ///
    /// With `user_id` set only that user's progress colors the cells; otherwise
    /// each day shows the rounded mean across users.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidInput` for an out-of-range month and
    /// `ReportError::Storage` when progress cannot be read.
    pub async fn month_grid(
        &self,
        year: i32,
        month: i32,
        user_id: Option<UserId>,
    ) -> Result<CalendarGrid, ReportError> {
        let ym = YearMonth::new(year, month)?;
        let progress = match user_id {
            Some(id) => {
                self.progress
                    .compute_user_month_progress(id, year, month)
                    .await?
            }
            None => self.progress.compute_month_progress(year, month).await?,
        };
        Ok(build_calendar_grid(ym, &progress).with_today(self.clock.today()))
    }

    /// `YYYY-MM-DD` key for a clicked day.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidInput` when the month or day is out of range.
    pub fn select_day(&self, year: i32, month: i32, day: u32) -> Result<String, ReportError> {
        Ok(YearMonth::new(year, month)?.day_key(day)?)
    }
}
