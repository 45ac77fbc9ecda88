//! Pure report builders over already-loaded collections.
//!
//! Services fetch records through the storage traits and hand them here, so
//! every rule can be exercised with plain fixture vectors.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;

use crate::calendar::YearMonth;
use crate::model::{
    ChartDataPoint, DailyProgress, DateWindow, ProgressRecord, StudyResult, Topic, TopicId,
    TopicItemId, UserId,
};
use crate::ratio;

/// Display name used when a topic owner has no user profile.
pub const UNKNOWN_USER_NAME: &str = "Unknown User";

type ItemRef = (TopicId, TopicItemId);

/// One `DailyProgress` per (day of `month`, user owning at least one item).
///
/// Users whose topics hold zero items in total are left out. A day counts
/// distinct items of the user's current topics completed on that UTC date;
/// records for items no longer assigned are ignored. Output is sorted by
/// date, then user id.
#[must_use]
pub fn month_progress(
    month: YearMonth,
    topics: &[Topic],
    progress: &[ProgressRecord],
    user_names: &HashMap<UserId, String>,
) -> Vec<DailyProgress> {
    let mut assigned: BTreeMap<UserId, HashSet<ItemRef>> = BTreeMap::new();
    for topic in topics {
        let items = assigned.entry(topic.user_id()).or_default();
        items.extend(topic.items().iter().map(|item| (topic.id(), item.id())));
    }
    assigned.retain(|_, items| !items.is_empty());

    let mut completed: HashMap<(UserId, NaiveDate), HashSet<ItemRef>> = HashMap::new();
    for record in progress {
        let Some(date) = record.completed_on() else {
            continue;
        };
        if !month.contains(date) {
            continue;
        }
        let key = record.key();
        let item = (key.topic_id, key.topic_item_id);
        let owned = assigned
            .get(&key.user_id)
            .is_some_and(|items| items.contains(&item));
        if owned {
            completed
                .entry((key.user_id, date))
                .or_default()
                .insert(item);
        }
    }

    let mut out = Vec::with_capacity(assigned.len() * month.days_in_month() as usize);
    for date in month.days() {
        for (user_id, items) in &assigned {
            let done = completed.get(&(*user_id, date)).map_or(0, HashSet::len);
            let name = user_names
                .get(user_id)
                .map_or(UNKNOWN_USER_NAME, String::as_str);
            if let Some(entry) = DailyProgress::new(
                date,
                *user_id,
                name,
                count_u32(items.len()),
                count_u32(done),
            ) {
                out.push(entry);
            }
        }
    }
    out
}

/// Sparse per-date score series: only dates with at least one result appear.
#[must_use]
pub fn chart_series(
    results: &[StudyResult],
    window: DateWindow,
    user_id: Option<UserId>,
) -> Vec<ChartDataPoint> {
    let mut groups: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();
    for result in results {
        if !window.contains(result.date()) {
            continue;
        }
        if user_id.is_some_and(|id| id != result.user_id()) {
            continue;
        }
        let (sum, count) = groups.entry(result.date()).or_default();
        *sum += u64::from(result.score().value());
        *count += 1;
    }

    groups
        .into_iter()
        .filter_map(|(date, (sum, count))| {
            let score = ratio::round_div(sum, count)?;
            Some(ChartDataPoint {
                date,
                score: u8::try_from(score).unwrap_or(100),
                count: u32::try_from(count).unwrap_or(u32::MAX),
            })
        })
        .collect()
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ChartPeriod, ProgressKey, ResultId, Score, TopicItemDraft,
    };
    use chrono::{DateTime, Duration, Utc};

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    fn topic(id: u64, user: u64, items: usize) -> Topic {
        let drafts = (0..items)
            .map(|i| TopicItemDraft::new(format!("Item {i}"), format!("https://example.com/{i}")))
            .collect();
        Topic::new(TopicId::new(id), UserId::new(user), drafts, at("2025-01-01T00:00:00Z"))
            .unwrap()
    }

    fn done(user: u64, topic: u64, item: u64, when: &str) -> ProgressRecord {
        ProgressRecord::from_persisted(
            ProgressKey::new(UserId::new(user), TopicId::new(topic), TopicItemId::new(item)),
            true,
            Some(at(when)),
            at(when),
        )
    }

    fn june() -> YearMonth {
        YearMonth::new(2025, 5).unwrap()
    }

    #[test]
    fn half_complete_day() {
        let topics = vec![topic(1, 7, 6), topic(2, 7, 4)];
        let progress: Vec<_> = (1..=5)
            .map(|i| done(7, 1, i, "2025-06-15T09:00:00Z"))
            .collect();
        let names = HashMap::from([(UserId::new(7), "Ana".to_string())]);

        let out = month_progress(june(), &topics, &progress, &names);
        assert_eq!(out.len(), 30);

        let day = out
            .iter()
            .find(|p| p.date.to_string() == "2025-06-15")
            .unwrap();
        assert_eq!(day.user_id, UserId::new(7));
        assert_eq!(day.user_name, "Ana");
        assert_eq!(day.total_topics, 10);
        assert_eq!(day.completed_topics, 5);
        assert_eq!(day.completion_percentage, 50);

        let other = out
            .iter()
            .find(|p| p.date.to_string() == "2025-06-14")
            .unwrap();
        assert_eq!(other.completed_topics, 0);
        assert_eq!(other.completion_percentage, 0);
    }

    #[test]
    fn users_without_items_are_excluded() {
        let topics = vec![topic(1, 1, 2), topic(2, 2, 0)];
        let out = month_progress(june(), &topics, &[], &HashMap::new());
        assert!(out.iter().all(|p| p.user_id == UserId::new(1)));
        assert!(out.iter().all(|p| p.user_name == UNKNOWN_USER_NAME));
    }

    #[test]
    fn ignores_incomplete_foreign_and_out_of_month_records() {
        let topics = vec![topic(1, 1, 2), topic(2, 2, 2)];
        let base = done(1, 1, 2, "2025-06-10T10:00:00Z");
        let undone = ProgressRecord::from_persisted(base.key(), false, None, base.updated_at());
        let progress = vec![
            done(1, 1, 1, "2025-06-10T23:59:59Z"),
            undone,
            // user 1 does not own topic 2
            done(1, 2, 1, "2025-06-10T10:00:00Z"),
            done(1, 1, 2, "2025-07-01T00:00:00Z"),
            // duplicate completion of the same item the same day
            done(1, 1, 1, "2025-06-10T11:00:00Z"),
        ];
        let out = month_progress(june(), &topics, &progress, &HashMap::new());
        let tenth = out
            .iter()
            .find(|p| p.user_id == UserId::new(1) && p.date.to_string() == "2025-06-10")
            .unwrap();
        assert_eq!(tenth.completed_topics, 1);
        assert_eq!(tenth.completion_percentage, 50);
    }

    #[test]
    fn percentages_stay_in_bounds() {
        let topics = vec![topic(1, 1, 3), topic(2, 2, 7)];
        let progress = vec![
            done(1, 1, 1, "2025-06-02T00:00:00Z"),
            done(1, 1, 2, "2025-06-02T00:00:00Z"),
            done(1, 1, 3, "2025-06-02T00:00:00Z"),
            done(2, 2, 4, "2025-06-03T00:00:00Z"),
        ];
        for p in month_progress(june(), &topics, &progress, &HashMap::new()) {
            assert!(p.completion_percentage <= 100);
            assert!(p.completed_topics <= p.total_topics);
        }
    }

    fn result(user: u64, score: u32, when: DateTime<Utc>) -> StudyResult {
        StudyResult::new(
            ResultId::new(0),
            UserId::new(user),
            format!("User {user}"),
            TopicId::new(1),
            "Topic",
            Score::new(score).unwrap(),
            when,
        )
    }

    #[test]
    fn weekly_series_is_sparse_and_sorted() {
        let now = at("2025-06-15T12:00:00Z");
        let results = vec![
            result(1, 80, now),
            result(2, 91, now - Duration::hours(2)),
            result(1, 70, now - Duration::days(3)),
            result(1, 100, now - Duration::days(8)),
        ];
        let window = ChartPeriod::Week.window(now.date_naive());
        let series = chart_series(&results, window, None);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date.to_string(), "2025-06-12");
        assert_eq!(series[0].score, 70);
        assert_eq!(series[0].count, 1);
        assert_eq!(series[1].date.to_string(), "2025-06-15");
        assert_eq!(series[1].score, 86);
        assert_eq!(series[1].count, 2);
    }

    #[test]
    fn window_bounds_are_inclusive_and_user_filter_applies() {
        let now = at("2025-06-15T12:00:00Z");
        let results = vec![
            result(1, 60, now - Duration::days(7)),
            result(2, 90, now - Duration::days(7)),
            result(1, 40, now),
        ];
        let window = ChartPeriod::Week.window(now.date_naive());
        let series = chart_series(&results, window, Some(UserId::new(1)));
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date.to_string(), "2025-06-08");
        assert_eq!(series[0].score, 60);
        assert_eq!(series[1].score, 40);
    }
}
