//! Read-only statistics over the goal collection
//!
//! "Completed" always means the explicit `is_completed` flag. Counting goals
//! whose deadline has passed is a different policy and is deliberately not
//! offered here.

use crate::models::Goal;
use chrono::{Datelike, Days, Local, NaiveDate, TimeZone};
use goals_common::round_to;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Completed-goal counts keyed by the Sunday that starts each week
pub type WeekBuckets = BTreeMap<NaiveDate, usize>;

/// Total and completed goal counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalSummary {
    pub total: usize,
    pub completed: usize,
}

impl GoalSummary {
    /// Fraction of goals completed, `0.0` for an empty collection
    #[must_use]
    pub fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.completed as f64 / self.total as f64
        }
    }

    /// Completion rate as a percentage rounded to 2 decimal places
    #[must_use]
    pub fn percentage(&self) -> f64 {
        round_to(self.completion_rate() * 100.0, 2)
    }
}

/// One week compared with the week bucket before it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekComparison {
    /// First day (Sunday) of the week
    pub week: NaiveDate,
    /// Goals completed in this week
    pub current: usize,
    /// Goals completed in the preceding bucket
    pub previous: usize,
    /// Percent change from `previous` to `current`, 2 decimal places
    pub percent_difference: f64,
}

/// Everything the stats view shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub summary: GoalSummary,
    pub weeks: Vec<WeekComparison>,
}

/// Count all goals and the completed ones
#[must_use]
pub fn summarize(goals: &[Goal]) -> GoalSummary {
    GoalSummary {
        total: goals.len(),
        completed: goals.iter().filter(|g| g.is_completed).count(),
    }
}

/// First day (Sunday) of the calendar week containing `date`
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_sunday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

/// Group completed goals into local-time calendar weeks
#[must_use]
pub fn group_completed_by_week(goals: &[Goal]) -> WeekBuckets {
    group_completed_by_week_in(goals, &Local)
}

/// Group completed goals into calendar weeks of the given time zone
#[must_use]
pub fn group_completed_by_week_in<Tz: TimeZone>(goals: &[Goal], tz: &Tz) -> WeekBuckets {
    let mut buckets = WeekBuckets::new();
    for goal in goals {
        let Some(completed) = goal.completed_date else {
            if goal.is_completed {
                debug!(goal_id = goal.id, "Skipping completed goal without a completion date");
            }
            continue;
        };

        let local_date = completed.with_timezone(tz).date_naive();
        *buckets.entry(week_start(local_date)).or_insert(0) += 1;
    }
    buckets
}

/// Compare each week bucket with the one before it, oldest first
///
/// The earliest bucket has nothing to compare against and produces no row.
#[must_use]
pub fn compare_weeks(buckets: &WeekBuckets) -> Vec<WeekComparison> {
    buckets
        .iter()
        .zip(buckets.iter().skip(1))
        .map(|((_, &previous), (&week, &current))| WeekComparison {
            week,
            current,
            previous,
            percent_difference: percent_difference(current, previous),
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn percent_difference(current: usize, previous: usize) -> f64 {
    let base = previous.max(1) as f64;
    round_to((current as f64 - previous as f64) / base * 100.0, 2)
}

/// Summary plus week-over-week comparisons in local time
#[must_use]
pub fn build_report(goals: &[Goal]) -> StatsReport {
    StatsReport {
        summary: summarize(goals),
        weeks: compare_weeks(&group_completed_by_week(goals)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::GoalBuilder;
    use chrono::{DateTime, FixedOffset, Utc, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_summarize_counts_flag() {
        let goals = vec![
            GoalBuilder::new("a").completed_at(at(2024, 1, 1, 8)).build(),
            GoalBuilder::new("b").build(),
            GoalBuilder::new("c").completed_at(at(2024, 1, 2, 8)).build(),
        ];
        assert_eq!(summarize(&goals), GoalSummary { total: 3, completed: 2 });
    }

    #[test]
    fn test_summarize_ignores_past_deadlines() {
        let goals = vec![GoalBuilder::new("late").deadline(at(2000, 1, 1, 0)).build()];
        assert_eq!(summarize(&goals), GoalSummary { total: 1, completed: 0 });
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[]);
        assert_eq!(summary, GoalSummary { total: 0, completed: 0 });
        assert!((summary.completion_rate() - 0.0).abs() < f64::EPSILON);
        assert!((summary.percentage() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percentage_rounds() {
        let summary = GoalSummary { total: 3, completed: 1 };
        assert!((summary.percentage() - 33.33).abs() < 1e-9);
    }

    #[test]
    fn test_week_start_is_sunday() {
        // 2024-01-17 is a Wednesday
        assert_eq!(week_start(date(2024, 1, 17)), date(2024, 1, 14));
        assert_eq!(week_start(date(2024, 1, 14)), date(2024, 1, 14));
        assert_eq!(week_start(date(2024, 1, 20)), date(2024, 1, 14));
        assert_eq!(week_start(date(2024, 1, 21)), date(2024, 1, 21));
        assert_eq!(week_start(date(2024, 1, 17)).weekday(), Weekday::Sun);
    }

    #[test]
    fn test_week_start_crosses_year() {
        // 2025-01-01 is a Wednesday
        assert_eq!(week_start(date(2025, 1, 1)), date(2024, 12, 29));
    }

    #[test]
    fn test_group_same_week() {
        let goals = vec![
            GoalBuilder::new("a").completed_at(at(2024, 1, 15, 9)).build(),
            GoalBuilder::new("b").completed_at(at(2024, 1, 19, 18)).build(),
        ];
        let buckets = group_completed_by_week_in(&goals, &Utc);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets.get(&date(2024, 1, 14)), Some(&2));
    }

    #[test]
    fn test_group_uses_given_time_zone() {
        // Saturday 23:30 UTC is already Sunday in UTC+2, which starts a new week
        let goals = vec![GoalBuilder::new("a")
            .completed_at(Utc.with_ymd_and_hms(2024, 1, 20, 23, 30, 0).unwrap())
            .build()];

        let utc_buckets = group_completed_by_week_in(&goals, &Utc);
        assert_eq!(utc_buckets.keys().next(), Some(&date(2024, 1, 14)));

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let shifted = group_completed_by_week_in(&goals, &plus_two);
        assert_eq!(shifted.keys().next(), Some(&date(2024, 1, 21)));
    }

    #[test]
    fn test_group_skips_missing_completion_date() {
        let mut flagged_only = GoalBuilder::new("flag").build();
        flagged_only.is_completed = true;
        let goals = vec![flagged_only, GoalBuilder::new("open").build()];

        assert!(group_completed_by_week_in(&goals, &Utc).is_empty());
    }

    #[test]
    fn test_group_empty() {
        assert!(group_completed_by_week(&[]).is_empty());
    }

    #[test]
    fn test_compare_weeks_example() {
        let buckets: WeekBuckets = [
            (date(2024, 1, 7), 2),
            (date(2024, 1, 14), 4),
            (date(2024, 1, 21), 2),
        ]
        .into_iter()
        .collect();

        let rows = compare_weeks(&buckets);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].week, date(2024, 1, 14));
        assert_eq!((rows[0].current, rows[0].previous), (4, 2));
        assert!((rows[0].percent_difference - 100.0).abs() < f64::EPSILON);

        assert_eq!(rows[1].week, date(2024, 1, 21));
        assert_eq!((rows[1].current, rows[1].previous), (2, 4));
        assert!((rows[1].percent_difference + 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_compare_weeks_rounds_to_two_places() {
        let buckets: WeekBuckets = [(date(2024, 1, 7), 3), (date(2024, 1, 14), 4)]
            .into_iter()
            .collect();
        let rows = compare_weeks(&buckets);
        assert!((rows[0].percent_difference - 33.33).abs() < 1e-9);
    }

    #[test]
    fn test_compare_weeks_single_and_empty() {
        assert!(compare_weeks(&WeekBuckets::new()).is_empty());

        let single: WeekBuckets = [(date(2024, 1, 7), 5)].into_iter().collect();
        assert!(compare_weeks(&single).is_empty());
    }

    #[test]
    fn test_percent_difference_zero_previous() {
        assert!((percent_difference(3, 0) - 300.0).abs() < f64::EPSILON);
        assert!((percent_difference(0, 0) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_build_report_empty() {
        let report = build_report(&[]);
        assert_eq!(report.summary, GoalSummary::default());
        assert!(report.weeks.is_empty());
    }
}
