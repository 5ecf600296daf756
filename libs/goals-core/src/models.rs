//! Data models for goals and sub-goals

use crate::error::GoalsError;
use crate::mappers;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Unit of a relative deadline such as "3 weeks"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeUnit {
    #[serde(rename = "days")]
    Days,
    #[serde(rename = "weeks")]
    Weeks,
    #[serde(rename = "months")]
    Months,
    #[serde(rename = "years")]
    Years,
}

impl TimeUnit {
    /// All units, smallest first
    pub const ALL: [TimeUnit; 4] = [Self::Days, Self::Weeks, Self::Months, Self::Years];

    /// Stored (and displayed) name of the unit
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Days => "days",
            Self::Weeks => "weeks",
            Self::Months => "months",
            Self::Years => "years",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = GoalsError;

    /// Accepts plural or singular names, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "days" => Ok(Self::Days),
            "week" | "weeks" => Ok(Self::Weeks),
            "month" | "months" => Ok(Self::Months),
            "year" | "years" => Ok(Self::Years),
            _ => Err(GoalsError::InvalidTimeUnit {
                value: s.to_string(),
            }),
        }
    }
}

/// A relative time specification: a unit paired with a positive amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSpec {
    pub unit: TimeUnit,
    pub amount: u32,
}

impl TimeSpec {
    /// Create a time specification; a zero amount yields `None`
    #[must_use]
    pub fn new(unit: TimeUnit, amount: u32) -> Option<Self> {
        (amount > 0).then_some(Self { unit, amount })
    }

    /// Pair an optional unit with an optional amount
    #[must_use]
    pub fn from_parts(unit: Option<TimeUnit>, amount: Option<u32>) -> Option<Self> {
        Self::new(unit?, amount?)
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.unit)
    }
}

impl FromStr for TimeSpec {
    type Err = GoalsError;

    /// Parse text such as `"3 weeks"` or `"1 month"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(amount), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(GoalsError::validation(format!(
                "Expected '<amount> <unit>', got '{s}'"
            )));
        };

        let unit = unit.parse::<TimeUnit>()?;
        amount
            .parse::<u32>()
            .ok()
            .and_then(|amount| Self::new(unit, amount))
            .ok_or_else(|| GoalsError::InvalidTimeAmount {
                value: amount.to_string(),
            })
    }
}

/// Checklist-style child label of a goal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubGoal {
    pub id: i64,
    pub title: String,
}

impl SubGoal {
    #[must_use]
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

/// Main goal entity, persisted as one element of the goal collection
///
/// Deserialization is lenient: malformed optional fields degrade to their
/// absent value instead of rejecting the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    /// Unique identifier (creation time in milliseconds)
    #[serde(deserialize_with = "mappers::deserialize_id")]
    pub id: i64,
    /// Goal title
    #[serde(default, deserialize_with = "mappers::deserialize_text")]
    pub title: String,
    /// Goal description
    #[serde(default, deserialize_with = "mappers::deserialize_text")]
    pub description: String,
    /// Absolute deadline
    #[serde(default, deserialize_with = "mappers::deserialize_timestamp")]
    pub deadline: Option<DateTime<Utc>>,
    /// Unit of the relative specification the deadline was derived from
    #[serde(default, deserialize_with = "mappers::deserialize_time_unit")]
    pub time_unit: Option<TimeUnit>,
    /// Amount of the relative specification the deadline was derived from
    #[serde(default, deserialize_with = "mappers::deserialize_time_amount")]
    pub time_amount: Option<u32>,
    /// Sub-goals in insertion order
    #[serde(default, deserialize_with = "mappers::deserialize_sub_goals")]
    pub sub_goals: Vec<SubGoal>,
    /// Whether the goal has been completed
    #[serde(default, deserialize_with = "mappers::deserialize_flag")]
    pub is_completed: bool,
    /// When the goal was completed
    #[serde(default, deserialize_with = "mappers::deserialize_timestamp")]
    pub completed_date: Option<DateTime<Utc>>,
}

impl Goal {
    /// Create an incomplete goal with no deadline and no sub-goals
    #[must_use]
    pub fn new(id: i64, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            deadline: None,
            time_unit: None,
            time_amount: None,
            sub_goals: Vec::new(),
            is_completed: false,
            completed_date: None,
        }
    }

    /// The stored relative specification, if both halves are present
    #[must_use]
    pub fn time_spec(&self) -> Option<TimeSpec> {
        TimeSpec::from_parts(self.time_unit, self.time_amount)
    }

    /// Whether the deadline has passed without the goal being completed
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed && self.deadline.is_some_and(|deadline| deadline < now)
    }

    /// Append a sub-goal with a fresh id; blank titles are ignored
    pub fn add_sub_goal(&mut self, title: impl Into<String>) -> Option<&SubGoal> {
        push_sub_goal(&mut self.sub_goals, title)
    }

    /// Remove a sub-goal by id, returning whether one was removed
    pub fn remove_sub_goal(&mut self, id: i64) -> bool {
        let before = self.sub_goals.len();
        self.sub_goals.retain(|s| s.id != id);
        self.sub_goals.len() != before
    }
}

/// Goal creation request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateGoalRequest {
    /// Goal title (required, validated by the caller)
    pub title: String,
    /// Goal description (required, validated by the caller)
    pub description: String,
    /// Absolute deadline, usually computed from the time specification
    pub deadline: Option<DateTime<Utc>>,
    /// Initial sub-goals
    pub sub_goals: Vec<SubGoal>,
    /// Unit of the relative specification
    pub time_unit: Option<TimeUnit>,
    /// Amount of the relative specification
    pub time_amount: Option<u32>,
}

impl CreateGoalRequest {
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<DateTime<Utc>>) -> Self {
        self.deadline = deadline;
        self
    }

    #[must_use]
    pub fn with_time_spec(mut self, spec: Option<TimeSpec>) -> Self {
        self.time_unit = spec.map(|s| s.unit);
        self.time_amount = spec.map(|s| s.amount);
        self
    }

    #[must_use]
    pub fn with_sub_goals(mut self, sub_goals: Vec<SubGoal>) -> Self {
        self.sub_goals = sub_goals;
        self
    }

    /// Append a sub-goal with a fresh id; blank titles are ignored
    #[must_use]
    pub fn with_sub_goal(mut self, title: impl Into<String>) -> Self {
        push_sub_goal(&mut self.sub_goals, title);
        self
    }
}

/// Goal update request; replaces every editable field of the record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateGoalRequest {
    /// New title
    pub title: String,
    /// New description
    pub description: String,
    /// New deadline (`None` clears it)
    pub deadline: Option<DateTime<Utc>>,
    /// New sub-goals
    pub sub_goals: Vec<SubGoal>,
    /// New time unit
    pub time_unit: Option<TimeUnit>,
    /// New time amount
    pub time_amount: Option<u32>,
    /// `Some(true)` completes, `Some(false)` clears completion, `None` leaves it alone
    pub is_completed: Option<bool>,
}

impl From<&Goal> for UpdateGoalRequest {
    fn from(goal: &Goal) -> Self {
        Self {
            title: goal.title.clone(),
            description: goal.description.clone(),
            deadline: goal.deadline,
            sub_goals: goal.sub_goals.clone(),
            time_unit: goal.time_unit,
            time_amount: goal.time_amount,
            is_completed: None,
        }
    }
}

fn push_sub_goal(sub_goals: &mut Vec<SubGoal>, title: impl Into<String>) -> Option<&SubGoal> {
    let title = title.into();
    let title = title.trim();
    if title.is_empty() {
        return None;
    }

    let id = next_id(
        Utc::now().timestamp_millis(),
        sub_goals.iter().map(|s| s.id),
    );
    sub_goals.push(SubGoal::new(id, title));
    sub_goals.last()
}

/// Pick an id from a millisecond timestamp, bumped past any existing id it would collide with
///
/// When the largest existing id is `i64::MAX`, the first free id counting
/// down from the candidate is used instead.
pub(crate) fn next_id(candidate: i64, existing: impl Iterator<Item = i64>) -> i64 {
    let taken: BTreeSet<i64> = existing.collect();
    match taken.last() {
        Some(&max) if candidate <= max => max
            .checked_add(1)
            .unwrap_or_else(|| first_free_below(candidate, &taken)),
        _ => candidate,
    }
}

fn first_free_below(start: i64, taken: &BTreeSet<i64>) -> i64 {
    let mut id = start;
    while taken.contains(&id) {
        id = id.wrapping_sub(1);
    }
    id
}
