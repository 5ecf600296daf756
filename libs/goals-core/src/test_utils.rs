//! Test utilities for building goals and seeding stores

use crate::models::{Goal, SubGoal, TimeSpec};
use crate::storage::MemoryKeyValueStore;
use chrono::{DateTime, Utc};
use goals_common::GOALS_KEY;
use std::sync::atomic::{AtomicI64, Ordering};

static NEXT_TEST_ID: AtomicI64 = AtomicI64::new(1);

/// Builder for goals with sensible test defaults
#[derive(Debug, Clone)]
pub struct GoalBuilder {
    goal: Goal,
}

impl GoalBuilder {
    /// Start a goal with a unique id and a placeholder description
    #[must_use]
    pub fn new(title: &str) -> Self {
        let id = NEXT_TEST_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            goal: Goal::new(id, title, format!("{title} description")),
        }
    }

    #[must_use]
    pub fn id(mut self, id: i64) -> Self {
        self.goal.id = id;
        self
    }

    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.goal.description = description.to_string();
        self
    }

    #[must_use]
    pub fn deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.goal.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn time_spec(mut self, spec: TimeSpec) -> Self {
        self.goal.time_unit = Some(spec.unit);
        self.goal.time_amount = Some(spec.amount);
        self
    }

    #[must_use]
    pub fn sub_goal(mut self, id: i64, title: &str) -> Self {
        self.goal.sub_goals.push(SubGoal::new(id, title));
        self
    }

    /// Mark the goal completed at the given instant
    #[must_use]
    pub fn completed_at(mut self, completed: DateTime<Utc>) -> Self {
        self.goal.is_completed = true;
        self.goal.completed_date = Some(completed);
        self
    }

    #[must_use]
    pub fn build(self) -> Goal {
        self.goal
    }
}

/// In-memory store whose goal collection is the given raw JSON text
#[must_use]
pub fn store_with_raw_goals(raw: &str) -> MemoryKeyValueStore {
    MemoryKeyValueStore::with_value(GOALS_KEY, raw)
}

/// In-memory store seeded with the given goals
///
/// # Panics
/// Panics if the goals cannot be serialized
#[must_use]
pub fn store_with_goals(goals: &[Goal]) -> MemoryKeyValueStore {
    let raw = serde_json::to_string(goals).expect("test goals serialize");
    store_with_raw_goals(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeUnit;

    #[test]
    fn test_builder_assigns_unique_ids() {
        let a = GoalBuilder::new("a").build();
        let b = GoalBuilder::new("b").build();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_builder_sets_fields() {
        let goal = GoalBuilder::new("Run")
            .id(7)
            .description("5k")
            .time_spec(TimeSpec::new(TimeUnit::Weeks, 3).unwrap())
            .sub_goal(1, "Buy shoes")
            .build();

        assert_eq!(goal.id, 7);
        assert_eq!(goal.description, "5k");
        assert_eq!(goal.time_unit, Some(TimeUnit::Weeks));
        assert_eq!(goal.sub_goals.len(), 1);
        assert!(!goal.is_completed);
    }

    #[test]
    fn test_store_with_goals() {
        let store = store_with_goals(&[GoalBuilder::new("a").id(3).build()]);
        let raw = store.snapshot(GOALS_KEY).unwrap();
        assert!(raw.contains("\"id\":3"));
    }
}
