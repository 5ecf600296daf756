//! Goals Core - persistence, deadlines and completion statistics for personal goals
//!
//! This library stores a collection of goals in a string-valued key-value
//! namespace, derives absolute deadlines from relative time specifications,
//! and aggregates completion counts into week-over-week trends.
//!
//! # Features
//!
//! - **Goal Store**: CRUD over a single JSON document with lenient decoding
//!   of malformed records
//! - **Deadlines**: calendar-aware day/week/month/year arithmetic
//! - **Statistics**: completion rate and Sunday-aligned weekly comparisons
//! - **Pluggable Storage**: file-backed and in-memory key-value backends
//!
//! # Quick Start
//!
//! ```no_run
//! use goals_core::{
//!     build_report, calculate_deadline, CreateGoalRequest, GoalStore, GoalsConfig, GoalsError,
//!     TimeUnit,
//! };
//!
//! # async fn example() -> Result<(), GoalsError> {
//! let config = GoalsConfig::with_default_path();
//! let store = GoalStore::from_config(&config);
//!
//! let deadline = calculate_deadline(chrono::Utc::now(), Some(TimeUnit::Weeks), Some(3));
//! let goal = store
//!     .try_create(CreateGoalRequest::new("Run a 5k", "Three runs a week").with_deadline(deadline))
//!     .await?;
//! store.try_mark_completed(goal.id).await?;
//!
//! let report = build_report(&store.try_list_all().await?);
//! println!("{}% complete", report.summary.percentage());
//! # Ok(())
//! # }
//! ```
//!
//! # Crate Features
//!
//! - `test-utils`: Enable test utilities (for testing only)

pub mod config;
pub mod config_loader;
pub mod deadline;
pub mod error;
pub mod mappers;
pub mod models;
pub mod stats;
pub mod storage;
pub mod store;
pub mod validators;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ConfigOverrides, GoalsConfig};
pub use config_loader::{load_config, ConfigLoader};
pub use deadline::{apply_time_spec, calculate_deadline, infer_time_spec};
pub use error::{GoalsError, Result};
pub use models::*;
pub use stats::{
    build_report, compare_weeks, group_completed_by_week, group_completed_by_week_in, summarize,
    week_start, GoalSummary, StatsReport, WeekBuckets, WeekComparison,
};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use store::{FileGoalStore, GoalStore};
pub use validators::{parse_time_spec_input, validate_goal_exists, validate_goal_input};

/// Re-export commonly used types
pub use chrono::{DateTime, NaiveDate, Utc};
