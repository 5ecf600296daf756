//! Input validation ahead of store operations
//!
//! The store itself accepts whatever it is given; these checks run at the
//! input boundary so rejected input never reaches storage.

use crate::error::{GoalsError, Result};
use crate::models::{TimeSpec, TimeUnit};
use crate::storage::KeyValueStore;
use crate::store::GoalStore;
use tracing::instrument;

/// Require a non-blank title and description
///
/// # Errors
/// Returns `GoalsError::Validation` naming the first blank field
pub fn validate_goal_input(title: &str, description: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(GoalsError::validation("Title is required"));
    }
    if description.trim().is_empty() {
        return Err(GoalsError::validation("Description is required"));
    }
    Ok(())
}

/// Parse an optional unit/amount pair as typed by a user
///
/// Both halves absent means no specification. A lone half is rejected, as
/// is an amount that is not a positive whole number.
///
/// # Errors
/// Returns `GoalsError::InvalidTimeUnit`, `GoalsError::InvalidTimeAmount` or
/// `GoalsError::Validation` for unusable input
pub fn parse_time_spec_input(unit: Option<&str>, amount: Option<&str>) -> Result<Option<TimeSpec>> {
    let (unit, amount) = match (unit, amount) {
        (None, None) => return Ok(None),
        (Some(unit), Some(amount)) => (unit, amount),
        _ => {
            return Err(GoalsError::validation(
                "Time unit and amount must be given together",
            ))
        }
    };

    let unit: TimeUnit = unit.parse()?;
    let amount = amount
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|a| *a > 0)
        .ok_or_else(|| GoalsError::InvalidTimeAmount {
            value: amount.to_string(),
        })?;

    Ok(TimeSpec::new(unit, amount))
}

/// Require that a goal with this id is stored
///
/// # Errors
/// Returns `GoalsError::GoalNotFound` if it is absent, or the storage error
/// if the collection cannot be read
#[instrument(skip(store))]
pub async fn validate_goal_exists<S: KeyValueStore>(store: &GoalStore<S>, id: i64) -> Result<()> {
    if store.try_find_by_id(id).await?.is_none() {
        return Err(GoalsError::GoalNotFound { id });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{store_with_goals, GoalBuilder};

    #[test]
    fn test_validate_goal_input() {
        assert!(validate_goal_input("Run", "5k").is_ok());

        let err = validate_goal_input("  ", "5k").unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Title is required");

        let err = validate_goal_input("Run", "").unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Description is required");
    }

    #[test]
    fn test_parse_time_spec_input() {
        assert_eq!(parse_time_spec_input(None, None).unwrap(), None);
        assert_eq!(
            parse_time_spec_input(Some("Weeks"), Some(" 3 ")).unwrap(),
            TimeSpec::new(TimeUnit::Weeks, 3)
        );
    }

    #[test]
    fn test_parse_time_spec_input_rejects_bad_values() {
        assert!(matches!(
            parse_time_spec_input(Some("fortnights"), Some("2")),
            Err(GoalsError::InvalidTimeUnit { .. })
        ));
        for amount in ["0", "-1", "abc", "1.5"] {
            assert!(
                matches!(
                    parse_time_spec_input(Some("days"), Some(amount)),
                    Err(GoalsError::InvalidTimeAmount { .. })
                ),
                "amount {amount:?}"
            );
        }
        assert!(matches!(
            parse_time_spec_input(Some("days"), None),
            Err(GoalsError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_validate_goal_exists() {
        let store = GoalStore::new(store_with_goals(&[GoalBuilder::new("a").id(10).build()]));

        assert!(validate_goal_exists(&store, 10).await.is_ok());
        assert!(matches!(
            validate_goal_exists(&store, 11).await,
            Err(GoalsError::GoalNotFound { id: 11 })
        ));
    }
}
