//! Deadline calculation from relative time specifications
//!
//! Month and year arithmetic is calendar-aware and clamps to the last day of
//! the target month when the reference day does not exist there:
//!
//! | reference    | spec       | deadline     |
//! |--------------|------------|--------------|
//! | 2024-01-31   | 1 months   | 2024-02-29   |
//! | 2023-01-31   | 1 months   | 2023-02-28   |
//! | 2024-02-29   | 1 years    | 2025-02-28   |
//!
//! Arithmetic runs on the wall-clock time of the reference, so the time of
//! day is kept across DST transitions when the reference is in a local zone.
//! A result that falls on a repeated wall-clock time resolves to the earlier
//! instant; one that falls in a skipped hour moves forward past the gap.

use crate::models::{TimeSpec, TimeUnit};
use chrono::{DateTime, Days, Months, NaiveDateTime, TimeZone};

/// Advance `reference` by `amount` of `unit`
///
/// Returns `None` if either part is missing, the amount is zero, or the
/// result would overflow the supported date range.
#[must_use]
pub fn calculate_deadline<Tz: TimeZone>(
    reference: DateTime<Tz>,
    unit: Option<TimeUnit>,
    amount: Option<u32>,
) -> Option<DateTime<Tz>> {
    let spec = TimeSpec::from_parts(unit, amount)?;
    apply_time_spec(reference, spec)
}

/// Advance `reference` by a complete time specification
#[must_use]
pub fn apply_time_spec<Tz: TimeZone>(reference: DateTime<Tz>, spec: TimeSpec) -> Option<DateTime<Tz>> {
    let amount = spec.amount;
    let local = reference.naive_local();
    let shifted = match spec.unit {
        TimeUnit::Days => local.checked_add_days(Days::new(u64::from(amount))),
        TimeUnit::Weeks => local.checked_add_days(Days::new(u64::from(amount) * 7)),
        TimeUnit::Months => local.checked_add_months(Months::new(amount)),
        TimeUnit::Years => local.checked_add_months(Months::new(amount.checked_mul(12)?)),
    }?;
    to_zone(&reference, shifted)
}

/// Map a shifted wall-clock time back into the reference's zone
fn to_zone<Tz: TimeZone>(reference: &DateTime<Tz>, shifted: NaiveDateTime) -> Option<DateTime<Tz>> {
    match reference.timezone().from_local_datetime(&shifted) {
        chrono::LocalResult::Single(dt) => Some(dt),
        chrono::LocalResult::Ambiguous(earliest, _) => Some(earliest),
        // Skipped hour: advance the instant by the same wall-clock distance
        chrono::LocalResult::None => {
            let elapsed = shifted.signed_duration_since(reference.naive_local());
            reference.clone().checked_add_signed(elapsed)
        }
    }
}

/// Re-derive a relative specification from a stored deadline
///
/// Used by edit flows for goals that have a deadline but no stored
/// unit/amount pair. The remaining time is rounded up to whole days and
/// expressed in the first unit that divides it evenly, checking weeks
/// (7 days), then months (30 days), then years (365 days), and falling back
/// to days. Deadlines that are not in the future yield `None`.
#[must_use]
pub fn infer_time_spec<Tz: TimeZone>(deadline: &DateTime<Tz>, now: &DateTime<Tz>) -> Option<TimeSpec> {
    let remaining = deadline.clone().signed_duration_since(now.clone());
    let millis = remaining.num_milliseconds();
    if millis <= 0 {
        return None;
    }

    const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;
    let days = u32::try_from((millis + DAY_MILLIS - 1) / DAY_MILLIS).ok()?;

    let (unit, amount) = if days % 7 == 0 {
        (TimeUnit::Weeks, days / 7)
    } else if days % 30 == 0 {
        (TimeUnit::Months, days / 30)
    } else if days % 365 == 0 {
        (TimeUnit::Years, days / 365)
    } else {
        (TimeUnit::Days, days)
    };
    TimeSpec::new(unit, amount)
}
