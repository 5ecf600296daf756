//! Field mapping utilities for converting stored JSON into domain models
//!
//! Stored collections may have been written by older revisions of the app
//! (empty strings for absent units, amounts as text, timestamps as epoch
//! milliseconds). These helpers normalise every such variant to a single
//! representation so business logic only ever sees `Option::None` for
//! "absent".

use crate::models::{SubGoal, TimeUnit};
use chrono::{DateTime, NaiveDateTime, Utc};
use goals_common::{parse_date, DATETIME_FORMATS};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

/// Parse an id from a JSON number or numeric string
pub fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| {
                    #[allow(clippy::cast_possible_truncation)]
                    let id = f as i64;
                    id
                })
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse a timestamp from an RFC 3339 string, a naive date/datetime string,
/// or epoch milliseconds
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => {
            let parsed = parse_timestamp_str(s.trim());
            if parsed.is_none() {
                warn!(value = %s, "Ignoring unparseable timestamp");
            }
            parsed
        }
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        other => {
            warn!(value = %other, "Ignoring timestamp of unexpected type");
            None
        }
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| parse_date(s).ok().and_then(|date| date.and_hms_opt(0, 0, 0)))
        .map(|naive| naive.and_utc())
}

/// Parse a positive time amount; anything else degrades to `None`
pub fn parse_time_amount(value: &Value) -> Option<u32> {
    let amount = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f > 0.0 && *f <= f64::from(u32::MAX))
                .map(|f| {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let amount = f as u64;
                    amount
                })
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    let amount = amount.and_then(|a| u32::try_from(a).ok()).filter(|a| *a > 0);
    if amount.is_none() && !value.is_null() {
        debug!(value = %value, "Normalising invalid time amount to absent");
    }
    amount
}

/// Parse a text field; `null` reads as empty and scalars read as their text
///
/// Objects and arrays are rejected.
pub fn parse_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => Some(String::new()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Parse a time unit; empty strings and unknown names become `None`
pub fn parse_time_unit(value: &Value) -> Option<TimeUnit> {
    match value {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => match s.parse() {
            Ok(unit) => Some(unit),
            Err(e) => {
                debug!("Normalising time unit to absent: {}", e);
                None
            }
        },
        _ => None,
    }
}

/// Parse the sub-goal list; anything that is not an array becomes empty
///
/// Elements without a usable title are dropped. Elements with a title but no
/// usable id fall back to their position in the list.
pub fn parse_sub_goals(value: &Value) -> Vec<SubGoal> {
    let Value::Array(items) = value else {
        if !value.is_null() {
            warn!(value = %value, "Sub-goals are not a list, treating as empty");
        }
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let title = item.get("title").and_then(Value::as_str)?.trim();
            if title.is_empty() {
                return None;
            }
            let id = item
                .get("id")
                .and_then(parse_id)
                .unwrap_or_else(|| i64::try_from(index).unwrap_or_default());
            Some(SubGoal::new(id, title))
        })
        .collect()
}

pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse_id(&value).ok_or_else(|| D::Error::custom(format!("invalid goal id: {value}")))
}

pub(crate) fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse_text(&value).ok_or_else(|| D::Error::custom(format!("invalid text field: {value}")))
}

pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|v| parse_timestamp(&v))
}

pub(crate) fn deserialize_time_amount<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|v| parse_time_amount(&v))
}

pub(crate) fn deserialize_time_unit<'de, D>(deserializer: D) -> Result<Option<TimeUnit>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|v| parse_time_unit(&v))
}

pub(crate) fn deserialize_sub_goals<'de, D>(deserializer: D) -> Result<Vec<SubGoal>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|v| parse_sub_goals(&v))
}

pub(crate) fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|v| v.as_bool().unwrap_or(false))
}
