//! Boundary parsing of raw list query parameters.
//!
//! # Contract
//! - `limit`/`offset` fall back to defaults when missing or unparsable and
//!   are clamped by the repository filter.
//! - `due_from`/`due_to` are `YYYY-MM-DD` UTC days, inclusive.
//! - `owner_id`/`user_id` keys are ignored; tenant scope comes only from
//!   the authenticated user.
//! - Repeated keys: last one wins. Unknown keys are ignored.

use crate::model::values::ValidationError;
use crate::repo::todo_repo::{SortKey, SortOrder, TodoListFilter};
use chrono::{DateTime, NaiveDate, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses `(key, value)` query pairs into an owner-less list filter.
pub fn parse_list_params<I, K, V>(pairs: I) -> Result<TodoListFilter, ValidationError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut filter = TodoListFilter::default();

    for (key, value) in pairs {
        let value = value.as_ref().trim();
        match key.as_ref() {
            "limit" => filter.limit = value.parse::<i64>().ok(),
            "offset" => filter.offset = value.parse::<i64>().ok(),
            "q" => filter.query = non_empty(value),
            "title" => filter.title_contains = non_empty(value),
            "body" | "description" => filter.description_contains = non_empty(value),
            "due_from" => filter.due_from = parse_day(value, "due_from", DayBound::Start)?,
            "due_to" => filter.due_to = parse_day(value, "due_to", DayBound::End)?,
            "completed" => filter.completed = parse_completed(value)?,
            "sort" => {
                filter.sort = if value.is_empty() {
                    SortKey::default()
                } else {
                    SortKey::parse(value).ok_or_else(|| ValidationError::Malformed {
                        field: "sort",
                        reason: "expected title|created_at|updated_at|due_date".to_string(),
                    })?
                }
            }
            "order" => {
                filter.order = if value.is_empty() {
                    SortOrder::default()
                } else {
                    SortOrder::parse(value).ok_or_else(|| ValidationError::Malformed {
                        field: "order",
                        reason: "expected asc|desc".to_string(),
                    })?
                }
            }
            _ => {}
        }
    }

    if let (Some(from), Some(to)) = (filter.due_from, filter.due_to) {
        if from > to {
            return Err(ValidationError::Malformed {
                field: "due_from",
                reason: "must not be after due_to".to_string(),
            });
        }
    }

    Ok(filter)
}

#[derive(Debug, Clone, Copy)]
enum DayBound {
    Start,
    End,
}

fn parse_day(
    value: &str,
    field: &'static str,
    bound: DayBound,
) -> Result<Option<DateTime<Utc>>, ValidationError> {
    if value.is_empty() {
        return Ok(None);
    }
    let malformed = || ValidationError::Malformed {
        field,
        reason: format!("expected YYYY-MM-DD, got `{value}`"),
    };
    let day = NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| malformed())?;
    let moment = match bound {
        DayBound::Start => day.and_hms_opt(0, 0, 0),
        DayBound::End => day.and_hms_milli_opt(23, 59, 59, 999),
    }
    .ok_or_else(malformed)?;
    Ok(Some(moment.and_utc()))
}

fn parse_completed(value: &str) -> Result<Option<bool>, ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "true" | "1" => Ok(Some(true)),
        "false" | "0" => Ok(Some(false)),
        _ => Err(ValidationError::Malformed {
            field: "completed",
            reason: "expected true|false|1|0".to_string(),
        }),
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
