//! Todo aggregate.
//!
//! # Responsibility
//! - Own one task item together with its lifecycle transitions.
//! - Route every mutation through a single validated patch operation.
//!
//! # Invariants
//! - `id` is generated at creation and never reassigned.
//! - `owner_id` is set once and never changes.
//! - `completed_at` is `Some` iff `completed` is true.
//! - `updated_at` is re-stamped by every successful mutation.

use super::{now_utc, storage_precision};
use super::user::UserId;
use super::values::{Description, Title, ValidationError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Stable identifier of one todo item.
pub type TodoId = Uuid;

/// Tri-state field patch: leave unchanged, clear, or replace.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    /// Converts the carried value, keeping `Keep`/`Clear` untouched.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Patch<U>, E> {
        match self {
            Self::Keep => Ok(Patch::Keep),
            Self::Clear => Ok(Patch::Clear),
            Self::Set(value) => f(value).map(Patch::Set),
        }
    }

    /// Converts the carried value infallibly.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Self::Keep => Patch::Keep,
            Self::Clear => Patch::Clear,
            Self::Set(value) => Patch::Set(f(value)),
        }
    }

    fn apply_to(self, slot: &mut Option<T>) {
        match self {
            Self::Keep => {}
            Self::Clear => *slot = None,
            Self::Set(value) => *slot = Some(value),
        }
    }
}

/// Raw partial update. `None`/`Patch::Keep` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoUpdate {
    pub title: Option<String>,
    pub description: Patch<String>,
    pub due_date: Patch<DateTime<Utc>>,
    pub completed: Option<bool>,
}

impl TodoUpdate {
    /// Returns whether this update touches no field at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description == Patch::Keep
            && self.due_date == Patch::Keep
            && self.completed.is_none()
    }
}

/// Storage-shaped fields used to rebuild a persisted todo.
#[derive(Debug, Clone)]
pub struct TodoParts {
    pub id: TodoId,
    pub owner_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One task item owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Todo {
    id: TodoId,
    owner_id: UserId,
    title: Title,
    description: Option<Description>,
    completed: bool,
    due_date: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Todo {
    /// Creates a new open todo with a generated ID.
    ///
    /// # Errors
    /// - `ValidationError` when `title` or `description` is out of range;
    ///   nothing is constructed in that case.
    pub fn new(
        owner_id: UserId,
        title: impl Into<String>,
        description: Option<String>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        let title = Title::new(title)?;
        let description = description.map(Description::new).transpose()?;
        Self::with_id(Uuid::new_v4(), owner_id, title, description, due_date)
    }

    /// Creates a new open todo under a caller-provided ID.
    ///
    /// `due_date` is kept at millisecond precision.
    ///
    /// # Errors
    /// - `ValidationError` when `id` or `owner_id` is nil.
    pub fn with_id(
        id: TodoId,
        owner_id: UserId,
        title: Title,
        description: Option<Description>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        ensure_not_nil("id", id)?;
        ensure_not_nil("owner_id", owner_id)?;
        let now = now_utc();
        Ok(Self {
            id,
            owner_id,
            title,
            description,
            completed: false,
            due_date: due_date.map(storage_precision),
            completed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a persisted todo, re-checking every invariant.
    pub fn rehydrate(parts: TodoParts) -> Result<Self, ValidationError> {
        ensure_not_nil("id", parts.id)?;
        ensure_not_nil("owner_id", parts.owner_id)?;
        if parts.completed != parts.completed_at.is_some() {
            return Err(ValidationError::Malformed {
                field: "completed_at",
                reason: "must be set iff completed is true".to_string(),
            });
        }

        Ok(Self {
            id: parts.id,
            owner_id: parts.owner_id,
            title: Title::new(parts.title)?,
            description: parts.description.map(Description::new).transpose()?,
            completed: parts.completed,
            due_date: parts.due_date,
            completed_at: parts.completed_at,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
        })
    }

    /// Builds a fresh open copy of this todo under `new_id` and `title`.
    ///
    /// The description is carried over; completion state and due date are
    /// reset and timestamps are fresh.
    pub fn duplicate(&self, new_id: TodoId, title: Title) -> Result<Self, ValidationError> {
        Self::with_id(new_id, self.owner_id, title, self.description.clone(), None)
    }

    /// Applies a partial update.
    ///
    /// Every supplied field is validated before anything changes, so a
    /// failed update leaves the todo untouched.
    ///
    /// # Contract
    /// - `completed` false -> true stamps `completed_at = now`.
    /// - `completed` true -> false clears `completed_at`.
    /// - Re-asserting the current `completed` value keeps `completed_at`.
    pub fn apply_update(&mut self, update: TodoUpdate) -> Result<(), ValidationError> {
        let title = update.title.map(Title::new).transpose()?;
        let description = update.description.try_map(Description::new)?;

        let now = now_utc();
        if let Some(title) = title {
            self.title = title;
        }
        description.apply_to(&mut self.description);
        update
            .due_date
            .map(storage_precision)
            .apply_to(&mut self.due_date);
        if let Some(completed) = update.completed {
            if completed && !self.completed {
                self.completed_at = Some(now);
            } else if !completed {
                self.completed_at = None;
            }
            self.completed = completed;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn id(&self) -> TodoId {
        self.id
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn title(&self) -> &Title {
        &self.title
    }

    pub fn description(&self) -> Option<&Description> {
        self.description.as_ref()
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn ensure_not_nil(field: &'static str, id: Uuid) -> Result<(), ValidationError> {
    if id.is_nil() {
        return Err(ValidationError::Malformed {
            field,
            reason: "must not be nil".to_string(),
        });
    }
    Ok(())
}
