//! Todo use-case service.
//!
//! # Responsibility
//! - Validate input, scope every call to the authenticated owner and
//!   delegate persistence to a `TodoRepository`.
//! - Implement duplication (copy-suffixed title, reset lifecycle state).
//!
//! # Invariants
//! - The owner id always comes from `AuthenticatedUser`; list filters
//!   cannot widen the tenant scope.
//! - Validation runs before storage is touched.
//! - Repository `NotFound` surfaces as `TodoServiceError::NotFound`.

use crate::auth::AuthenticatedUser;
use crate::error::{ErrorKind, ServiceFailure};
use crate::model::todo::{Todo, TodoId, TodoUpdate};
use crate::model::values::{ValidationError, TITLE_MAX_CHARS};
use crate::repo::todo_repo::{TodoListFilter, TodoPage, TodoRepository};
use crate::repo::RepoError;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Appended to the source title when duplicating a todo.
pub const COPY_SUFFIX: &str = " (copy)";

/// Service error for todo use-cases.
#[derive(Debug)]
pub enum TodoServiceError {
    Validation(ValidationError),
    /// The copy title would exceed the title limit.
    CopyTitleTooLong { max: usize },
    /// Target todo does not exist or belongs to another user.
    NotFound(TodoId),
    Repo(RepoError),
}

impl Display for TodoServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::CopyTitleTooLong { max } => write!(
                f,
                "copy title would exceed {max} characters; shorten the original title"
            ),
            Self::NotFound(id) => write!(f, "todo not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TodoServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::CopyTitleTooLong { .. } | Self::NotFound(_) => None,
        }
    }
}

impl From<ValidationError> for TodoServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for TodoServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl ServiceFailure for TodoServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::CopyTitleTooLong { .. } => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Repo(RepoError::Conflict(_)) => ErrorKind::Conflict,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

pub type TodoServiceResult<T> = Result<T, TodoServiceError>;

/// Input for creating one todo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Todo service facade over repository implementations.
pub struct TodoService<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists the caller's todos. `filter.owner_id` is always overwritten.
    pub fn list(
        &self,
        user: &AuthenticatedUser,
        mut filter: TodoListFilter,
    ) -> TodoServiceResult<TodoPage> {
        filter.owner_id = user.user_id();
        let result = self.repo.list_by_filter(&filter).map_err(Into::into);
        log_outcome("todo_list", user, None, &result);
        result
    }

    /// Returns one of the caller's todos.
    pub fn detail(&self, user: &AuthenticatedUser, id: TodoId) -> TodoServiceResult<Todo> {
        let result = self.find_owned(user, id);
        log_outcome("todo_detail", user, Some(id), &result);
        result
    }

    /// Creates a todo for the caller after validating every field.
    pub fn create(&self, user: &AuthenticatedUser, input: NewTodo) -> TodoServiceResult<Todo> {
        let result = Todo::new(user.user_id(), input.title, input.description, input.due_date)
            .map_err(TodoServiceError::from)
            .and_then(|todo| self.repo.create(todo).map_err(Into::into));
        log_outcome(
            "todo_create",
            user,
            result.as_ref().ok().map(Todo::id),
            &result,
        );
        result
    }

    /// Applies a partial update to one of the caller's todos.
    pub fn update(
        &self,
        user: &AuthenticatedUser,
        id: TodoId,
        update: TodoUpdate,
    ) -> TodoServiceResult<Todo> {
        let result = self.find_owned(user, id).and_then(|mut todo| {
            todo.apply_update(update)?;
            Ok(self.repo.update(todo)?)
        });
        log_outcome("todo_update", user, Some(id), &result);
        result
    }

    /// Deletes one of the caller's todos.
    pub fn delete(&self, user: &AuthenticatedUser, id: TodoId) -> TodoServiceResult<()> {
        let result = self
            .repo
            .delete(id, user.user_id())
            .map_err(TodoServiceError::from);
        log_outcome("todo_delete", user, Some(id), &result);
        result
    }

    /// Copies one of the caller's todos under a suffixed title.
    ///
    /// # Contract
    /// - Fails with `CopyTitleTooLong` instead of truncating.
    /// - The copy is open, has no due date and keeps the description.
    pub fn duplicate(&self, user: &AuthenticatedUser, id: TodoId) -> TodoServiceResult<Todo> {
        let result = self.duplicate_inner(user, id);
        log_outcome("todo_duplicate", user, Some(id), &result);
        result
    }

    fn duplicate_inner(&self, user: &AuthenticatedUser, id: TodoId) -> TodoServiceResult<Todo> {
        let source = self.find_owned(user, id)?;
        let new_title = source
            .title()
            .with_suffix(COPY_SUFFIX)
            .map_err(|_| TodoServiceError::CopyTitleTooLong {
                max: TITLE_MAX_CHARS,
            })?;

        self.repo
            .duplicate(id, user.user_id(), Uuid::new_v4(), new_title)?
            .ok_or(TodoServiceError::NotFound(id))
    }

    fn find_owned(&self, user: &AuthenticatedUser, id: TodoId) -> TodoServiceResult<Todo> {
        self.repo
            .find_by_id(id, user.user_id())?
            .ok_or(TodoServiceError::NotFound(id))
    }
}

fn log_outcome<T>(
    event: &str,
    user: &AuthenticatedUser,
    todo_id: Option<TodoId>,
    result: &TodoServiceResult<T>,
) {
    let todo_id = todo_id.map_or_else(|| "-".to_string(), |id| id.to_string());
    match result {
        Ok(_) => info!(
            "event={event} module=todo_service status=ok owner_id={} todo_id={todo_id}",
            user.user_id()
        ),
        Err(err) if err.kind() == ErrorKind::Internal => error!(
            "event={event} module=todo_service status=error owner_id={} todo_id={todo_id} error={err}",
            user.user_id()
        ),
        Err(err) => warn!(
            "event={event} module=todo_service status=rejected owner_id={} todo_id={todo_id} error_code={}",
            user.user_id(),
            err.kind().code()
        ),
    }
}
