//! Todo repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide owner-scoped CRUD, duplication and filtered listing over the
//!   `todos` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Every statement carries `owner_id = ?`; there is no cross-user query.
//! - A todo owned by someone else is indistinguishable from a missing one.
//! - Listing order is stable: the sort key first, then `id ASC`.

use super::{from_epoch_ms, map_insert_error, parse_uuid, to_epoch_ms, RepoError, RepoResult};
use crate::db::Store;
use crate::model::todo::{Todo, TodoId, TodoParts};
use crate::model::user::UserId;
use crate::model::values::Title;
use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

pub const LIST_DEFAULT_LIMIT: u32 = 20;
pub const LIST_LIMIT_MAX: u32 = 100;

const TODO_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    title,
    description,
    due_date,
    completed,
    completed_at,
    created_at,
    updated_at
FROM todos";

/// Sort key accepted by `list_by_filter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Title,
    #[default]
    CreatedAt,
    UpdatedAt,
    DueDate,
}

impl SortKey {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "title" => Some(Self::Title),
            "created_at" => Some(Self::CreatedAt),
            "updated_at" => Some(Self::UpdatedAt),
            "due_date" => Some(Self::DueDate),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::DueDate => "due_date",
        }
    }
}

/// Sort direction; defaults to descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filter, sort and pagination options for listing one owner's todos.
///
/// Substring filters are case-insensitive for ASCII and match `%`/`_`
/// literally. The due-date range is inclusive on both ends and never
/// matches todos without a due date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoListFilter {
    pub owner_id: UserId,
    /// Matches title OR description.
    pub query: Option<String>,
    pub title_contains: Option<String>,
    pub description_contains: Option<String>,
    pub due_from: Option<DateTime<Utc>>,
    pub due_to: Option<DateTime<Utc>>,
    pub completed: Option<bool>,
    pub sort: SortKey,
    pub order: SortOrder,
    /// Clamped to `[1, LIST_LIMIT_MAX]`, `LIST_DEFAULT_LIMIT` when unset.
    pub limit: Option<i64>,
    /// Clamped to `>= 0`, zero when unset.
    pub offset: Option<i64>,
}

impl TodoListFilter {
    pub fn for_owner(owner_id: UserId) -> Self {
        Self {
            owner_id,
            ..Self::default()
        }
    }

    pub fn effective_limit(&self) -> u32 {
        normalize_limit(self.limit)
    }

    pub fn effective_offset(&self) -> u32 {
        normalize_offset(self.offset)
    }
}

/// Clamps a requested page size to `[1, LIST_LIMIT_MAX]`.
pub fn normalize_limit(limit: Option<i64>) -> u32 {
    match limit {
        None => LIST_DEFAULT_LIMIT,
        Some(value) => value.clamp(1, i64::from(LIST_LIMIT_MAX)) as u32,
    }
}

/// Clamps a requested offset to `>= 0`.
pub fn normalize_offset(offset: Option<i64>) -> u32 {
    offset.map_or(0, |value| value.clamp(0, i64::from(u32::MAX)) as u32)
}

/// One page of list results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoPage {
    pub items: Vec<Todo>,
    /// Number of matching todos ignoring pagination.
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

/// Repository interface for owner-scoped todo persistence.
pub trait TodoRepository {
    fn list_by_filter(&self, filter: &TodoListFilter) -> RepoResult<TodoPage>;
    fn find_by_id(&self, id: TodoId, owner_id: UserId) -> RepoResult<Option<Todo>>;
    /// Fails with `Conflict` only on identifier collision.
    fn create(&self, todo: Todo) -> RepoResult<Todo>;
    /// Fails with `NotFound` when no row matches `(id, owner_id)`.
    fn update(&self, todo: Todo) -> RepoResult<Todo>;
    /// Fails with `NotFound` when no row matches `(id, owner_id)`.
    fn delete(&self, id: TodoId, owner_id: UserId) -> RepoResult<()>;
    /// Copies `source_id` into a fresh open todo; `None` when the source is
    /// missing or not owned by `owner_id`.
    fn duplicate(
        &self,
        source_id: TodoId,
        owner_id: UserId,
        new_id: TodoId,
        new_title: Title,
    ) -> RepoResult<Option<Todo>>;
}

/// SQLite-backed todo repository.
pub struct SqliteTodoRepository<'store> {
    store: &'store Store,
}

impl<'store> SqliteTodoRepository<'store> {
    pub fn new(store: &'store Store) -> Self {
        Self { store }
    }
}

impl TodoRepository for SqliteTodoRepository<'_> {
    fn list_by_filter(&self, filter: &TodoListFilter) -> RepoResult<TodoPage> {
        let limit = filter.effective_limit();
        let offset = filter.effective_offset();
        let (where_sql, mut bind_values) = build_where_clause(filter);

        self.store.with_conn(|conn| {
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM todos {where_sql}"),
                params_from_iter(bind_values.iter()),
                |row| row.get(0),
            )?;

            let sql = format!(
                "{TODO_SELECT_SQL} {where_sql} ORDER BY {} LIMIT ? OFFSET ?",
                order_by_clause(filter.sort, filter.order)
            );
            bind_values.push(Value::Integer(i64::from(limit)));
            bind_values.push(Value::Integer(i64::from(offset)));

            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            let mut items = Vec::new();
            while let Some(row) = rows.next()? {
                items.push(parse_todo_row(row)?);
            }

            debug!(
                "event=todo_list module=repo status=ok total={} returned={} limit={} offset={}",
                total,
                items.len(),
                limit,
                offset
            );

            Ok(TodoPage {
                items,
                total: u64::try_from(total).unwrap_or_default(),
                limit,
                offset,
            })
        })
    }

    fn find_by_id(&self, id: TodoId, owner_id: UserId) -> RepoResult<Option<Todo>> {
        self.store.with_conn(|conn| select_owned(conn, id, owner_id))
    }

    fn create(&self, todo: Todo) -> RepoResult<Todo> {
        self.store.with_conn(|conn| {
            insert_todo(conn, &todo)?;
            Ok(todo)
        })
    }

    fn update(&self, todo: Todo) -> RepoResult<Todo> {
        self.store.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE todos
                 SET
                    title = ?1,
                    description = ?2,
                    due_date = ?3,
                    completed = ?4,
                    completed_at = ?5,
                    updated_at = ?6
                 WHERE id = ?7 AND owner_id = ?8;",
                params![
                    todo.title().as_str(),
                    todo.description().map(|value| value.as_str()),
                    todo.due_date().map(to_epoch_ms),
                    bool_to_int(todo.completed()),
                    todo.completed_at().map(to_epoch_ms),
                    to_epoch_ms(todo.updated_at()),
                    todo.id().to_string(),
                    todo.owner_id().to_string(),
                ],
            )?;

            if changed == 0 {
                return Err(RepoError::NotFound(todo.id()));
            }
            Ok(todo)
        })
    }

    fn delete(&self, id: TodoId, owner_id: UserId) -> RepoResult<()> {
        self.store.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM todos WHERE id = ?1 AND owner_id = ?2;",
                params![id.to_string(), owner_id.to_string()],
            )?;

            if changed == 0 {
                return Err(RepoError::NotFound(id));
            }
            Ok(())
        })
    }

    fn duplicate(
        &self,
        source_id: TodoId,
        owner_id: UserId,
        new_id: TodoId,
        new_title: Title,
    ) -> RepoResult<Option<Todo>> {
        self.store.with_conn(|conn| {
            let tx = conn.transaction()?;
            let Some(source) = select_owned(&tx, source_id, owner_id)? else {
                return Ok(None);
            };

            let copy = source.duplicate(new_id, new_title)?;
            insert_todo(&tx, &copy)?;
            tx.commit()?;
            Ok(Some(copy))
        })
    }
}

fn select_owned(conn: &Connection, id: TodoId, owner_id: UserId) -> RepoResult<Option<Todo>> {
    let mut stmt = conn.prepare(&format!(
        "{TODO_SELECT_SQL} WHERE id = ?1 AND owner_id = ?2;"
    ))?;
    let parsed = stmt
        .query_row(params![id.to_string(), owner_id.to_string()], |row| {
            Ok(parse_todo_row(row))
        })
        .optional()?;
    parsed.transpose()
}

fn insert_todo(conn: &Connection, todo: &Todo) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO todos (
            id,
            owner_id,
            title,
            description,
            due_date,
            completed,
            completed_at,
            created_at,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
        params![
            todo.id().to_string(),
            todo.owner_id().to_string(),
            todo.title().as_str(),
            todo.description().map(|value| value.as_str()),
            todo.due_date().map(to_epoch_ms),
            bool_to_int(todo.completed()),
            todo.completed_at().map(to_epoch_ms),
            to_epoch_ms(todo.created_at()),
            to_epoch_ms(todo.updated_at()),
        ],
    )
    .map_err(|err| map_insert_error(err, "todo id"))?;
    Ok(())
}

fn build_where_clause(filter: &TodoListFilter) -> (String, Vec<Value>) {
    let mut sql = String::from("WHERE owner_id = ?");
    let mut bind_values = vec![Value::Text(filter.owner_id.to_string())];

    if let Some(query) = non_empty(filter.query.as_deref()) {
        let pattern = like_pattern(query);
        sql.push_str(
            " AND (title LIKE ? ESCAPE '\\' OR COALESCE(description, '') LIKE ? ESCAPE '\\')",
        );
        bind_values.push(Value::Text(pattern.clone()));
        bind_values.push(Value::Text(pattern));
    }
    if let Some(title) = non_empty(filter.title_contains.as_deref()) {
        sql.push_str(" AND title LIKE ? ESCAPE '\\'");
        bind_values.push(Value::Text(like_pattern(title)));
    }
    if let Some(description) = non_empty(filter.description_contains.as_deref()) {
        sql.push_str(" AND description LIKE ? ESCAPE '\\'");
        bind_values.push(Value::Text(like_pattern(description)));
    }
    if let Some(from) = filter.due_from {
        sql.push_str(" AND due_date IS NOT NULL AND due_date >= ?");
        bind_values.push(Value::Integer(to_epoch_ms(from)));
    }
    if let Some(to) = filter.due_to {
        sql.push_str(" AND due_date IS NOT NULL AND due_date <= ?");
        bind_values.push(Value::Integer(to_epoch_ms(to)));
    }
    if let Some(completed) = filter.completed {
        sql.push_str(" AND completed = ?");
        bind_values.push(Value::Integer(bool_to_int(completed)));
    }

    (sql, bind_values)
}

fn order_by_clause(sort: SortKey, order: SortOrder) -> String {
    let direction = order.keyword();
    match sort {
        // Todos without a due date always trail dated ones.
        SortKey::DueDate => format!("(due_date IS NULL) ASC, due_date {direction}, id ASC"),
        other => format!("{} {direction}, id ASC", other.column()),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn parse_todo_row(row: &Row<'_>) -> RepoResult<Todo> {
    let id_text: String = row.get("id")?;
    let owner_text: String = row.get("owner_id")?;

    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid completed value `{other}` in todos.completed"
            )));
        }
    };

    let parts = TodoParts {
        id: parse_uuid(&id_text, "todos.id")?,
        owner_id: parse_uuid(&owner_text, "todos.owner_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        completed,
        due_date: optional_timestamp(row, "due_date")?,
        completed_at: optional_timestamp(row, "completed_at")?,
        created_at: from_epoch_ms(row.get("created_at")?, "todos.created_at")?,
        updated_at: from_epoch_ms(row.get("updated_at")?, "todos.updated_at")?,
    };

    Todo::rehydrate(parts)
        .map_err(|err| RepoError::InvalidData(format!("todo `{id_text}`: {err}")))
}

fn optional_timestamp(row: &Row<'_>, column: &str) -> RepoResult<Option<DateTime<Utc>>> {
    row.get::<_, Option<i64>>(column)?
        .map(|value| from_epoch_ms(value, &format!("todos.{column}")))
        .transpose()
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
