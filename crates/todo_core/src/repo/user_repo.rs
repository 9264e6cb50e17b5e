//! User repository contract and SQLite implementation.
//!
//! # Invariants
//! - Emails are looked up in their normalized (trimmed, lowercased) form.
//! - The `users.email` unique index is the final guard against duplicate
//!   registrations racing each other.

use super::{from_epoch_ms, map_insert_error, parse_uuid, to_epoch_ms, RepoError, RepoResult};
use crate::db::Store;
use crate::model::user::{Email, User, UserId, UserParts, Username};
use rusqlite::{params, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    email,
    password_hash,
    created_at,
    updated_at
FROM users";

/// Repository interface for user accounts.
pub trait UserRepository {
    /// Fails with `Conflict` when the email is already registered.
    fn create(&self, user: &User) -> RepoResult<()>;
    fn find_by_email(&self, email: &Email) -> RepoResult<Option<User>>;
    fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'store> {
    store: &'store Store,
}

impl<'store> SqliteUserRepository<'store> {
    pub fn new(store: &'store Store) -> Self {
        Self { store }
    }

    fn find_one(&self, column: &str, value: String) -> RepoResult<Option<User>> {
        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} WHERE {column} = ?1;"))?;
            let parsed = stmt
                .query_row([value], |row| Ok(parse_user_row(row)))
                .optional()?;
            parsed.transpose()
        })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create(&self, user: &User) -> RepoResult<()> {
        self.store.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (
                    id,
                    username,
                    email,
                    password_hash,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    user.id().to_string(),
                    user.username().as_str(),
                    user.email().as_str(),
                    user.password_hash(),
                    to_epoch_ms(user.created_at()),
                    to_epoch_ms(user.updated_at()),
                ],
            )
            .map_err(|err| map_insert_error(err, "user"))?;
            Ok(())
        })
    }

    fn find_by_email(&self, email: &Email) -> RepoResult<Option<User>> {
        self.find_one("email", email.as_str().to_string())
    }

    fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        self.find_one("id", id.to_string())
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;
    let username: String = row.get("username")?;
    let email: String = row.get("email")?;

    let parts = UserParts {
        id: parse_uuid(&id_text, "users.id")?,
        username: Username::new(&username)
            .map_err(|err| RepoError::InvalidData(format!("user `{id_text}`: {err}")))?,
        email: Email::parse(&email)
            .map_err(|err| RepoError::InvalidData(format!("user `{id_text}`: {err}")))?,
        password_hash: row.get("password_hash")?,
        created_at: from_epoch_ms(row.get("created_at")?, "users.created_at")?,
        updated_at: from_epoch_ms(row.get("updated_at")?, "users.updated_at")?,
    };
    User::rehydrate(parts)
        .map_err(|err| RepoError::InvalidData(format!("user `{id_text}`: {err}")))
}
