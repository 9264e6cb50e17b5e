//! User entity and credential-adjacent value objects.
//!
//! # Invariants
//! - `email` is stored trimmed and lowercased; uniqueness is case-insensitive.
//! - `password_hash` is an opaque hasher output, never plaintext, and is
//!   never serialized.

use super::now_utc;
use super::values::ValidationError;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one user.
pub type UserId = Uuid;

pub const USERNAME_MAX_CHARS: usize = 100;
pub const EMAIL_MAX_CHARS: usize = 191;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid email regex"));

/// Display name chosen at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn new(value: &str) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        let chars = trimmed.chars().count();
        if chars == 0 {
            return Err(ValidationError::Empty { field: "username" });
        }
        if chars > USERNAME_MAX_CHARS {
            return Err(ValidationError::TooLong {
                field: "username",
                max: USERNAME_MAX_CHARS,
                actual: chars,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Normalized (trimmed, lowercased) email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Normalizes and validates an email address.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let normalized = normalize_email(value);
        let chars = normalized.chars().count();
        if chars == 0 {
            return Err(ValidationError::Empty { field: "email" });
        }
        if chars > EMAIL_MAX_CHARS {
            return Err(ValidationError::TooLong {
                field: "email",
                max: EMAIL_MAX_CHARS,
                actual: chars,
            });
        }
        if !EMAIL_RE.is_match(&normalized) {
            return Err(ValidationError::Malformed {
                field: "email",
                reason: "expected local@domain".to_string(),
            });
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trims and lowercases an email for lookup and storage.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Persisted user fields used to rebuild a `User`.
#[derive(Debug, Clone)]
pub struct UserParts {
    pub id: UserId,
    pub username: Username,
    pub email: Email,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    id: UserId,
    username: Username,
    email: Email,
    #[serde(skip_serializing)]
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user with a generated ID and fresh timestamps.
    pub fn new(username: Username, email: Email, password_hash: String) -> Self {
        let now = now_utc();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds a persisted user.
    ///
    /// # Errors
    /// - `ValidationError` when `id` is nil or `password_hash` is empty.
    pub fn rehydrate(parts: UserParts) -> Result<Self, ValidationError> {
        if parts.id.is_nil() {
            return Err(ValidationError::Malformed {
                field: "id",
                reason: "must not be nil".to_string(),
            });
        }
        if parts.password_hash.is_empty() {
            return Err(ValidationError::Empty {
                field: "password_hash",
            });
        }
        Ok(Self {
            id: parts.id,
            username: parts.username,
            email: parts.email,
            password_hash: parts.password_hash,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
        })
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Opaque hasher output; never plaintext.
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
