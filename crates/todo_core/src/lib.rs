//! Core domain logic for the multi-tenant todo service.
//! This crate is the single source of truth for business invariants.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use auth::{
    Argon2PasswordHasher, AuthGate, AuthenticatedUser, IssuedToken, JwtTokenService,
    PasswordHasher, TokenIssuer, TokenVerifier, Unauthorized, UnauthorizedReason,
};
pub use config::{AppConfig, ConfigError};
pub use db::Store;
pub use error::{ErrorBody, ErrorCategory, ErrorKind, ServiceFailure};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::todo::{Patch, Todo, TodoId, TodoUpdate};
pub use model::user::{Email, User, UserId, Username};
pub use model::values::{Description, Title, ValidationError};
pub use repo::todo_repo::{
    SortKey, SortOrder, SqliteTodoRepository, TodoListFilter, TodoPage, TodoRepository,
};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::auth_service::{AuthError, AuthService, PASSWORD_MIN_CHARS};
pub use service::list_params::parse_list_params;
pub use service::todo_service::{NewTodo, TodoService, TodoServiceError, COPY_SUFFIX};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
