//! Stable error taxonomy shared by every service boundary.
//!
//! # Invariants
//! - Each service error maps to exactly one `ErrorKind`.
//! - `Internal` hides storage/crypto details from callers; the detail only
//!   goes to logs.

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Opaque text returned for `ErrorKind::Internal` failures.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// Failure category visible at the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    InvalidCredentials,
    Unauthorized,
    Internal,
}

/// Transport-neutral response category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    ClientError,
    NotFound,
    Unauthorized,
    Conflict,
    ServerError,
}

impl ErrorKind {
    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Unauthorized => "unauthorized",
            Self::Internal => "internal_error",
        }
    }

    pub fn category(self) -> ErrorCategory {
        match self {
            Self::Validation => ErrorCategory::ClientError,
            Self::NotFound => ErrorCategory::NotFound,
            Self::Conflict => ErrorCategory::Conflict,
            Self::InvalidCredentials | Self::Unauthorized => ErrorCategory::Unauthorized,
            Self::Internal => ErrorCategory::ServerError,
        }
    }

    /// HTTP status conventionally used for this kind.
    pub fn http_status(self) -> u16 {
        match self.category() {
            ErrorCategory::ClientError => 400,
            ErrorCategory::Unauthorized => 401,
            ErrorCategory::NotFound => 404,
            ErrorCategory::Conflict => 409,
            ErrorCategory::ServerError => 500,
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Boundary-safe error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Errors that can be rendered at a service boundary.
pub trait ServiceFailure: std::error::Error {
    fn kind(&self) -> ErrorKind;

    /// Human-readable message that never leaks internal details.
    fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => INTERNAL_ERROR_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }

    fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.kind().code(),
            message: self.public_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCategory, ErrorKind};

    #[test]
    fn kinds_map_to_boundary_categories() {
        assert_eq!(ErrorKind::Validation.category(), ErrorCategory::ClientError);
        assert_eq!(ErrorKind::InvalidCredentials.http_status(), 401);
        assert_eq!(ErrorKind::Unauthorized.http_status(), 401);
        assert_eq!(ErrorKind::NotFound.http_status(), 404);
        assert_eq!(ErrorKind::Conflict.http_status(), 409);
        assert_eq!(ErrorKind::Internal.http_status(), 500);
    }
}
