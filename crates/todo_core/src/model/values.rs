//! Self-validating value objects.
//!
//! # Invariants
//! - A `Title` always holds 1..=`TITLE_MAX_CHARS` characters.
//! - A `Description` always holds at most `DESCRIPTION_MAX_CHARS` characters.
//! - Lengths are counted in Unicode scalar values, not bytes.

use crate::error::{ErrorKind, ServiceFailure};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum title length in characters.
pub const TITLE_MAX_CHARS: usize = 200;
/// Maximum description length in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// Validation failure raised by value objects and entity factories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was empty after normalization.
    Empty { field: &'static str },
    /// A field exceeded its maximum character count.
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    /// A field did not match its expected shape.
    Malformed {
        field: &'static str,
        reason: String,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} is required"),
            Self::TooLong { field, max, actual } => write!(
                f,
                "{field} must be at most {max} characters (got {actual})"
            ),
            Self::Malformed { field, reason } => write!(f, "invalid {field}: {reason}"),
        }
    }
}

impl Error for ValidationError {}

impl ServiceFailure for ValidationError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Todo title: non-empty, at most `TITLE_MAX_CHARS` characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Title(String);

impl Title {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let chars = value.chars().count();
        if chars == 0 {
            return Err(ValidationError::Empty { field: "title" });
        }
        if chars > TITLE_MAX_CHARS {
            return Err(ValidationError::TooLong {
                field: "title",
                max: TITLE_MAX_CHARS,
                actual: chars,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds a new title by appending `suffix`, re-validating the result.
    pub fn with_suffix(&self, suffix: &str) -> Result<Self, ValidationError> {
        Self::new(format!("{}{suffix}", self.0))
    }
}

impl TryFrom<String> for Title {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Title> for String {
    fn from(value: Title) -> Self {
        value.0
    }
}

impl Display for Title {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Todo body text: may be empty, at most `DESCRIPTION_MAX_CHARS` characters.
///
/// An empty description is a stored value and differs from an absent one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Description(String);

impl Description {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let chars = value.chars().count();
        if chars > DESCRIPTION_MAX_CHARS {
            return Err(ValidationError::TooLong {
                field: "description",
                max: DESCRIPTION_MAX_CHARS,
                actual: chars,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Description {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Description> for String {
    fn from(value: Description) -> Self {
        value.0
    }
}

impl Display for Description {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
