//! Request authentication gate.
//!
//! Per request: `Unauthenticated -> Authenticated(user_id)` only when a
//! bearer token is present, well formed, correctly signed and unexpired.
//! Every other path rejects before any use-case runs.

use super::token::{TokenError, TokenVerifier};
use crate::error::{ErrorKind, ServiceFailure};
use crate::model::user::UserId;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const BEARER_SCHEME: &str = "Bearer";

/// Identity proven by a verified bearer token.
///
/// Only `AuthGate` constructs this type, so holding one means the owner id
/// came from a verified token and not from client-supplied input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    user_id: UserId,
}

impl AuthenticatedUser {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

/// Why a request was rejected at the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnauthorizedReason {
    MissingHeader,
    MalformedHeader,
    InvalidToken(TokenError),
    /// Token verified but its user no longer resolves.
    UnknownUser,
}

impl UnauthorizedReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingHeader => "missing_header",
            Self::MalformedHeader => "malformed_header",
            Self::InvalidToken(TokenError::Expired) => "token_expired",
            Self::InvalidToken(_) => "token_invalid",
            Self::UnknownUser => "unknown_user",
        }
    }
}

/// Gate rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unauthorized {
    pub reason: UnauthorizedReason,
}

impl Unauthorized {
    pub fn new(reason: UnauthorizedReason) -> Self {
        Self { reason }
    }
}

impl ServiceFailure for Unauthorized {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Unauthorized
    }
}

impl Display for Unauthorized {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            UnauthorizedReason::MissingHeader => write!(f, "missing authorization header"),
            UnauthorizedReason::MalformedHeader => {
                write!(f, "authorization header must be `Bearer <token>`")
            }
            UnauthorizedReason::InvalidToken(err) => write!(f, "{err}"),
            UnauthorizedReason::UnknownUser => write!(f, "token subject is not a known user"),
        }
    }
}

impl Error for Unauthorized {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.reason {
            UnauthorizedReason::InvalidToken(err) => Some(err),
            _ => None,
        }
    }
}

/// Verifies bearer credentials and yields the caller identity.
pub struct AuthGate<V: TokenVerifier> {
    verifier: V,
}

impl<V: TokenVerifier> AuthGate<V> {
    pub fn new(verifier: V) -> Self {
        Self { verifier }
    }

    /// Authenticates a raw `Authorization` header value.
    ///
    /// The scheme is matched case-insensitively; surrounding whitespace is
    /// ignored.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<AuthenticatedUser, Unauthorized> {
        let result = self.resolve(authorization);
        match &result {
            Ok(user) => debug!(
                "event=auth_gate module=auth status=ok user_id={}",
                user.user_id
            ),
            Err(err) => warn!(
                "event=auth_gate module=auth status=rejected reason={}",
                err.reason.code()
            ),
        }
        result
    }

    fn resolve(&self, authorization: Option<&str>) -> Result<AuthenticatedUser, Unauthorized> {
        let header = authorization
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(Unauthorized::new(UnauthorizedReason::MissingHeader))?;
        let token = bearer_token(header)
            .ok_or(Unauthorized::new(UnauthorizedReason::MalformedHeader))?;
        let user_id = self
            .verifier
            .verify(token)
            .map_err(|err| Unauthorized::new(UnauthorizedReason::InvalidToken(err)))?;
        Ok(AuthenticatedUser { user_id })
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }
    let token = token.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}
