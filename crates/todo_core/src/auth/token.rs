//! Signed bearer token capability (HS256 JWT).
//!
//! # Invariants
//! - Tokens carry the user identity in `sub` and always expire.
//! - Verification checks signature, issuer, `nbf` and `exp` before the
//!   identity claim is trusted.

use crate::model::user::{User, UserId};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const TOKEN_ISSUER: &str = "todo-api";
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 72;
const TOKEN_LEEWAY_SECS: u64 = 30;

/// Token signing or verification failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Not a structurally valid token.
    Malformed,
    InvalidSignature,
    Expired,
    /// Issuer, `nbf` or identity claim rejected.
    InvalidClaims(String),
    Signing(String),
}

impl Display for TokenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed token"),
            Self::InvalidSignature => write!(f, "invalid token signature"),
            Self::Expired => write!(f, "token expired"),
            Self::InvalidClaims(message) => write!(f, "invalid token claims: {message}"),
            Self::Signing(message) => write!(f, "token signing failed: {message}"),
        }
    }
}

impl Error for TokenError {}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        match value.kind() {
            JwtErrorKind::ExpiredSignature => Self::Expired,
            JwtErrorKind::InvalidSignature => Self::InvalidSignature,
            JwtErrorKind::InvalidIssuer => Self::InvalidClaims("issuer".to_string()),
            JwtErrorKind::ImmatureSignature => Self::InvalidClaims("not yet valid".to_string()),
            JwtErrorKind::MissingRequiredClaim(claim) => {
                Self::InvalidClaims(format!("missing `{claim}`"))
            }
            _ => Self::Malformed,
        }
    }
}

/// Claims embedded in every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub email: String,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

/// Token returned to a client after login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

/// Issues signed tokens bound to a user identity.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user: &User) -> Result<IssuedToken, TokenError>;
}

/// Verifies tokens and yields the identity they assert.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<UserId, TokenError>;
}

impl<T: TokenIssuer + ?Sized> TokenIssuer for &T {
    fn issue(&self, user: &User) -> Result<IssuedToken, TokenError> {
        (**self).issue(user)
    }
}

impl<T: TokenVerifier + ?Sized> TokenVerifier for &T {
    fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        (**self).verify(token)
    }
}

/// HS256 JWT issuer/verifier over one process-wide secret.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtTokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);
        validation.validate_nbf = true;
        validation.leeway = TOKEN_LEEWAY_SECS;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Decodes and validates a token, returning its claims.
    pub fn decode_claims(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

impl TokenIssuer for JwtTokenService {
    fn issue(&self, user: &User) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("expiry is out of range".to_string()))?;
        let claims = TokenClaims {
            sub: user.id().to_string(),
            email: user.email().as_str().to_string(),
            iss: TOKEN_ISSUER.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| TokenError::Signing(err.to_string()))?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or(expires_at);

        Ok(IssuedToken {
            token,
            token_type: "Bearer",
            expires_at,
        })
    }
}

impl TokenVerifier for JwtTokenService {
    fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        let claims = self.decode_claims(token)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| TokenError::InvalidClaims("sub is not a user id".to_string()))?;
        if user_id.is_nil() {
            return Err(TokenError::InvalidClaims("sub is nil".to_string()));
        }
        Ok(user_id)
    }
}
