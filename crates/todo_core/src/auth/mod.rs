//! Authentication capabilities and the request gate.
//!
//! # Responsibility
//! - Hash and verify passwords behind the `PasswordHasher` seam.
//! - Issue and verify signed bearer tokens behind `TokenIssuer`/`TokenVerifier`.
//! - Turn an `Authorization` header into an `AuthenticatedUser`.
//!
//! # Invariants
//! - `AuthenticatedUser` can only be produced by `AuthGate` after a token
//!   verified successfully; it is the sole source of the owner identity.
//! - Plaintext passwords and raw tokens are never logged.

pub mod gate;
pub mod password;
pub mod token;

pub use gate::{AuthGate, AuthenticatedUser, Unauthorized, UnauthorizedReason};
pub use password::{Argon2PasswordHasher, HashError, PasswordHasher};
pub use token::{
    IssuedToken, JwtTokenService, TokenClaims, TokenError, TokenIssuer, TokenVerifier,
    DEFAULT_TOKEN_TTL_HOURS, TOKEN_ISSUER,
};
