//! Registration, login and identity resolution.
//!
//! # Invariants
//! - Emails are normalized (trim + lowercase) before lookup and storage.
//! - Login failures are undifferentiated: unknown email and wrong password
//!   both yield `InvalidCredentials` after one hash verification each.
//! - Passwords are at least `PASSWORD_MIN_CHARS` characters.
//! - Plaintext passwords never reach storage or logs.

use crate::auth::{
    AuthenticatedUser, HashError, IssuedToken, PasswordHasher, TokenError, TokenIssuer,
    Unauthorized, UnauthorizedReason,
};
use crate::error::{ErrorKind, ServiceFailure};
use crate::model::user::{Email, User, Username};
use crate::model::values::ValidationError;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use log::{error, info, warn};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for authentication use-cases.
#[derive(Debug)]
pub enum AuthError {
    Validation(ValidationError),
    /// A user with the same normalized email already exists.
    Conflict,
    InvalidCredentials,
    Unauthorized(Unauthorized),
    Hashing(HashError),
    Token(TokenError),
    Repo(RepoError),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Conflict => write!(f, "user already exists"),
            Self::InvalidCredentials => write!(f, "invalid email or password"),
            Self::Unauthorized(err) => write!(f, "{err}"),
            Self::Hashing(err) => write!(f, "{err}"),
            Self::Token(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Unauthorized(err) => Some(err),
            Self::Hashing(err) => Some(err),
            Self::Token(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Conflict | Self::InvalidCredentials => None,
        }
    }
}

impl From<ValidationError> for AuthError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for AuthError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Conflict(_) => Self::Conflict,
            other => Self::Repo(other),
        }
    }
}

impl From<HashError> for AuthError {
    fn from(value: HashError) -> Self {
        Self::Hashing(value)
    }
}

impl From<TokenError> for AuthError {
    fn from(value: TokenError) -> Self {
        Self::Token(value)
    }
}

impl From<Unauthorized> for AuthError {
    fn from(value: Unauthorized) -> Self {
        Self::Unauthorized(value)
    }
}

impl ServiceFailure for AuthError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict => ErrorKind::Conflict,
            Self::InvalidCredentials => ErrorKind::InvalidCredentials,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Hashing(_) | Self::Token(_) | Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Minimum password length accepted at registration, in characters.
pub const PASSWORD_MIN_CHARS: usize = 6;

const DECOY_PASSWORD: &str = "decoy-password-for-unknown-accounts";

/// Authentication service over user storage and credential capabilities.
pub struct AuthService<U, H, T>
where
    U: UserRepository,
    H: PasswordHasher,
    T: TokenIssuer,
{
    users: U,
    hasher: H,
    tokens: T,
    /// Hash verified against when no account matches, so misses cost the
    /// same as wrong passwords.
    decoy_hash: OnceCell<String>,
}

impl<U, H, T> AuthService<U, H, T>
where
    U: UserRepository,
    H: PasswordHasher,
    T: TokenIssuer,
{
    pub fn new(users: U, hasher: H, tokens: T) -> Self {
        Self {
            users,
            hasher,
            tokens,
            decoy_hash: OnceCell::new(),
        }
    }

    /// Registers a new account.
    ///
    /// # Errors
    /// - `Validation` when username, email or password is empty/invalid.
    /// - `Conflict` when the normalized email is already registered.
    pub fn register(&self, username: &str, email: &str, password: &str) -> AuthResult<User> {
        let result = self.register_inner(username, email, password);
        match &result {
            Ok(user) => info!(
                "event=user_register module=auth_service status=ok user_id={}",
                user.id()
            ),
            Err(err) => log_failure("user_register", err),
        }
        result
    }

    fn register_inner(&self, username: &str, email: &str, password: &str) -> AuthResult<User> {
        let username = Username::new(username)?;
        let email = Email::parse(email)?;
        validate_password(password)?;

        if self.users.find_by_email(&email)?.is_some() {
            return Err(AuthError::Conflict);
        }

        let password_hash = self.hasher.hash(password)?;
        let user = User::new(username, email, password_hash);
        self.users.create(&user)?;
        Ok(user)
    }

    /// Verifies credentials and issues a bearer token.
    pub fn login(&self, email: &str, password: &str) -> AuthResult<IssuedToken> {
        let result = self.login_inner(email, password);
        match &result {
            Ok(_) => info!("event=user_login module=auth_service status=ok"),
            Err(err) => log_failure("user_login", err),
        }
        result
    }

    fn login_inner(&self, email: &str, password: &str) -> AuthResult<IssuedToken> {
        let Ok(email) = Email::parse(email) else {
            return self.reject_unknown_account(password);
        };
        let Some(user) = self.users.find_by_email(&email)? else {
            return self.reject_unknown_account(password);
        };
        let matches = self.hasher.verify(password, user.password_hash())?;
        if password.is_empty() || !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.tokens.issue(&user)?;
        info!(
            "event=token_issue module=auth_service status=ok user_id={} expires_at={}",
            user.id(),
            issued.expires_at.to_rfc3339()
        );
        Ok(issued)
    }

    /// Burns one hash verification, then rejects the login.
    fn reject_unknown_account<R>(&self, password: &str) -> AuthResult<R> {
        let decoy = self
            .decoy_hash
            .get_or_try_init(|| self.hasher.hash(DECOY_PASSWORD))?;
        self.hasher.verify(password, decoy)?;
        Err(AuthError::InvalidCredentials)
    }

        /// Resolves the account behind an authenticated request.
    ///
    /// A verified token whose user no longer exists is `Unauthorized`.
    pub fn current_user(&self, user: &AuthenticatedUser) -> AuthResult<User> {
        self.users
            .find_by_id(user.user_id())?
            .ok_or_else(|| Unauthorized::new(UnauthorizedReason::UnknownUser).into())
    }
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    let chars = password.chars().count();
    if chars == 0 {
        return Err(ValidationError::Empty { field: "password" });
    }
    if chars < PASSWORD_MIN_CHARS {
        return Err(ValidationError::Malformed {
            field: "password",
            reason: format!("must be at least {PASSWORD_MIN_CHARS} characters"),
        });
    }
    Ok(())
}

fn log_failure(event: &str, err: &AuthError) {
    if err.kind() == ErrorKind::Internal {
        error!("event={event} module=auth_service status=error error={err}");
    } else {
        warn!(
            "event={event} module=auth_service status=rejected error_code={}",
            err.kind().code()
        );
    }
}
