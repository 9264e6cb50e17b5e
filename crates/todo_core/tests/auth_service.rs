mod common;

use common::{store, tokens};
use todo_core::{
    Argon2PasswordHasher, AuthError, AuthGate, AuthService, ErrorKind, JwtTokenService,
    PasswordHasher, ServiceFailure, SqliteUserRepository, Store, UnauthorizedReason,
    UserRepository, ValidationError, PASSWORD_MIN_CHARS,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use todo_core::auth::HashError;

/// Wraps the real hasher and counts verifications.
struct CountingHasher {
    inner: Argon2PasswordHasher,
    verifications: AtomicUsize,
}

impl PasswordHasher for &CountingHasher {
    fn hash(&self, password: &str) -> Result<String, HashError> {
        self.inner.hash(password)
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, HashError> {
        self.verifications.fetch_add(1, Ordering::SeqCst);
        self.inner.verify(password, hash)
    }
}

fn service<'a>(
    store: &'a Store,
    tokens: &'a JwtTokenService,
) -> AuthService<SqliteUserRepository<'a>, Argon2PasswordHasher, &'a JwtTokenService> {
    AuthService::new(
        SqliteUserRepository::new(store),
        Argon2PasswordHasher::with_params(8, 1, 1).unwrap(),
        tokens,
    )
}

#[test]
fn register_normalizes_email_and_hides_password() {
    let store = store();
    let tokens = tokens();
    let auth = service(&store, &tokens);

    let user = auth
        .register("  alice ", "  Alice@Example.COM ", "s3cret-pass")
        .unwrap();

    assert_eq!(user.username().as_str(), "alice");
    assert_eq!(user.email().as_str(), "alice@example.com");
    assert_ne!(user.password_hash(), "s3cret-pass");
    assert!(!user.password_hash().contains("s3cret-pass"));

    let json = serde_json::to_value(&user).unwrap();
    assert!(json.get("password_hash").is_none());
    assert_eq!(json["email"], "alice@example.com");
}

#[test]
fn register_same_normalized_email_twice_conflicts() {
    let store = store();
    let tokens = tokens();
    let auth = service(&store, &tokens);

    auth.register("alice", "alice@example.com", "pw-one").unwrap();
    let err = auth
        .register("alice2", " ALICE@example.com", "pw-two")
        .unwrap_err();

    assert!(matches!(err, AuthError::Conflict));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.public_message(), "user already exists");
}

#[test]
fn register_rejects_empty_fields() {
    let store = store();
    let tokens = tokens();
    let auth = service(&store, &tokens);

    let cases = [
        ("", "a@example.com", "secret-pw", "username"),
        ("alice", "   ", "secret-pw", "email"),
        ("alice", "a@example.com", "", "password"),
    ];
    for (username, email, password, field) in cases {
        let err = auth.register(username, email, password).unwrap_err();
        assert!(
            matches!(&err, AuthError::Validation(ValidationError::Empty { field: f }) if *f == field),
            "unexpected error for {field}: {err:?}"
        );
    }

    let err = auth.register("alice", "not-an-email", "secret-pw").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = auth
        .register("alice", "a@example.com", "five5")
        .unwrap_err();
    assert!(matches!(
        err,
        AuthError::Validation(ValidationError::Malformed {
            field: "password",
            ..
        })
    ));
    assert!(auth
        .register("alice", "a@example.com", &"x".repeat(PASSWORD_MIN_CHARS))
        .is_ok());
}

#[test]
fn login_failures_are_indistinguishable() {
    let store = store();
    let tokens = tokens();
    let auth = service(&store, &tokens);
    auth.register("alice", "alice@example.com", "right-password")
        .unwrap();

    let wrong_password = auth
        .login("alice@example.com", "wrong-password")
        .unwrap_err();
    let unknown_email = auth
        .login("nobody@example.com", "right-password")
        .unwrap_err();
    let empty_password = auth.login("alice@example.com", "").unwrap_err();

    for err in [&wrong_password, &unknown_email, &empty_password] {
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(err.kind(), ErrorKind::InvalidCredentials);
    }
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
}

#[test]
fn login_issues_token_accepted_by_gate() {
    let store = store();
    let tokens = tokens();
    let auth = service(&store, &tokens);
    let user = auth
        .register("alice", "alice@example.com", "right-password")
        .unwrap();

    let issued = auth
        .login(" ALICE@example.com ", "right-password")
        .unwrap();
    assert_eq!(issued.token_type, "Bearer");
    assert!(issued.expires_at > chrono::Utc::now());

    let gate = AuthGate::new(&tokens);
    let authenticated = gate
        .authenticate(Some(&format!("Bearer {}", issued.token)))
        .unwrap();
    assert_eq!(authenticated.user_id(), user.id());

    let current = auth.current_user(&authenticated).unwrap();
    assert_eq!(current, user);
}

#[test]
fn current_user_for_unknown_subject_is_unauthorized() {
    let store = store();
    let other_store = common::store();
    let tokens = tokens();

    let ghost = service(&other_store, &tokens)
        .register("ghost", "ghost@example.com", "secret-pw")
        .unwrap();
    assert!(SqliteUserRepository::new(&store)
        .find_by_id(ghost.id())
        .unwrap()
        .is_none());

    let authenticated = common::authenticate(&ghost);
    let err = service(&store, &tokens)
        .current_user(&authenticated)
        .unwrap_err();
    match err {
        AuthError::Unauthorized(ref rejection) => {
            assert_eq!(rejection.reason, UnauthorizedReason::UnknownUser)
        }
        ref other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn every_login_failure_runs_one_hash_verification() {
    let store = store();
    let tokens = tokens();
    let hasher = CountingHasher {
        inner: Argon2PasswordHasher::with_params(8, 1, 1).unwrap(),
        verifications: AtomicUsize::new(0),
    };
    let auth = AuthService::new(SqliteUserRepository::new(&store), &hasher, &tokens);
    auth.register("alice", "alice@example.com", "right-password")
        .unwrap();

    let attempts = [
        ("alice@example.com", "wrong-password"),
        ("nobody@example.com", "right-password"),
        ("nobody@example.com", "right-password"),
        ("not an email", "right-password"),
    ];
    for (email, password) in attempts {
        let before = hasher.verifications.load(Ordering::SeqCst);
        let err = auth.login(email, password).unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(
            hasher.verifications.load(Ordering::SeqCst) - before,
            1,
            "login as {email:?}"
        );
    }
}
