#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use todo_core::{
    AuthGate, AuthenticatedUser, Email, JwtTokenService, SqliteUserRepository, Store, TokenIssuer,
    User, UserRepository, Username,
};

pub const TEST_SECRET: &[u8] = b"integration-test-secret-0123456789";

pub fn store() -> Store {
    Store::open_in_memory().unwrap()
}

pub fn tokens() -> JwtTokenService {
    JwtTokenService::new(TEST_SECRET, Duration::hours(1))
}

/// Inserts a user row directly, bypassing password hashing.
pub fn seed_user(store: &Store, name: &str) -> User {
    let user = User::new(
        Username::new(name).unwrap(),
        Email::parse(&format!("{name}@example.com")).unwrap(),
        "unused-hash".to_string(),
    );
    SqliteUserRepository::new(store).create(&user).unwrap();
    user
}

/// Runs a freshly issued token for `user` through the gate.
pub fn authenticate(user: &User) -> AuthenticatedUser {
    let tokens = tokens();
    let issued = tokens.issue(user).unwrap();
    AuthGate::new(&tokens)
        .authenticate(Some(&format!("Bearer {}", issued.token)))
        .unwrap()
}

pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap()
}
