// src/models/user.rs
use serde::{Deserialize, Serialize};

/// Row of the `users` table.
/// `password_hash` is an argon2id PHC string and never leaves the server.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub display_name: Option<String>,
}

/// Values for inserting a new `users` row (already sanitized and hashed).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub display_name: Option<String>,
}

/// Version sent to the client (redacted)
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UserPublic {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
}

impl From<&User> for UserPublic {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
        }
    }
}
