// src/dtos/auth_dtos.rs
use serde::{Deserialize, Serialize};

use crate::models::user::UserPublic;

/// `POST /register` form.
#[derive(Deserialize)]
pub struct RegisterIn {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// `POST /login` form.
#[derive(Deserialize)]
pub struct LoginIn {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub message: String,
    pub next_step: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserPublic,
    pub message: String,
}
