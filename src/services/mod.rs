// src/services/mod.rs
pub mod auth_services;
pub mod like_services;
pub mod session_services;
pub mod upload_services;
