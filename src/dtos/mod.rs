// src/dtos/mod.rs
pub mod api_dtos;
pub mod auth_dtos;
pub mod post_dtos;

pub use api_dtos::ApiResponse;
