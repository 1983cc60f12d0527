// src/handlers/mod.rs
pub mod auth_handlers;
pub mod like_handlers;
pub mod post_handlers;

use actix_web::{get, web, HttpResponse, Responder};

use crate::dtos::ApiResponse;

/// GET /health
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::ok("ok"))
}

/// Register every route. Shared by the server and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(auth_handlers::register)    // POST /register
        .service(auth_handlers::login)       // POST /login
        .service(auth_handlers::logout)      // GET /logout
        .service(post_handlers::home)        // GET /
        .service(post_handlers::view_post)   // GET /view/{post_id}
        .service(post_handlers::create_post) // POST /post
        .service(like_handlers::like_post)   // POST /like
        .service(health);                    // GET /health
}
