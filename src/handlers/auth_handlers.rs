// src/handlers/auth_handlers.rs
use actix_web::{get, post, web, HttpResponse, Responder};
use log::{error, info};

use crate::dtos::ApiResponse;
use crate::dtos::auth_dtos::{LoginIn, LoginResponse, RegisterIn, RegisterResponse};
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::models::user::UserPublic;
use crate::services::auth_services::{AuthError, AuthService};
use crate::services::session_services::SessionStore;

/// POST /register
/// Create an account; the user logs in separately afterwards.
#[post("/register")]
pub async fn register(
    svc: web::Data<AuthService>,
    current: Option<AuthenticatedUser>,
    form: web::Form<RegisterIn>,
) -> impl Responder {
    if let Some(user) = current {
        return HttpResponse::Ok().json(ApiResponse::ok(format!(
            "Already logged in as {}",
            user.username
        )));
    }

    let form = form.into_inner();
    match svc
        .register(&form.username, &form.password, form.name.as_deref())
        .await
    {
        Ok(user_id) => HttpResponse::Created().json(ApiResponse::success(
            "Registration successful",
            RegisterResponse {
                user_id,
                message: "Account created. Please log in to continue.".to_string(),
                next_step: "login".to_string(),
            },
        )),
        Err(AuthError::DuplicateUsername) => {
            HttpResponse::Conflict().json(ApiResponse::error("Username already in use."))
        }
        Err(AuthError::EmptyUsername) => HttpResponse::BadRequest().json(ApiResponse::error(
            "Username must contain at least one letter or digit.",
        )),
        Err(e) => {
            error!("register failed: {}", e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::error("Failed to create account. Please try again."))
        }
    }
}

/// POST /login
/// On success sets the `session_id` cookie. Failures never say which field was wrong.
#[post("/login")]
pub async fn login(
    svc: web::Data<AuthService>,
    sessions: web::Data<SessionStore>,
    current: Option<AuthenticatedUser>,
    form: web::Form<LoginIn>,
) -> impl Responder {
    if let Some(user) = current {
        return HttpResponse::Ok().json(ApiResponse::ok(format!(
            "Already logged in as {}",
            user.username
        )));
    }

    let user = match svc.authenticate(&form.username, &form.password).await {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            return HttpResponse::Unauthorized()
                .json(ApiResponse::error("Invalid username or password"));
        }
        Err(e) => {
            error!("login failed: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiResponse::error("Failed to verify credentials"));
        }
    };

    let token = sessions.issue(user.id, &user.username);
    let cookie = sessions.cookie(token);

    info!("user '{}' logged in ({} active sessions)", user.username, sessions.len());
    HttpResponse::Ok().cookie(cookie).json(ApiResponse::success(
        "Login successful",
        LoginResponse {
            user: UserPublic::from(&user),
            message: "Welcome back.".to_string(),
        },
    ))
}

/// GET /logout
/// Ends the session if there is one; always succeeds.
#[get("/logout")]
pub async fn logout(
    sessions: web::Data<SessionStore>,
    current: Option<AuthenticatedUser>,
) -> impl Responder {
    if let Some(user) = current {
        sessions.revoke(&user.token);
        info!("user '{}' logged out", user.username);
    }

    HttpResponse::Ok()
        .cookie(sessions.removal_cookie())
        .json(ApiResponse::ok("Logged out"))
}
