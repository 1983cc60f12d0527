// src/middleware/auth_extractor.rs
use actix_web::error::InternalError;
use actix_web::{dev::Payload, web, Error, FromRequest, HttpRequest, HttpResponse};
use futures::future::{ready, Ready};
use log::{debug, error};

use crate::dtos::ApiResponse;
use crate::services::session_services::{SessionStore, SESSION_COOKIE};

/// Extractor result - a user with a live server-side session.
///
/// Use `Option<AuthenticatedUser>` on routes that also serve anonymous
/// visitors; a bare `AuthenticatedUser` rejects them with 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
    pub token: String,
}

fn unauthenticated(message: &'static str) -> Error {
    InternalError::from_response(
        message,
        HttpResponse::Unauthorized().json(ApiResponse::error(message)),
    )
    .into()
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<AuthenticatedUser, Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(sessions) = req.app_data::<web::Data<SessionStore>>() else {
            error!("session store is not registered as app data");
            return ready(Err(InternalError::from_response(
                "session store unavailable",
                HttpResponse::InternalServerError().json(ApiResponse::error("Internal server error")),
            )
            .into()));
        };

        let token = match req.cookie(SESSION_COOKIE) {
            Some(cookie) => cookie.value().to_string(),
            None => return ready(Err(unauthenticated("Login required"))),
        };

        match sessions.resolve(&token) {
            Some(session) => ready(Ok(AuthenticatedUser {
                user_id: session.user_id,
                username: session.username,
                token,
            })),
            None => {
                debug!("unknown or expired session token");
                ready(Err(unauthenticated("Session expired, please log in again")))
            }
        }
    }
}
