// src/handlers/like_handlers.rs
use actix_web::{post, web, HttpResponse, Responder};
use log::error;

use crate::dtos::ApiResponse;
use crate::dtos::post_dtos::{LikeIn, LikeOut};
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::services::like_services::{LikeError, LikeLedger};

/// POST /like
/// Idempotent for the caller: repeats after the first change nothing.
/// Anonymous requests are turned away by the extractor before reaching the ledger.
#[post("/like")]
pub async fn like_post(
    ledger: web::Data<LikeLedger>,
    user: AuthenticatedUser,
    form: web::Form<LikeIn>,
) -> impl Responder {
    let post_id = form.post_id;

    let result = match ledger.like(user.user_id, post_id).await {
        Ok(result) => result,
        Err(LikeError::NotFound) => {
            return HttpResponse::NotFound().json(ApiResponse::error("Post not found"));
        }
        Err(LikeError::Repo(_)) => {
            return HttpResponse::InternalServerError()
                .json(ApiResponse::error("Failed to record like"));
        }
    };

    match ledger.like_count(post_id).await {
        Ok(like_count) => HttpResponse::Ok().json(ApiResponse::success(
            "Like processed",
            LikeOut {
                post_id,
                result,
                like_count,
            },
        )),
        Err(e) => {
            error!("failed to read like count for post {}: {}", post_id, e);
            HttpResponse::InternalServerError().json(ApiResponse::error("Failed to read like count"))
        }
    }
}
