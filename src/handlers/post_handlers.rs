// src/handlers/post_handlers.rs
use actix_web::{get, post, web, HttpResponse, Responder};
use log::{debug, error, info};

use crate::dtos::ApiResponse;
use crate::dtos::post_dtos::{CreatePostDTO, FeedOut, PostDetailOut};
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::models::post::NewPost;
use crate::repositories::RepoError;
use crate::services::like_services::LikeLedger;
use crate::services::upload_services::{self, UploadError};
use crate::AppState;

fn upload_error_response(e: UploadError) -> HttpResponse {
    match e {
        UploadError::InvalidUpload(msg) => HttpResponse::BadRequest().json(ApiResponse::error(msg)),
        UploadError::Io(e) => {
            error!("failed to store upload: {}", e);
            HttpResponse::InternalServerError().json(ApiResponse::error("Failed to store file"))
        }
    }
}

/// POST /post
/// Create a post for the logged-in user, with an optional base64 file.
#[post("/post")]
pub async fn create_post(
    app_state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<CreatePostDTO>,
) -> HttpResponse {
    let body = body.into_inner();
    let title = body.title.trim().to_string();
    if title.is_empty() {
        return HttpResponse::BadRequest().json(ApiResponse::error("Title is required"));
    }

    let media_reference = match body.file {
        Some(file) => {
            let stored = match upload_services::decode_upload(&file.data) {
                Ok(bytes) => {
                    upload_services::store_upload(&app_state.upload_dir, &file.file_name, &bytes).await
                }
                Err(e) => Err(e),
            };
            match stored {
                Ok(name) => Some(name),
                Err(e) => return upload_error_response(e),
            }
        }
        None => None,
    };

    let new_post = NewPost {
        author_id: user.user_id,
        author_username: user.username.clone(),
        title,
        media_reference: media_reference.clone(),
    };

    let created = match app_state.repo.create_post(new_post).await {
        Ok(id) => app_state.repo.get_by_id(id).await,
        Err(e) => Err(e),
    };

    match created {
        Ok(post) => {
            info!("user '{}' created post {}", user.username, post.id);
            HttpResponse::Created().json(ApiResponse::success("Post created successfully", post))
        }
        Err(e) => {
            error!("failed to create post for '{}': {}", user.username, e);
            if let Some(name) = media_reference {
                upload_services::discard_upload(&app_state.upload_dir, &name).await;
            }
            HttpResponse::InternalServerError().json(ApiResponse::error("Failed to create post"))
        }
    }
}

/// GET /
/// The whole feed, newest first.
#[get("/")]
pub async fn home(
    app_state: web::Data<AppState>,
    user: Option<AuthenticatedUser>,
) -> impl Responder {
    match app_state.repo.list_newest_first().await {
        Ok(posts) => {
            debug!("feed with {} posts", posts.len());
            HttpResponse::Ok().json(ApiResponse::success(
                "Posts retrieved successfully",
                FeedOut {
                    authenticated: user.is_some(),
                    username: user.map(|u| u.username),
                    posts,
                },
            ))
        }
        Err(e) => {
            error!("failed to list posts: {}", e);
            HttpResponse::InternalServerError().json(ApiResponse::error("Failed to retrieve posts"))
        }
    }
}

/// GET /view/{post_id}
#[get("/view/{post_id}")]
pub async fn view_post(
    app_state: web::Data<AppState>,
    ledger: web::Data<LikeLedger>,
    user: Option<AuthenticatedUser>,
    path: web::Path<i64>,
) -> impl Responder {
    let post_id = path.into_inner();

    let post = match app_state.repo.get_by_id(post_id).await {
        Ok(post) => post,
        Err(RepoError::NotFound) => {
            return HttpResponse::NotFound().json(ApiResponse::error("Post not found"));
        }
        Err(e) => {
            error!("failed to load post {}: {}", post_id, e);
            return HttpResponse::InternalServerError()
                .json(ApiResponse::error("Failed to retrieve post"));
        }
    };

    let liked_by_viewer = match user {
        Some(u) => match ledger.has_liked(u.user_id, post_id).await {
            Ok(liked) => Some(liked),
            Err(e) => {
                error!("failed to check like for post {}: {}", post_id, e);
                return HttpResponse::InternalServerError()
                    .json(ApiResponse::error("Failed to retrieve post"));
            }
        },
        None => None,
    };

    HttpResponse::Ok().json(ApiResponse::success(
        "Post retrieved successfully",
        PostDetailOut {
            post,
            liked_by_viewer,
        },
    ))
}
