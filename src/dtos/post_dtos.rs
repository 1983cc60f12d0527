// src/dtos/post_dtos.rs
use serde::{Deserialize, Serialize};

use crate::models::like::LikeResult;
use crate::models::post::Post;

/// File attached to a new post, base64 encoded.
#[derive(Debug, Deserialize)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostDTO {
    pub title: String,
    #[serde(default)]
    pub file: Option<UploadedFile>,
}

/// `POST /like` form.
#[derive(Debug, Deserialize)]
pub struct LikeIn {
    pub post_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeOut {
    pub post_id: i64,
    pub result: LikeResult,
    pub like_count: i64,
}

#[derive(Debug, Serialize)]
pub struct FeedOut {
    pub authenticated: bool,
    pub username: Option<String>,
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize)]
pub struct PostDetailOut {
    #[serde(flatten)]
    pub post: Post,
    /// Only present for logged-in viewers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked_by_viewer: Option<bool>,
}
