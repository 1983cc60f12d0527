// src/models/post.rs
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    /// Stored file name under the upload directory, if the post has media.
    pub media_reference: Option<String>,
    pub author_id: i64,
    /// Snapshot of the author's username at posting time.
    pub author_username: String,
    pub created_at: NaiveDateTime,
    pub like_count: i64,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub author_username: String,
    pub title: String,
    pub media_reference: Option<String>,
}
