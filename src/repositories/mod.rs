// src/repositories/mod.rs
pub mod memory_repo;
pub mod postgres_repo;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::like::LikeResult;
use crate::models::post::{NewPost, Post};
use crate::models::user::{NewUser, User};

pub use memory_repo::MemoryRepository;
pub use postgres_repo::PgRepository;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error("pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("not found")]
    NotFound,
    #[error("unique constraint violated")]
    Conflict,
    #[error("other: {0}")]
    Other(String),
}

/// Credential storage. Usernames are unique; rows are never updated.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Insert a user and return its id.
    /// Returns `RepoError::Conflict` when the username is already taken, even
    /// if a concurrent insert won the race after the caller's lookup.
    async fn insert_user(&self, user: NewUser) -> Result<i64, RepoError>;

    async fn count_users_named(&self, username: &str) -> Result<i64, RepoError>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post with `like_count = 0` and `created_at = now`.
    async fn create_post(&self, post: NewPost) -> Result<i64, RepoError>;

    /// All posts, newest first. Equal timestamps keep insertion order.
    async fn list_newest_first(&self) -> Result<Vec<Post>, RepoError>;

    async fn get_by_id(&self, post_id: i64) -> Result<Post, RepoError>;
}

/// The like ledger.
///
/// `record_like` must run the existence check, the like insert and the counter
/// increment as one atomic unit, so that concurrent duplicates for the same
/// (user, post) yield exactly one `Recorded`.
#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Returns `RepoError::NotFound` if the post does not exist.
    async fn record_like(&self, user_id: i64, post_id: i64) -> Result<LikeResult, RepoError>;

    async fn has_liked(&self, user_id: i64, post_id: i64) -> Result<bool, RepoError>;

    /// Number of like rows referencing the post.
    async fn count_likes(&self, post_id: i64) -> Result<i64, RepoError>;
}

/// Everything the HTTP layer needs from a storage backend.
pub trait Repository: UserRepository + PostRepository + LikeRepository {}

impl<T> Repository for T where T: UserRepository + PostRepository + LikeRepository {}
