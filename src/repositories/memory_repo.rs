// src/repositories/memory_repo.rs
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::models::like::{Like, LikeResult};
use crate::models::post::{NewPost, Post};
use crate::models::user::{NewUser, User};
use crate::repositories::{LikeRepository, PostRepository, RepoError, UserRepository};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    likes: Vec<Like>,
    next_user_id: i64,
    next_post_id: i64,
    next_like_id: i64,
}

/// Process-local repository for development and tests.
///
/// All three tables sit behind one mutex, so every operation (including the
/// like check-and-write) is serialized. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // no operation leaves a partial write behind, so poison is harmless
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.lock();
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<i64, RepoError> {
        let mut tables = self.lock();
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(RepoError::Conflict);
        }

        tables.next_user_id += 1;
        let id = tables.next_user_id;
        tables.users.push(User {
            id,
            username: user.username,
            password_hash: user.password_hash,
            display_name: user.display_name,
        });
        Ok(id)
    }

    async fn count_users_named(&self, username: &str) -> Result<i64, RepoError> {
        let tables = self.lock();
        Ok(tables.users.iter().filter(|u| u.username == username).count() as i64)
    }
}

#[async_trait]
impl PostRepository for MemoryRepository {
    async fn create_post(&self, post: NewPost) -> Result<i64, RepoError> {
        let mut tables = self.lock();
        if !tables.users.iter().any(|u| u.id == post.author_id) {
            return Err(RepoError::Other(format!("unknown author id {}", post.author_id)));
        }

        tables.next_post_id += 1;
        let id = tables.next_post_id;
        tables.posts.push(Post {
            id,
            title: post.title,
            media_reference: post.media_reference,
            author_id: post.author_id,
            author_username: post.author_username,
            created_at: Utc::now().naive_utc(),
            like_count: 0,
        });
        Ok(id)
    }

    async fn list_newest_first(&self) -> Result<Vec<Post>, RepoError> {
        let mut posts = self.lock().posts.clone();
        // sort_by is stable: equal timestamps stay in insertion order
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn get_by_id(&self, post_id: i64) -> Result<Post, RepoError> {
        let tables = self.lock();
        tables
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl LikeRepository for MemoryRepository {
    async fn record_like(&self, user_id: i64, post_id: i64) -> Result<LikeResult, RepoError> {
        let mut tables = self.lock();

        let post_idx = tables
            .posts
            .iter()
            .position(|p| p.id == post_id)
            .ok_or(RepoError::NotFound)?;

        if tables
            .likes
            .iter()
            .any(|l| l.user_id == user_id && l.post_id == post_id)
        {
            return Ok(LikeResult::AlreadyLiked);
        }

        tables.next_like_id += 1;
        let id = tables.next_like_id;
        tables.likes.push(Like { id, user_id, post_id });
        tables.posts[post_idx].like_count += 1;
        Ok(LikeResult::Recorded)
    }

    async fn has_liked(&self, user_id: i64, post_id: i64) -> Result<bool, RepoError> {
        let tables = self.lock();
        Ok(tables
            .likes
            .iter()
            .any(|l| l.user_id == user_id && l.post_id == post_id))
    }

    async fn count_likes(&self, post_id: i64) -> Result<i64, RepoError> {
        let tables = self.lock();
        Ok(tables.likes.iter().filter(|l| l.post_id == post_id).count() as i64)
    }
}
