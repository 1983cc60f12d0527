// src/services/like_services.rs
use std::sync::Arc;

use log::{error, info};
use thiserror::Error;

use crate::models::like::LikeResult;
use crate::repositories::{RepoError, Repository};

#[derive(Debug, Error)]
pub enum LikeError {
    #[error("post not found")]
    NotFound,
    #[error("repository error: {0}")]
    Repo(RepoError),
}

impl From<RepoError> for LikeError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => LikeError::NotFound,
            other => LikeError::Repo(other),
        }
    }
}

/// Enforces one like per (user, post) and keeps `posts.like_count` equal to
/// the number of like rows. The atomic unit lives in `LikeRepository::record_like`.
#[derive(Clone)]
pub struct LikeLedger {
    repo: Arc<dyn Repository>,
}

impl LikeLedger {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    pub async fn like(&self, user_id: i64, post_id: i64) -> Result<LikeResult, LikeError> {
        match self.repo.record_like(user_id, post_id).await {
            Ok(result) => {
                if result == LikeResult::Recorded {
                    info!("user {} liked post {}", user_id, post_id);
                }
                Ok(result)
            }
            Err(e) => {
                if !matches!(e, RepoError::NotFound) {
                    error!("like failed for user {} post {}: {}", user_id, post_id, e);
                }
                Err(e.into())
            }
        }
    }

    /// Current denormalized counter of the post.
    pub async fn like_count(&self, post_id: i64) -> Result<i64, LikeError> {
        Ok(self.repo.get_by_id(post_id).await?.like_count)
    }

    pub async fn has_liked(&self, user_id: i64, post_id: i64) -> Result<bool, LikeError> {
        Ok(self.repo.has_liked(user_id, post_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::post::NewPost;
    use crate::models::user::NewUser;
    use crate::repositories::{LikeRepository, MemoryRepository, PostRepository, UserRepository};

    async fn setup() -> (Arc<MemoryRepository>, LikeLedger, i64, i64, i64) {
        let repo = Arc::new(MemoryRepository::new());
        let mut ids = Vec::new();
        for name in ["alice", "bob"] {
            let id = repo
                .insert_user(NewUser {
                    username: name.to_string(),
                    password_hash: "x".to_string(),
                    display_name: None,
                })
                .await
                .unwrap();
            ids.push(id);
        }
        let post = repo
            .create_post(NewPost {
                author_id: ids[0],
                author_username: "alice".to_string(),
                title: "Hello".to_string(),
                media_reference: None,
            })
            .await
            .unwrap();
        let ledger = LikeLedger::new(repo.clone());
        (repo, ledger, ids[0], ids[1], post)
    }

    #[tokio::test]
    async fn repeated_likes_count_once() {
        let (repo, ledger, _alice, bob, post) = setup().await;

        assert_eq!(ledger.like(bob, post).await.unwrap(), LikeResult::Recorded);
        for _ in 0..4 {
            assert_eq!(ledger.like(bob, post).await.unwrap(), LikeResult::AlreadyLiked);
        }

        assert_eq!(ledger.like_count(post).await.unwrap(), 1);
        assert_eq!(repo.count_likes(post).await.unwrap(), 1);
        assert!(ledger.has_liked(bob, post).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_post_is_not_found() {
        let (_repo, ledger, alice, _bob, _post) = setup().await;
        assert!(matches!(ledger.like(alice, 999).await, Err(LikeError::NotFound)));
        assert!(matches!(ledger.like_count(999).await, Err(LikeError::NotFound)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicates_record_exactly_once() {
        let (repo, ledger, _alice, bob, post) = setup().await;

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.like(bob, post).await })
            })
            .collect();

        let mut recorded = 0;
        let mut already = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                LikeResult::Recorded => recorded += 1,
                LikeResult::AlreadyLiked => already += 1,
            }
        }

        assert_eq!(recorded, 1);
        assert_eq!(already, 15);
        assert_eq!(ledger.like_count(post).await.unwrap(), 1);
        assert_eq!(repo.count_likes(post).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn counter_matches_rows_after_mixed_traffic() {
        let (repo, ledger, alice, bob, post) = setup().await;

        let mut handles = Vec::new();
        for user in [alice, bob, alice, bob, alice] {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move { ledger.like(user, post).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let counter = ledger.like_count(post).await.unwrap();
        assert_eq!(counter, 2);
        assert_eq!(counter, repo.count_likes(post).await.unwrap());
    }

    #[tokio::test]
    async fn example_scenario() {
        let (_repo, ledger, _alice, bob, post) = setup().await;
        assert_eq!(ledger.like(bob, post).await.unwrap(), LikeResult::Recorded);
        assert_eq!(ledger.like_count(post).await.unwrap(), 1);
        assert_eq!(ledger.like(bob, post).await.unwrap(), LikeResult::AlreadyLiked);
        assert_eq!(ledger.like_count(post).await.unwrap(), 1);
    }
}
