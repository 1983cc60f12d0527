// src/models/like.rs
use serde::{Deserialize, Serialize};

/// One row of the like ledger. At most one exists per (user_id, post_id).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Like {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
}

/// Outcome of a like attempt that reached the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeResult {
    Recorded,
    AlreadyLiked,
}
