// src/repositories/postgres_repo.rs
use async_trait::async_trait;
use deadpool_postgres::Pool;
use log::{debug, info};
use tokio_postgres::Row;

use crate::models::like::LikeResult;
use crate::models::post::{NewPost, Post};
use crate::models::user::{NewUser, User};
use crate::repositories::{LikeRepository, PostRepository, RepoError, UserRepository};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    display_name TEXT
);

CREATE TABLE IF NOT EXISTS posts (
    id BIGSERIAL PRIMARY KEY,
    title TEXT NOT NULL,
    media_reference TEXT,
    author_id BIGINT NOT NULL REFERENCES users (id),
    author_username TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT (now() AT TIME ZONE 'utc'),
    like_count BIGINT NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS posts_created_at_idx ON posts (created_at DESC, id);

CREATE TABLE IF NOT EXISTS likes (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES users (id),
    post_id BIGINT NOT NULL REFERENCES posts (id),
    UNIQUE (user_id, post_id)
);
"#;

const POST_COLUMNS: &str =
    "id, title, media_reference, author_id, author_username, created_at, like_count";

/// PostgreSQL-backed repository.
/// Every call checks a connection out of the pool and returns it on drop.
#[derive(Clone)]
pub struct PgRepository {
    pool: Pool,
}

impl PgRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn init_schema(&self) -> Result<(), RepoError> {
        let client = self.pool.get().await?;
        client.batch_execute(SCHEMA).await?;
        info!("database schema ready");
        Ok(())
    }
}

fn row_to_user(row: &Row) -> Result<User, RepoError> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        display_name: row.try_get("display_name")?,
    })
}

fn row_to_post(row: &Row) -> Result<Post, RepoError> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        media_reference: row.try_get("media_reference")?,
        author_id: row.try_get("author_id")?,
        author_username: row.try_get("author_username")?,
        created_at: row.try_get("created_at")?,
        like_count: row.try_get("like_count")?,
    })
}

#[async_trait]
impl UserRepository for PgRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, username, password_hash, display_name FROM users WHERE username = $1",
                &[&username],
            )
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn insert_user(&self, user: NewUser) -> Result<i64, RepoError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "INSERT INTO users (username, password_hash, display_name) VALUES ($1, $2, $3) \
                 ON CONFLICT (username) DO NOTHING RETURNING id",
                &[&user.username, &user.password_hash, &user.display_name],
            )
            .await?;

        match row {
            Some(row) => Ok(row.try_get("id")?),
            None => Err(RepoError::Conflict),
        }
    }

    async fn count_users_named(&self, username: &str) -> Result<i64, RepoError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one("SELECT COUNT(*) FROM users WHERE username = $1", &[&username])
            .await?;
        Ok(row.try_get(0)?)
    }
}

#[async_trait]
impl PostRepository for PgRepository {
    async fn create_post(&self, post: NewPost) -> Result<i64, RepoError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO posts (title, media_reference, author_id, author_username) \
                 VALUES ($1, $2, $3, $4) RETURNING id",
                &[
                    &post.title,
                    &post.media_reference,
                    &post.author_id,
                    &post.author_username,
                ],
            )
            .await?;
        Ok(row.try_get("id")?)
    }

    async fn list_newest_first(&self) -> Result<Vec<Post>, RepoError> {
        let client = self.pool.get().await?;
        let sql = format!("SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, id ASC");
        let rows = client.query(sql.as_str(), &[]).await?;
        rows.iter().map(row_to_post).collect()
    }

    async fn get_by_id(&self, post_id: i64) -> Result<Post, RepoError> {
        let client = self.pool.get().await?;
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = client
            .query_opt(sql.as_str(), &[&post_id])
            .await?
            .ok_or(RepoError::NotFound)?;
        row_to_post(&row)
    }
}

#[async_trait]
impl LikeRepository for PgRepository {
    async fn record_like(&self, user_id: i64, post_id: i64) -> Result<LikeResult, RepoError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        if tx
            .query_opt("SELECT id FROM posts WHERE id = $1", &[&post_id])
            .await?
            .is_none()
        {
            return Err(RepoError::NotFound);
        }

        // A concurrent insert of the same pair blocks on the unique index until
        // the first transaction finishes, then does nothing.
        let inserted = tx
            .query_opt(
                "INSERT INTO likes (user_id, post_id) VALUES ($1, $2) \
                 ON CONFLICT (user_id, post_id) DO NOTHING RETURNING id",
                &[&user_id, &post_id],
            )
            .await?;

        let result = match inserted {
            Some(_) => {
                tx.execute(
                    "UPDATE posts SET like_count = like_count + 1 WHERE id = $1",
                    &[&post_id],
                )
                .await?;
                LikeResult::Recorded
            }
            None => LikeResult::AlreadyLiked,
        };

        tx.commit().await?;
        debug!("like user={} post={} -> {:?}", user_id, post_id, result);
        Ok(result)
    }

    async fn has_liked(&self, user_id: i64, post_id: i64) -> Result<bool, RepoError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id FROM likes WHERE user_id = $1 AND post_id = $2",
                &[&user_id, &post_id],
            )
            .await?;
        Ok(row.is_some())
    }

    async fn count_likes(&self, post_id: i64) -> Result<i64, RepoError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one("SELECT COUNT(*) FROM likes WHERE post_id = $1", &[&post_id])
            .await?;
        Ok(row.try_get(0)?)
    }
}
