// src/config.rs
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use deadpool_postgres::{Config, Pool, Runtime};
use tokio_postgres::NoTls;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            other => bail!("unknown STORAGE_BACKEND '{}' (expected postgres or memory)", other),
        }
    }
}

/// Argon2id cost parameters used when hashing new passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    // argon2 crate defaults (OWASP minimum for argon2id)
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageBackend,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub upload_dir: PathBuf,
    pub session_ttl: Duration,
    /// Mark the session cookie `Secure`. Off only for plain-HTTP development.
    pub secure_cookies: bool,
    pub hash_cost: HashCost,
    /// Largest accepted JSON body; bounds base64 uploads.
    pub max_body_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let storage = match env::var("STORAGE_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => StorageBackend::Postgres,
        };

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let defaults = HashCost::default();

        Ok(Self {
            storage,
            port: env_or("PORT", 8080)?,
            allowed_origins,
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("static/file")),
            session_ttl: Duration::from_secs(env_or("SESSION_TTL_SECS", 86_400)?),
            secure_cookies: env_or("COOKIE_SECURE", true)?,
            hash_cost: HashCost {
                memory_kib: env_or("ARGON2_MEMORY_KIB", defaults.memory_kib)?,
                iterations: env_or("ARGON2_ITERATIONS", defaults.iterations)?,
                parallelism: env_or("ARGON2_PARALLELISM", defaults.parallelism)?,
            },
            max_body_bytes: env_or("MAX_BODY_BYTES", 64 * 1024 * 1024)?,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

pub fn get_pg_pool() -> Result<Pool> {
    let mut cfg = Config::new();
    cfg.host = Some(env::var("PG_HOST").context("PG_HOST not set")?);
    cfg.user = Some(env::var("PG_USER").context("PG_USER not set")?);
    cfg.password = env::var("PG_PASS").ok();
    cfg.dbname = Some(env::var("PG_DB").context("PG_DB not set")?);

    let mut pcfg = cfg.pool.take().unwrap_or_default();
    pcfg.max_size = env_or("PG_POOL_MAX_SIZE", 16usize)?;
    cfg.pool = Some(pcfg);

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .context("failed to create postgres pool")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_storage_backend() {
        assert_eq!("postgres".parse::<StorageBackend>().unwrap(), StorageBackend::Postgres);
        assert_eq!(" Memory ".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn missing_key_falls_back_to_default() {
        let v: u64 = env_or("POSTWALL_TEST_SURELY_UNSET_KEY", 42).unwrap();
        assert_eq!(v, 42);
    }
}
