// src/services/auth_services.rs
use std::sync::{Arc, LazyLock};

use argon2::{Algorithm, Argon2, Params, Version};
use log::{debug, info, warn};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use regex::Regex;
use thiserror::Error;

use crate::config::HashCost;
use crate::models::user::{NewUser, User};
use crate::repositories::{RepoError, Repository};

static DISALLOWED_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\s]").expect("static pattern compiles"));

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username already in use")]
    DuplicateUsername,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("username is empty")]
    EmptyUsername,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("repository error: {0}")]
    Repo(#[from] RepoError),
}

/// Strip every character outside ASCII alphanumerics and whitespace.
///
/// This is a content filter only. Queries always bind parameters.
pub fn sanitize_input(raw: &str) -> String {
    DISALLOWED_CHARS.replace_all(raw, "").into_owned()
}

/// Hash a plain password with argon2id and a fresh random salt.
pub fn hash_password(hasher: &Argon2<'_>, password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    hasher
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Verify a password against a stored PHC hash.
/// Cost parameters are read from the hash itself.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("stored password hash is unparseable: {}", e);
            false
        }
    }
}

/// Credential store: registration and login checks over the `users` table.
#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn Repository>,
    hasher: Argon2<'static>,
    /// Hash of a random secret at the configured cost. Logins for unknown
    /// usernames are verified against it so both failure paths do the same work.
    decoy_hash: Arc<str>,
}

impl AuthService {
    pub fn new(repo: Arc<dyn Repository>, cost: HashCost) -> Result<Self, AuthError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| AuthError::Hashing(format!("invalid argon2 parameters: {}", e)))?;

        let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let decoy_secret = SaltString::generate(&mut OsRng);
        let decoy_hash = hash_password(&hasher, decoy_secret.as_str())?;

        Ok(Self {
            repo,
            hasher,
            decoy_hash: decoy_hash.into(),
        })
    }

    /// The hash a login attempt is checked against: the user's own, or the decoy.
    fn credential_hash(&self, user: Option<&User>) -> Arc<str> {
        match user {
            Some(u) => Arc::from(u.password_hash.as_str()),
            None => self.decoy_hash.clone(),
        }
    }

    /// Create an account. No session is issued; the caller logs in separately.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<i64, AuthError> {
        let username = sanitize_input(username).trim().to_string();
        if username.is_empty() {
            return Err(AuthError::EmptyUsername);
        }
        let password = sanitize_input(password);
        let display_name = display_name
            .map(|n| sanitize_input(n).trim().to_string())
            .filter(|n| !n.is_empty());

        if self.repo.find_by_username(&username).await?.is_some() {
            debug!("register rejected, '{}' already taken", username);
            return Err(AuthError::DuplicateUsername);
        }

        let hasher = self.hasher.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&hasher, &password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))??;

        // the insert re-checks uniqueness, covering a registration that raced past the lookup
        let user_id = self
            .repo
            .insert_user(NewUser {
                username: username.clone(),
                password_hash,
                display_name,
            })
            .await
            .map_err(|e| match e {
                RepoError::Conflict => AuthError::DuplicateUsername,
                other => AuthError::Repo(other),
            })?;

        info!("registered user '{}' (id {})", username, user_id);
        Ok(user_id)
    }

    /// Check a login attempt.
    /// Unknown usernames and wrong passwords both yield `InvalidCredentials`.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = sanitize_input(username).trim().to_string();
        let password = sanitize_input(password);

        let user = self.repo.find_by_username(&username).await?;

        let stored = self.credential_hash(user.as_ref());
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        match user {
            Some(user) if valid => Ok(user),
            _ => {
                warn!("login failed for '{}'", username);
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn cheap_hash_cost() -> HashCost {
    HashCost {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MemoryRepository, UserRepository};

    fn service() -> (Arc<MemoryRepository>, AuthService) {
        let repo = Arc::new(MemoryRepository::new());
        let svc = AuthService::new(repo.clone(), cheap_hash_cost()).unwrap();
        (repo, svc)
    }

    #[test]
    fn sanitize_strips_symbols_keeps_spaces() {
        assert_eq!(sanitize_input("al'ice; DROP--"), "alice DROP");
        assert_eq!(sanitize_input("John Smith 3"), "John Smith 3");
        assert_eq!(sanitize_input("!@#$"), "");
    }

    #[test]
    fn same_password_hashes_differently() {
        let cost = cheap_hash_cost();
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None).unwrap();
        let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let a = hash_password(&hasher, "pw1").unwrap();
        let b = hash_password(&hasher, "pw1").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("pw1", &a));
        assert!(verify_password("pw1", &b));
        assert!(!verify_password("pw2", &a));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("pw1", "not-a-phc-string"));
    }

    #[test]
    fn rejects_invalid_cost() {
        let repo = Arc::new(MemoryRepository::new());
        let cost = HashCost {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        };
        assert!(matches!(
            AuthService::new(repo, cost),
            Err(AuthError::Hashing(_))
        ));
    }

    #[tokio::test]
    async fn register_twice_keeps_one_row() {
        let (repo, svc) = service();
        svc.register("alice", "pw1", Some("Alice")).await.unwrap();

        let err = svc.register("alice", "pw2", Some("Alice2")).await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUsername));
        assert_eq!(repo.count_users_named("alice").await.unwrap(), 1);

        let stored = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.display_name.as_deref(), Some("Alice"));
        assert!(stored.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn register_sanitizes_username() {
        let (repo, svc) = service();
        svc.register("bo'b!", "pw", None).await.unwrap();
        assert!(repo.find_by_username("bob").await.unwrap().is_some());

        let err = svc.register("b-o-b", "other", None).await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUsername));
    }

    #[tokio::test]
    async fn register_rejects_empty_username() {
        let (repo, svc) = service();
        let err = svc.register("!!!", "pw", None).await.unwrap_err();
        assert!(matches!(err, AuthError::EmptyUsername));
        assert_eq!(repo.count_users_named("").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn blank_display_name_is_stored_as_absent() {
        let (repo, svc) = service();
        svc.register("carol", "pw", Some("  ***  ")).await.unwrap();
        let stored = repo.find_by_username("carol").await.unwrap().unwrap();
        assert_eq!(stored.display_name, None);
    }

    #[tokio::test]
    async fn authenticate_accepts_right_password_only() {
        let (_repo, svc) = service();
        let id = svc.register("alice", "pw1", None).await.unwrap();

        let user = svc.authenticate("alice", "pw1").await.unwrap();
        assert_eq!(user.id, id);

        assert!(matches!(
            svc.authenticate("alice", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn unknown_user_is_indistinguishable_from_wrong_password() {
        let (_repo, svc) = service();
        svc.register("alice", "pw1", None).await.unwrap();

        let unknown = svc.authenticate("mallory", "pw1").await.unwrap_err();
        let wrong = svc.authenticate("alice", "nope").await.unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn users_with_same_password_get_distinct_hashes() {
        let (repo, svc) = service();
        svc.register("alice", "shared", None).await.unwrap();
        svc.register("bob", "shared", None).await.unwrap();

        let a = repo.find_by_username("alice").await.unwrap().unwrap();
        let b = repo.find_by_username("bob").await.unwrap().unwrap();
        assert_ne!(a.password_hash, b.password_hash);
    }

    #[test]
    fn unknown_user_is_checked_against_decoy_at_configured_cost() {
        let (_repo, svc) = service();

        let decoy = svc.credential_hash(None);
        assert_eq!(&*decoy, &*svc.decoy_hash);

        let parsed = PasswordHash::new(&decoy).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        let params = Params::try_from(&parsed).unwrap();
        let cost = cheap_hash_cost();
        assert_eq!(params.m_cost(), cost.memory_kib);
        assert_eq!(params.t_cost(), cost.iterations);
        assert_eq!(params.p_cost(), cost.parallelism);
    }

    #[tokio::test]
    async fn known_user_is_checked_against_own_hash() {
        let (repo, svc) = service();
        svc.register("alice", "pw1", None).await.unwrap();
        let stored = repo.find_by_username("alice").await.unwrap().unwrap();

        assert_eq!(&*svc.credential_hash(Some(&stored)), stored.password_hash.as_str());
        assert_ne!(&*svc.credential_hash(Some(&stored)), &*svc.decoy_hash);
    }

    #[tokio::test]
    async fn decoy_secret_never_authenticates() {
        let (_repo, svc) = service();
        for guess in ["", "pw1", "decoy"] {
            assert!(matches!(
                svc.authenticate("nobody", guess).await,
                Err(AuthError::InvalidCredentials)
            ));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_registrations_leave_one_row() {
        let (repo, svc) = service();
        let svc = Arc::new(svc);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.register("alice", &format!("pw{}", i), None).await })
            })
            .collect();

        let mut ok = 0;
        let mut duplicate = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(AuthError::DuplicateUsername) => duplicate += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(duplicate, 7);
        assert_eq!(repo.count_users_named("alice").await.unwrap(), 1);
    }
}
