//! # User Repository
//!
//! Accounts and credential verification.
//!
//! ## Credential Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Login Verification                                  │
//! │                                                                         │
//! │  verify_credentials("operator", "secret")                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT user by username ── not found ──► Ok(None)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  argon2 verify against stored PHC hash ── mismatch ──► Ok(None)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Ok(Some(User))                                                        │
//! │                                                                         │
//! │  Unknown user and wrong password are indistinguishable to callers,     │
//! │  so login responses can't be used to enumerate accounts.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use lacto_core::{Role, User};

const SELECT_COLUMNS: &str =
    "SELECT id, username, password_hash, display_name, role, created_at FROM users";

/// Repository for user accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an account, hashing the password with argon2id.
    ///
    /// ## Returns
    /// * `Ok(User)` - Created account (hash included, cleartext discarded)
    /// * `Err(DbError::UniqueViolation)` - Username already taken
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        display_name: &str,
        role: Role,
    ) -> DbResult<User> {
        let username = username.trim().to_lowercase();

        debug!(username = %username, ?role, "Creating user");

        let user = User {
            id: Uuid::new_v4().to_string(),
            username,
            password_hash: hash_password(password)?,
            display_name: display_name.trim().to_string(),
            role,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, display_name, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .bind(user.role)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by username.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{SELECT_COLUMNS} WHERE username = ?1"))
            .bind(username.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Verifies a username/password pair.
    ///
    /// ## Returns
    /// * `Ok(Some(User))` - Credentials match
    /// * `Ok(None)` - Unknown user or wrong password (not distinguished)
    /// * `Err(_)` - Database failure or corrupt stored hash
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> DbResult<Option<User>> {
        let Some(user) = self.get_by_username(username).await? else {
            return Ok(None);
        };

        if verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Counts accounts (used by the seed binary to detect a populated store).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Password Hashing
// =============================================================================

/// Hashes a password for storage (argon2id, PHC string format).
fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::PasswordHash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC hash.
///
/// A mismatch returns `Ok(false)`; only a malformed stored hash is an error.
fn verify_password(password: &str, stored_hash: &str) -> DbResult<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| DbError::PasswordHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_verify_credentials() {
        let db = test_db().await;

        db.users()
            .create_user("operator", "correct-horse", "Stock Operator", Role::Operator)
            .await
            .unwrap();

        let user = db
            .users()
            .verify_credentials("operator", "correct-horse")
            .await
            .unwrap()
            .expect("credentials should match");

        assert_eq!(user.username, "operator");
        assert_eq!(user.role, Role::Operator);
        // Cleartext never equals the stored hash
        assert_ne!(user.password_hash, "correct-horse");
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_alike() {
        let db = test_db().await;

        db.users()
            .create_user("manager", "secret", "Warehouse Manager", Role::Manager)
            .await
            .unwrap();

        let wrong = db
            .users()
            .verify_credentials("manager", "not-the-secret")
            .await
            .unwrap();
        let unknown = db
            .users()
            .verify_credentials("nobody", "secret")
            .await
            .unwrap();

        assert!(wrong.is_none());
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn test_username_is_normalized() {
        let db = test_db().await;

        db.users()
            .create_user("  Manager ", "secret", "Warehouse Manager", Role::Manager)
            .await
            .unwrap();

        let user = db
            .users()
            .verify_credentials("MANAGER", "secret")
            .await
            .unwrap();

        assert!(user.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = test_db().await;

        db.users()
            .create_user("manager", "one", "First", Role::Manager)
            .await
            .unwrap();

        let err = db
            .users()
            .create_user("manager", "two", "Second", Role::Viewer)
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(db.users().count().await.unwrap(), 1);
    }
}
