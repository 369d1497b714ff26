//! # User Repository
//!
//! Clerk and admin accounts. Passwords are stored as argon2 PHC strings.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use sqlx::SqlitePool;
use tally_core::validation::{validate_name, validate_password, validate_username};
use tally_core::UserRecord;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Input for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    full_name: String,
    role: String,
    password_hash: String,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            id: row.id,
            username: row.username,
            full_name: row.full_name,
            role: row.role,
        }
    }
}

/// Hashes a password with argon2 and a random salt.
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::PasswordHash(e.to_string()))?
        .to_string();

    Ok(hash)
}

/// Checks a password against a stored PHC hash. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Repository for user accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an account. Usernames are stored lowercased.
    pub async fn create(&self, user: &NewUser) -> DbResult<UserRecord> {
        validate_username(&user.username).map_err(|e| DbError::InvalidInput(e.to_string()))?;
        validate_password(&user.password).map_err(|e| DbError::InvalidInput(e.to_string()))?;
        let full_name = validate_name("full_name", &user.full_name)
            .map_err(|e| DbError::InvalidInput(e.to_string()))?;
        let role = user.role.trim();
        if role.is_empty() {
            return Err(DbError::InvalidInput("role is required".into()));
        }

        let username = user.username.trim().to_lowercase();
        let id = Uuid::new_v4().to_string();
        let password_hash = hash_password(&user.password)?;

        sqlx::query(
            r#"
            INSERT INTO users (id, username, full_name, password_hash, role, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
            "#,
        )
        .bind(&id)
        .bind(&username)
        .bind(&full_name)
        .bind(&password_hash)
        .bind(role)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, username.as_str()),
            other => other,
        })?;

        info!(username = %username, role = %role, "User created");

        Ok(UserRecord {
            id,
            username,
            full_name,
            role: role.to_string(),
        })
    }

    /// Returns the account when the credentials match an active user.
    ///
    /// Unknown user, wrong password and deactivated account all yield `None`.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> DbResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, full_name, role, password_hash
            FROM users
            WHERE username = ?1 AND is_active = 1
            "#,
        )
        .bind(username.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            debug!(username = %username, "Login for unknown or inactive user");
            return Ok(None);
        };

        if !verify_password(password, &row.password_hash) {
            debug!(username = %row.username, "Password mismatch");
            return Ok(None);
        }

        Ok(Some(row.into()))
    }

    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, full_name, role, password_hash FROM users WHERE username = ?1",
        )
        .bind(username.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRecord::from))
    }

    /// Enables or disables login for an account.
    pub async fn set_active(&self, username: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = ?1 WHERE username = ?2")
            .bind(active)
            .bind(username.trim().to_lowercase())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", username));
        }
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
