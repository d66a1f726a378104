//! User account persistence and credential verification.

use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::user::{User, UserCreate, UserUpdate};

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, DEFAULT_COST)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password, password_hash)
}

const SELECT_COLUMNS: &str = "SELECT id, email, password_hash, full_name, is_active, \
     is_superuser, created_at, updated_at FROM users";

/// CRUD and authentication over the `users` table.
#[derive(Clone)]
pub struct UserService {
    db: Arc<SqlitePool>,
}

impl UserService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&*self.db)
            .await?;
        Ok(user)
    }

    /// Lookup by email, case-insensitively.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "{SELECT_COLUMNS} WHERE email = ? COLLATE NOCASE"
        ))
        .bind(email)
        .fetch_optional(&*self.db)
        .await?;
        Ok(user)
    }

    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<User>, ApiError> {
        let limit = limit.clamp(1, 100);
        let skip = skip.max(0);
        let users = sqlx::query_as::<_, User>(&format!(
            "{SELECT_COLUMNS} ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(skip)
        .fetch_all(&*self.db)
        .await?;
        Ok(users)
    }

    /// Insert a new account. Fails with `Conflict` when the email is
    /// already taken (compared case-insensitively).
    pub async fn create(&self, new_user: UserCreate) -> Result<User, ApiError> {
        if new_user.email.trim().is_empty() || !new_user.email.contains('@') {
            return Err(ApiError::Validation("invalid email address".into()));
        }
        if new_user.password.is_empty() {
            return Err(ApiError::Validation("password must not be empty".into()));
        }

        let now = Utc::now();
        let result = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, password_hash, full_name, is_active, is_superuser, \
             created_at, updated_at) VALUES (?, ?, ?, ?, 1, ?, ?, ?) \
             RETURNING id, email, password_hash, full_name, is_active, is_superuser, \
             created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(new_user.email.trim())
        .bind(hash_password(&new_user.password)?)
        .bind(&new_user.full_name)
        .bind(new_user.is_superuser)
        .bind(now)
        .bind(now)
        .fetch_one(&*self.db)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(err) if is_unique_violation(&err) => Err(ApiError::Conflict(
                "a user with this email already exists".into(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    /// Apply a partial update. A new password is hashed before storage.
    pub async fn update(&self, user: &User, changes: UserUpdate) -> Result<User, ApiError> {
        let email = changes.email.unwrap_or_else(|| user.email.clone());
        let password_hash = match changes.password {
            Some(password) if !password.is_empty() => hash_password(&password)?,
            Some(_) => return Err(ApiError::Validation("password must not be empty".into())),
            None => user.password_hash.clone(),
        };
        let full_name = changes.full_name.or_else(|| user.full_name.clone());
        let is_active = changes.is_active.unwrap_or(user.is_active);
        let is_superuser = changes.is_superuser.unwrap_or(user.is_superuser);

        let result = sqlx::query_as::<_, User>(
            "UPDATE users SET email = ?, password_hash = ?, full_name = ?, is_active = ?, \
             is_superuser = ?, updated_at = ? WHERE id = ? \
             RETURNING id, email, password_hash, full_name, is_active, is_superuser, \
             created_at, updated_at",
        )
        .bind(email.trim())
        .bind(password_hash)
        .bind(full_name)
        .bind(is_active)
        .bind(is_superuser)
        .bind(Utc::now())
        .bind(user.id)
        .fetch_one(&*self.db)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(err) if is_unique_violation(&err) => Err(ApiError::Conflict(
                "a user with this email already exists".into(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    /// Verify credentials. Returns `None` for unknown email or wrong
    /// password so the two cases are indistinguishable to the caller.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, ApiError> {
        let Some(user) = self.get_by_email(email).await? else {
            return Ok(None);
        };
        match verify_password(password, &user.password_hash)? {
            true => Ok(Some(user)),
            false => Ok(None),
        }
    }

    /// Create the seeded administrator on first boot if it is missing.
    pub async fn ensure_first_superuser(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        if self.get_by_email(email).await?.is_some() {
            tracing::info!("superuser already exists, skipping creation");
            return Ok(());
        }
        let user = self
            .create(UserCreate {
                email: email.to_string(),
                password: password.to_string(),
                full_name: Some("Initial Superuser".into()),
                is_superuser: true,
            })
            .await?;
        tracing::info!(email = %user.email, "superuser created");
        Ok(())
    }
}

/// Return true if the SQLx error indicates a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}
