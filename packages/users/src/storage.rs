// ABOUTME: User storage layer using SQLite
// ABOUTME: Handles CRUD operations for users, credentials, and settings

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::debug;

use tandem_auth::AuthError;
use tandem_core::{generate_id, Role};
use tandem_storage::StorageError;

use super::types::{User, UserCreateInput, UserUpdateInput};

/// User storage errors
#[derive(Error, Debug)]
pub enum UserError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("User not found: {0}")]
    NotFound(String),
    #[error("User with email '{0}' already exists")]
    DuplicateEmail(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Validation error: {0}")]
    Validation(String),
}

pub type UserResult<T> = Result<T, UserError>;

pub struct UserStorage {
    pool: SqlitePool,
}

impl UserStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_user(&self, user_id: &str) -> UserResult<User> {
        debug!("Fetching user: {}", user_id);

        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| UserError::NotFound(user_id.to_string()))?;

        self.row_to_user(&row)
    }

    pub async fn get_user_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        match row {
            Some(row) => Ok(Some(self.row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_users(&self) -> UserResult<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(self.row_to_user(&row)?);
        }
        Ok(users)
    }

    /// Create a user with a freshly hashed password.
    pub async fn create_user(&self, input: UserCreateInput) -> UserResult<User> {
        if input.email.trim().is_empty() {
            return Err(UserError::Validation("Email is required".to_string()));
        }
        if input.name.trim().is_empty() {
            return Err(UserError::Validation("Name is required".to_string()));
        }
        tandem_auth::validate_password_strength(&input.password)?;

        let id = generate_id();
        let now = Utc::now();
        let role = input.role.unwrap_or_default();
        let password_hash = tandem_auth::hash_password(&input.password)?;

        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, name, role, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.email)
        .bind(&input.name)
        .bind(role.as_str())
        .bind(&password_hash)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!("Created user '{}' with ID {}", input.email, id);
                self.get_user(&id).await
            }
            Err(sqlx::Error::Database(db_err)) => {
                // SQLITE_CONSTRAINT_UNIQUE on users.email
                if let Some(code) = db_err.code() {
                    if code == "2067" || code == "1555" {
                        return Err(UserError::DuplicateEmail(input.email));
                    }
                }
                Err(StorageError::Sqlx(sqlx::Error::Database(db_err)).into())
            }
            Err(e) => Err(StorageError::Sqlx(e).into()),
        }
    }

    /// Verify email+password, record the login time, and return the user.
    pub async fn verify_login(&self, email: &str, password: &str) -> UserResult<User> {
        let user = self
            .get_user_by_email(email)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !tandem_auth::verify_password(password, &user.password_hash)? {
            return Err(UserError::InvalidCredentials);
        }

        let now = Utc::now();
        sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(now.to_rfc3339())
            .bind(&user.id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        self.get_user(&user.id).await
    }

    /// Apply a partial update (name, theme, preferences).
    pub async fn update_user(&self, user_id: &str, input: UserUpdateInput) -> UserResult<User> {
        let mut query = String::from("UPDATE users SET updated_at = ?");
        let mut has_updates = false;

        if input.name.is_some() {
            query.push_str(", name = ?");
            has_updates = true;
        }
        if input.theme.is_some() {
            query.push_str(", theme = ?");
            has_updates = true;
        }
        if input.preferences.is_some() {
            query.push_str(", preferences = ?");
            has_updates = true;
        }

        query.push_str(" WHERE id = ?");

        if !has_updates {
            return self.get_user(user_id).await;
        }

        let mut q = sqlx::query(&query).bind(Utc::now().to_rfc3339());

        if let Some(name) = &input.name {
            q = q.bind(name);
        }
        if let Some(theme) = &input.theme {
            q = q.bind(theme);
        }
        if let Some(preferences) = &input.preferences {
            q = q.bind(serde_json::to_string(preferences).map_err(StorageError::Json)?);
        }

        let result = q
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(user_id.to_string()));
        }

        self.get_user(user_id).await
    }

    /// Change a user's role. Role is immutable by self-service; the HTTP
    /// layer gates this behind an admin check.
    pub async fn set_role(&self, user_id: &str, role: Role) -> UserResult<User> {
        debug!("Setting role {} for user: {}", role, user_id);

        let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(user_id.to_string()));
        }

        self.get_user(user_id).await
    }

    /// Change password after verifying the current one.
    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> UserResult<()> {
        let user = self.get_user(user_id).await?;

        if !tandem_auth::verify_password(current_password, &user.password_hash)? {
            return Err(UserError::InvalidCredentials);
        }
        tandem_auth::validate_password_strength(new_password)?;

        let password_hash = tandem_auth::hash_password(new_password)?;
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(&password_hash)
            .bind(Utc::now().to_rfc3339())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(())
    }

    pub async fn delete_user(&self, user_id: &str) -> UserResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(user_id.to_string()));
        }

        debug!("Deleted user with ID {}", user_id);
        Ok(())
    }

    fn row_to_user(&self, row: &sqlx::sqlite::SqliteRow) -> UserResult<User> {
        let role_str: String = row.try_get("role").map_err(StorageError::Sqlx)?;
        let role: Role = role_str
            .parse()
            .map_err(|_| StorageError::Database(format!("Invalid role in users table: {role_str}")))?;

        Ok(User {
            id: row.try_get("id").map_err(StorageError::Sqlx)?,
            email: row.try_get("email").map_err(StorageError::Sqlx)?,
            name: row.try_get("name").map_err(StorageError::Sqlx)?,
            role,
            password_hash: row.try_get("password_hash").map_err(StorageError::Sqlx)?,
            theme: row.try_get("theme").map_err(StorageError::Sqlx)?,
            preferences: row
                .try_get::<Option<String>, _>("preferences")
                .map_err(StorageError::Sqlx)?
                .and_then(|s| serde_json::from_str(&s).ok()),
            created_at: parse_timestamp(row, "created_at")?,
            updated_at: parse_timestamp(row, "updated_at")?,
            last_login_at: parse_optional_timestamp(row, "last_login_at")?,
        })
    }
}

fn parse_timestamp(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<DateTime<Utc>, StorageError> {
    let raw: String = row.try_get(column).map_err(StorageError::Sqlx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StorageError::Database(format!("Invalid {column} timestamp")))
}

fn parse_optional_timestamp(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Option<DateTime<Utc>>, StorageError> {
    let raw: Option<String> = row.try_get(column).map_err(StorageError::Sqlx)?;
    match raw {
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| StorageError::Database(format!("Invalid {column} timestamp"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserCreateInput;

    async fn create_test_storage() -> UserStorage {
        let pool = tandem_storage::connect_in_memory().await.unwrap();
        UserStorage::new(pool)
    }

    fn input(email: &str, role: Option<Role>) -> UserCreateInput {
        UserCreateInput {
            email: email.to_string(),
            name: "Test User".to_string(),
            password: "a-long-enough-password".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let storage = create_test_storage().await;

        let user = storage
            .create_user(input("alice@example.com", Some(Role::ProjectManager)))
            .await
            .unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.role, Role::ProjectManager);
        assert!(user.password_hash.starts_with("$argon2id$"));

        let fetched = storage.get_user(&user.id).await.unwrap();
        assert_eq!(fetched.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_error() {
        let storage = create_test_storage().await;

        storage.create_user(input("dup@example.com", None)).await.unwrap();
        let result = storage.create_user(input("dup@example.com", None)).await;

        match result.unwrap_err() {
            UserError::DuplicateEmail(email) => assert_eq!(email, "dup@example.com"),
            other => panic!("Expected DuplicateEmail error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_verify_login() {
        let storage = create_test_storage().await;
        storage.create_user(input("bob@example.com", None)).await.unwrap();

        let user = storage
            .verify_login("bob@example.com", "a-long-enough-password")
            .await
            .unwrap();
        assert!(user.last_login_at.is_some());

        let wrong = storage.verify_login("bob@example.com", "wrong-password").await;
        assert!(matches!(wrong.unwrap_err(), UserError::InvalidCredentials));

        let unknown = storage.verify_login("nobody@example.com", "whatever-password").await;
        assert!(matches!(unknown.unwrap_err(), UserError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_set_role_and_update() {
        let storage = create_test_storage().await;
        let user = storage.create_user(input("carol@example.com", None)).await.unwrap();
        assert_eq!(user.role, Role::Client);

        let promoted = storage.set_role(&user.id, Role::Admin).await.unwrap();
        assert_eq!(promoted.role, Role::Admin);

        let updated = storage
            .update_user(
                &user.id,
                UserUpdateInput {
                    theme: Some("dark".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.theme.as_deref(), Some("dark"));
        // Untouched fields survive a partial update
        assert_eq!(updated.name, "Test User");
    }

    #[tokio::test]
    async fn test_change_password() {
        let storage = create_test_storage().await;
        let user = storage.create_user(input("dave@example.com", None)).await.unwrap();

        storage
            .change_password(&user.id, "a-long-enough-password", "another-long-password")
            .await
            .unwrap();

        assert!(storage
            .verify_login("dave@example.com", "another-long-password")
            .await
            .is_ok());

        let bad = storage
            .change_password(&user.id, "not-the-current-one", "whatever-password")
            .await;
        assert!(matches!(bad.unwrap_err(), UserError::InvalidCredentials));
    }
}
