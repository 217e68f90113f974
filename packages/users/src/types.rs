// ABOUTME: User type definitions
// ABOUTME: Structures for user accounts, settings, and preferences

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tandem_core::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    /// PHC-formatted Argon2id hash. Never serialized to the wire.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub theme: Option<String>,
    pub preferences: Option<serde_json::Value>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "lastLoginAt")]
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Deserialize)]
pub struct UserCreateInput {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: Option<Role>,
}

/// Input for updating an existing user. Role changes go through
/// [`UserStorage::set_role`], not here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdateInput {
    pub name: Option<String>,
    pub theme: Option<String>,
    pub preferences: Option<serde_json::Value>,
}
