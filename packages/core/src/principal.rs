use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Role of an authenticated actor. Closed set; unknown role strings are
/// rejected at the boundary rather than carried through as free-form text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    ProjectManager,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::ProjectManager => "project_manager",
            Role::Client => "client",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Admin or project manager. Says nothing about which projects a
    /// manager may touch; that check needs the project row.
    pub fn is_manager_or_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::ProjectManager)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Client
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("Unknown role: {0}")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "project_manager" => Ok(Role::ProjectManager),
            "client" => Ok(Role::Client),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// The authenticated actor performing a request, resolved from a verified
/// credential. Carries exactly what authorization decisions need.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Admin, Role::ProjectManager, Role::Client] {
            let parsed: Role = role.as_str().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!("superuser".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
        // Case-sensitive by design
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_membership_helpers() {
        assert!(Role::Admin.is_admin());
        assert!(Role::Admin.is_manager_or_admin());
        assert!(!Role::ProjectManager.is_admin());
        assert!(Role::ProjectManager.is_manager_or_admin());
        assert!(!Role::Client.is_manager_or_admin());
    }
}
