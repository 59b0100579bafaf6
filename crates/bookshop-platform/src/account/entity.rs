//! User Entity
//!
//! Registered account stored in the relational store. Passwords are kept as
//! Argon2id PHC strings; roles are plain strings shared with the JWT claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookshop_common::ROLE_ADMIN;

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,

    /// Unique login name
    pub username: String,

    /// Unique email address
    pub email: String,

    /// Argon2id PHC hash, never the plain password
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Assigned roles
    #[serde(default)]
    pub roles: Vec<String>,

    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            roles: vec![],
            created_at: Utc::now(),
        }
    }

    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    pub fn assign_role(&mut self, role: impl Into<String>) {
        let role = role.into();
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshop_common::ROLE_USER;

    #[test]
    fn test_role_assignment_is_idempotent() {
        let mut user = User::new("bob", "bob@example.com", "$argon2id$fake");
        user.assign_role(ROLE_USER);
        user.assign_role(ROLE_USER);
        assert_eq!(user.roles.len(), 1);
        assert!(user.has_role(ROLE_USER));
        assert!(!user.is_admin());
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = User::new("bob", "bob@example.com", "$argon2id$fake");
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("bob@example.com"));
    }
}
