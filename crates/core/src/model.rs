//! Shared records: directory rows and identity-session values.
//!
//! Directory rows are soft-deleted (an `active` column), never physically
//! removed by this core. Records here are plain data; policy over them lives
//! in `mostrador-auth` and `mostrador-tenancy`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::{AuthUserId, OrganizationId, PermissionId, RoleId, SystemUserId};

/// Bearer session as reported by the identity provider.
///
/// Owned by the provider; this core only reads it. At most one session is
/// current per browser context at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: AuthUserId,
    /// Provider tags for the linked sign-in identities (e.g. "email", "google").
    pub email_identities: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Opaque access/refresh token pair.
///
/// The core never decodes tokens; it only holds them so the provisioning
/// guard can re-apply the original pair after a suppressed session switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    access_token: String,
    refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> DomainResult<Self> {
        let access_token = access_token.into();
        let refresh_token = refresh_token.into();
        if access_token.is_empty() || refresh_token.is_empty() {
            return Err(DomainError::validation("token pair must not be empty"));
        }
        Ok(Self {
            access_token,
            refresh_token,
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }
}

/// A tenant. The isolation boundary for all business data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub active: bool,
}

/// Domain user row, linked to the identity provider by `auth_user_id`.
///
/// A system user belongs to at most one organization at a time. Role
/// assignments live in their own table and are fetched separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemUser {
    pub id: SystemUserId,
    pub auth_user_id: AuthUserId,
    pub organization_id: Option<OrganizationId>,
    pub active: bool,
}

/// RBAC role row. Role id 1 is the distinguished superadmin row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub active: bool,
}

/// A user's assignment of a role (joined with the role row on read).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role: Role,
    pub active: bool,
}

/// Named capability checked per protected route/action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
    pub active: bool,
}

/// Link row granting a permission to a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermission {
    pub role_id: RoleId,
    pub permission_id: PermissionId,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn session_expiry_is_inclusive() {
        let now = Utc::now();
        let session = Session {
            user_id: AuthUserId::new(),
            email_identities: vec!["email".to_string()],
            expires_at: now,
        };
        assert!(session.is_expired(now));
        assert!(!session.is_expired(now - TimeDelta::seconds(1)));
    }

    #[test]
    fn token_pair_rejects_empty_halves() {
        assert!(TokenPair::new("", "refresh").is_err());
        assert!(TokenPair::new("access", "").is_err());
        assert!(TokenPair::new("access", "refresh").is_ok());
    }
}
