//! System user resolution.

use std::sync::Arc;

use tracing::warn;

use mostrador_core::{AuthUserId, Directory, Organization, Role, RoleAssignment, SystemUser};

/// A system user with its organization and role assignments in hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUser {
    pub user: SystemUser,
    /// The membership organization row, fetched as-is. Whether it is usable
    /// (active) is the validator's call, not the resolver's.
    pub organization: Option<Organization>,
    pub assignments: Vec<RoleAssignment>,
}

impl ResolvedUser {
    /// First active role, for single-role call sites. Derived, not a second
    /// source of truth.
    pub fn primary_role(&self) -> Option<&Role> {
        self.assignments
            .iter()
            .find(|a| a.active && a.role.active)
            .map(|a| &a.role)
    }
}

/// Resolves an identity-provider user id to a [`ResolvedUser`].
pub struct SystemUserResolver {
    directory: Arc<dyn Directory>,
}

impl SystemUserResolver {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }

    /// `None` means "no usable domain user": the expected state for a
    /// brand-new identity, and also the degraded outcome when the user
    /// lookup itself fails. Partial failures past that point (organization,
    /// roles) are logged and defaulted, never propagated, so a dangling
    /// organization reference cannot block the whole resolution.
    pub async fn resolve(&self, auth_user_id: AuthUserId) -> Option<ResolvedUser> {
        let user = match self.directory.system_user_by_auth_id(auth_user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return None,
            Err(err) => {
                warn!(%auth_user_id, error = %err, "system user lookup failed, treating as unprovisioned");
                return None;
            }
        };

        let organization = match user.organization_id {
            Some(org_id) => match self.directory.organization(org_id).await {
                Ok(Some(org)) => Some(org),
                Ok(None) => {
                    warn!(%org_id, user_id = %user.id, "dangling organization reference");
                    None
                }
                Err(err) => {
                    warn!(%org_id, error = %err, "organization lookup failed, continuing without one");
                    None
                }
            },
            None => None,
        };

        let assignments = match self.directory.role_assignments_for_user(user.id).await {
            Ok(assignments) => assignments,
            Err(err) => {
                warn!(user_id = %user.id, error = %err, "role lookup failed, continuing with no roles");
                Vec::new()
            }
        };

        Some(ResolvedUser {
            user,
            organization,
            assignments,
        })
    }
}
