//! `Directory` — the read port onto the relational data store.
//!
//! The data store itself is an external collaborator; this trait pins down
//! exactly the row-filtered reads the core needs. All lookups respect the
//! `active` soft-delete column. Implementations live in `mostrador-infra`
//! (in-memory for tests/dev, Postgres for deployments).

use async_trait::async_trait;
use thiserror::Error;

use crate::id::{AuthUserId, OrganizationId, PermissionId, RoleId, SystemUserId};
use crate::model::{Organization, Permission, Role, RoleAssignment, RolePermission, SystemUser};

/// Store-level failure.
///
/// Callers on the guarded render path never propagate these; they log and
/// degrade to the conservative outcome (see the resolver and validator).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("data store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),
}

/// Row-filtered reads over the logical tables.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Look up the active system user linked to an identity-provider user.
    async fn system_user_by_auth_id(
        &self,
        auth_user_id: AuthUserId,
    ) -> Result<Option<SystemUser>, StoreError>;

    /// Fetch an organization row by id (active or not; callers check `active`).
    async fn organization(&self, id: OrganizationId) -> Result<Option<Organization>, StoreError>;

    /// All active organizations (superadmin tenant picker).
    async fn active_organizations(&self) -> Result<Vec<Organization>, StoreError>;

    /// Active role assignments for a user, joined with their role rows.
    async fn role_assignments_for_user(
        &self,
        user_id: SystemUserId,
    ) -> Result<Vec<RoleAssignment>, StoreError>;

    /// Active roles matching the given names exactly.
    async fn active_roles_by_names(&self, names: &[String]) -> Result<Vec<Role>, StoreError>;

    /// Active role→permission links for the given role ids.
    async fn active_role_permissions(
        &self,
        role_ids: &[RoleId],
    ) -> Result<Vec<RolePermission>, StoreError>;

    /// Active permission rows for the given ids.
    async fn active_permissions_by_ids(
        &self,
        ids: &[PermissionId],
    ) -> Result<Vec<Permission>, StoreError>;

    /// Every currently active permission (superadmin grant set).
    async fn active_permissions(&self) -> Result<Vec<Permission>, StoreError>;
}
