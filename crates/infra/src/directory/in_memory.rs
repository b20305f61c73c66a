//! In-memory directory.
//!
//! Backs tests and local development. Rows live in `RwLock`'d tables and
//! honor the same `active` soft-delete semantics as the SQL adapter. The
//! `unavailable` switch simulates a data-store outage so degraded-path
//! behavior is testable.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;

use mostrador_core::{
    AuthUserId, Directory, Organization, OrganizationId, Permission, PermissionId, Role,
    RoleAssignment, RoleId, RolePermission, StoreError, SystemUser, SystemUserId,
};

#[derive(Debug, Clone, Copy)]
struct AssignmentRow {
    user_id: SystemUserId,
    role_id: RoleId,
    active: bool,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<SystemUser>,
    organizations: HashMap<OrganizationId, Organization>,
    roles: HashMap<RoleId, Role>,
    permissions: HashMap<PermissionId, Permission>,
    assignments: Vec<AssignmentRow>,
    role_permissions: Vec<RolePermission>,
}

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
    next_user_id: AtomicI64,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with [`StoreError::Unavailable`] until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn insert_organization(&self, id: i64, name: &str, active: bool) {
        let id = OrganizationId::new(id);
        self.write().organizations.insert(
            id,
            Organization {
                id,
                name: name.to_string(),
                active,
            },
        );
    }

    pub fn set_organization_active(&self, id: i64, active: bool) {
        if let Some(org) = self.write().organizations.get_mut(&OrganizationId::new(id)) {
            org.active = active;
        }
    }

    pub fn insert_user(
        &self,
        auth_user_id: AuthUserId,
        organization_id: Option<i64>,
        active: bool,
    ) -> SystemUserId {
        let id = SystemUserId::new(self.next_user_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.write().users.push(SystemUser {
            id,
            auth_user_id,
            organization_id: organization_id.map(OrganizationId::new),
            active,
        });
        id
    }

    pub fn set_user_organization(&self, user_id: SystemUserId, organization_id: Option<i64>) {
        if let Some(user) = self.write().users.iter_mut().find(|u| u.id == user_id) {
            user.organization_id = organization_id.map(OrganizationId::new);
        }
    }

    pub fn insert_role(&self, id: i64, name: &str, active: bool) {
        let id = RoleId::new(id);
        self.write().roles.insert(
            id,
            Role {
                id,
                name: name.to_string(),
                active,
            },
        );
    }

    pub fn assign_role(&self, user_id: SystemUserId, role_id: i64, active: bool) {
        self.write().assignments.push(AssignmentRow {
            user_id,
            role_id: RoleId::new(role_id),
            active,
        });
    }

    pub fn insert_permission(&self, id: i64, name: &str, active: bool) {
        let id = PermissionId::new(id);
        self.write().permissions.insert(
            id,
            Permission {
                id,
                name: name.to_string(),
                active,
            },
        );
    }

    pub fn link_permission(&self, role_id: i64, permission_id: i64, active: bool) {
        self.write().role_permissions.push(RolePermission {
            role_id: RoleId::new(role_id),
            permission_id: PermissionId::new(permission_id),
            active,
        });
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tables> {
        match self.tables.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn system_user_by_auth_id(
        &self,
        auth_user_id: AuthUserId,
    ) -> Result<Option<SystemUser>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .users
            .iter()
            .find(|u| u.auth_user_id == auth_user_id && u.active)
            .cloned())
    }

    async fn organization(&self, id: OrganizationId) -> Result<Option<Organization>, StoreError> {
        let tables = self.read()?;
        Ok(tables.organizations.get(&id).cloned())
    }

    async fn active_organizations(&self) -> Result<Vec<Organization>, StoreError> {
        let tables = self.read()?;
        let mut orgs: Vec<Organization> = tables
            .organizations
            .values()
            .filter(|o| o.active)
            .cloned()
            .collect();
        orgs.sort_by_key(|o| o.id);
        Ok(orgs)
    }

    async fn role_assignments_for_user(
        &self,
        user_id: SystemUserId,
    ) -> Result<Vec<RoleAssignment>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .assignments
            .iter()
            .filter(|row| row.user_id == user_id && row.active)
            .filter_map(|row| {
                tables.roles.get(&row.role_id).map(|role| RoleAssignment {
                    role: role.clone(),
                    active: row.active,
                })
            })
            .collect())
    }

    async fn active_roles_by_names(&self, names: &[String]) -> Result<Vec<Role>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .roles
            .values()
            .filter(|role| role.active && names.iter().any(|n| n == &role.name))
            .cloned()
            .collect())
    }

    async fn active_role_permissions(
        &self,
        role_ids: &[RoleId],
    ) -> Result<Vec<RolePermission>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .role_permissions
            .iter()
            .filter(|link| link.active && role_ids.contains(&link.role_id))
            .copied()
            .collect())
    }

    async fn active_permissions_by_ids(
        &self,
        ids: &[PermissionId],
    ) -> Result<Vec<Permission>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .permissions
            .values()
            .filter(|p| p.active && ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn active_permissions(&self) -> Result<Vec<Permission>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .permissions
            .values()
            .filter(|p| p.active)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn soft_deleted_rows_are_filtered() {
        let directory = InMemoryDirectory::new();
        let auth_id = AuthUserId::new();
        directory.insert_user(auth_id, None, false);
        directory.insert_organization(1, "Activa", true);
        directory.insert_organization(2, "Cerrada", false);
        directory.insert_permission(1, "ventas.ver", true);
        directory.insert_permission(2, "ventas.anular", false);

        assert!(directory.system_user_by_auth_id(auth_id).await.unwrap().is_none());
        assert_eq!(directory.active_organizations().await.unwrap().len(), 1);
        assert_eq!(directory.active_permissions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn outage_switch_fails_every_read() {
        let directory = InMemoryDirectory::new();
        directory.insert_organization(1, "Activa", true);
        directory.set_unavailable(true);

        assert!(matches!(
            directory.active_organizations().await,
            Err(StoreError::Unavailable(_))
        ));

        directory.set_unavailable(false);
        assert_eq!(directory.active_organizations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn assignments_join_role_rows() {
        let directory = InMemoryDirectory::new();
        let auth_id = AuthUserId::new();
        let user_id = directory.insert_user(auth_id, None, true);
        directory.insert_role(3, "VENDEDOR", true);
        directory.assign_role(user_id, 3, true);
        directory.assign_role(user_id, 4, true); // role row missing

        let assignments = directory.role_assignments_for_user(user_id).await.unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].role.name, "VENDEDOR");
    }
}
