//! Grant-set derivation against the directory.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use mostrador_core::{Directory, PermissionId, RoleAssignment, RoleId};

use crate::permissions::PermissionSet;
use crate::superadmin::is_super_admin;

/// Derives [`PermissionSet`]s from role assignments.
///
/// Every directory failure along the way is logged and degrades to an empty
/// contribution; derivation itself never fails. Role visibility may be
/// restricted by row-level policy for non-privileged callers, and a missing
/// role must cost that role's permissions, not the whole render.
pub struct AuthorizationOracle {
    directory: Arc<dyn Directory>,
}

impl AuthorizationOracle {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }

    /// Flatten the caller's active role assignments into a grant set.
    ///
    /// Superadmins get the full active-permission set as it exists in the
    /// directory *at call time*, so a newly activated permission is covered
    /// without a code change. Everyone else gets the deduplicated names
    /// granted through active role→permission links.
    pub async fn granted_permissions(&self, assignments: &[RoleAssignment]) -> PermissionSet {
        let role_names: HashSet<String> = assignments
            .iter()
            .filter(|a| a.active && a.role.active)
            .map(|a| a.role.name.clone())
            .collect();

        if is_super_admin(assignments) {
            let permissions = match self.directory.active_permissions().await {
                Ok(rows) => rows.into_iter().map(|p| p.name).collect(),
                Err(err) => {
                    warn!(error = %err, "failed to fetch the active permission set for a superadmin");
                    HashSet::new()
                }
            };
            return PermissionSet::new(true, permissions, role_names);
        }

        if role_names.is_empty() {
            return PermissionSet::new(false, HashSet::new(), role_names);
        }

        let names: Vec<String> = role_names.iter().cloned().collect();
        let roles = match self.directory.active_roles_by_names(&names).await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(error = %err, "failed to resolve role names, deriving an empty grant set");
                Vec::new()
            }
        };

        let role_ids: Vec<RoleId> = roles.iter().map(|r| r.id).collect();
        if role_ids.is_empty() {
            return PermissionSet::new(false, HashSet::new(), role_names);
        }

        let links = match self.directory.active_role_permissions(&role_ids).await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(error = %err, "failed to fetch role permission links");
                Vec::new()
            }
        };

        let permission_ids: Vec<PermissionId> = {
            let unique: HashSet<PermissionId> =
                links.iter().map(|link| link.permission_id).collect();
            unique.into_iter().collect()
        };
        if permission_ids.is_empty() {
            return PermissionSet::new(false, HashSet::new(), role_names);
        }

        let permissions = match self
            .directory
            .active_permissions_by_ids(&permission_ids)
            .await
        {
            Ok(rows) => rows.into_iter().map(|p| p.name).collect(),
            Err(err) => {
                warn!(error = %err, "failed to fetch permission rows");
                HashSet::new()
            }
        };

        PermissionSet::new(false, permissions, role_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mostrador_core::Role;
    use mostrador_infra::InMemoryDirectory;

    fn assignment(id: i64, name: &str) -> RoleAssignment {
        RoleAssignment {
            role: Role {
                id: RoleId::new(id),
                name: name.to_string(),
                active: true,
            },
            active: true,
        }
    }

    fn directory_with_sales_role() -> InMemoryDirectory {
        let directory = InMemoryDirectory::new();
        directory.insert_role(3, "VENDEDOR", true);
        directory.insert_permission(10, "ventas.ver", true);
        directory.insert_permission(11, "ventas.crear", true);
        directory.insert_permission(12, "reportes.ver", false);
        directory.link_permission(3, 10, true);
        directory.link_permission(3, 11, true);
        directory.link_permission(3, 12, true);
        directory
    }

    #[tokio::test]
    async fn derives_active_permission_names_for_ordinary_roles() {
        let oracle = AuthorizationOracle::new(Arc::new(directory_with_sales_role()));
        let set = oracle.granted_permissions(&[assignment(3, "VENDEDOR")]).await;

        assert!(!set.is_super_admin());
        assert!(set.tiene_permiso("ventas.ver"));
        assert!(set.tiene_permiso("ventas.crear"));
        // Linked but inactive permission is not honored.
        assert!(!set.tiene_permiso("reportes.ver"));
        assert!(set.tiene_rol("VENDEDOR"));
    }

    #[tokio::test]
    async fn missing_role_contributes_nothing_instead_of_failing() {
        let oracle = AuthorizationOracle::new(Arc::new(directory_with_sales_role()));
        let set = oracle
            .granted_permissions(&[assignment(3, "VENDEDOR"), assignment(99, "FANTASMA")])
            .await;

        assert!(set.tiene_permiso("ventas.ver"));
        assert!(!set.tiene_permiso("fantasma.todo"));
    }

    #[tokio::test]
    async fn super_admin_gets_the_full_active_set_at_call_time() {
        let directory = Arc::new(directory_with_sales_role());
        directory.insert_role(1, "SUPERADMIN", true);
        let oracle = AuthorizationOracle::new(directory.clone());
        let admin = [assignment(1, "SUPERADMIN")];

        let set = oracle.granted_permissions(&admin).await;
        assert!(set.is_super_admin());
        assert_eq!(set.permission_names().len(), 2);

        // A permission activated later is covered by a re-derivation.
        directory.insert_permission(13, "compras.ver", true);
        let set = oracle.granted_permissions(&admin).await;
        assert!(set.permission_names().contains("compras.ver"));
        assert_eq!(set.permission_names().len(), 3);
    }

    #[tokio::test]
    async fn directory_outage_degrades_to_an_empty_grant_set() {
        let directory = Arc::new(directory_with_sales_role());
        directory.set_unavailable(true);
        let oracle = AuthorizationOracle::new(directory);

        let set = oracle.granted_permissions(&[assignment(3, "VENDEDOR")]).await;
        assert!(!set.tiene_permiso("ventas.ver"));
        // Role names still come from the assignments already in hand.
        assert!(set.tiene_rol("VENDEDOR"));
    }
}
