//! The superadmin predicate.
//!
//! Superadmin status bypasses per-permission and per-organization checks
//! everywhere, so this is the single place that defines it.

use mostrador_core::{RoleAssignment, RoleId};

/// The distinguished role row id that confers global authorization.
pub const SUPERADMIN_ROLE_ID: RoleId = RoleId::new(1);

/// Role names conferring global authorization, compared case-insensitively.
///
/// "ADMIN" is a legacy alias carried over from earlier deployments where the
/// two tiers were collapsed. Retiring it is a one-line change here.
pub const SUPERADMIN_ROLE_NAMES: [&str; 2] = ["SUPERADMIN", "ADMIN"];

/// True iff any active assignment's active role is the superadmin role,
/// either by name or by the distinguished row id.
pub fn is_super_admin(assignments: &[RoleAssignment]) -> bool {
    assignments.iter().any(|assignment| {
        assignment.active
            && assignment.role.active
            && (assignment.role.id == SUPERADMIN_ROLE_ID
                || SUPERADMIN_ROLE_NAMES
                    .iter()
                    .any(|name| assignment.role.name.eq_ignore_ascii_case(name)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mostrador_core::Role;

    fn assignment(id: i64, name: &str, role_active: bool, active: bool) -> RoleAssignment {
        RoleAssignment {
            role: Role {
                id: RoleId::new(id),
                name: name.to_string(),
                active: role_active,
            },
            active,
        }
    }

    #[test]
    fn empty_role_set_is_not_super_admin() {
        assert!(!is_super_admin(&[]));
    }

    #[test]
    fn matches_by_name_case_insensitively() {
        assert!(is_super_admin(&[assignment(7, "SuperAdmin", true, true)]));
        assert!(is_super_admin(&[assignment(7, "superadmin", true, true)]));
        assert!(is_super_admin(&[assignment(7, "admin", true, true)]));
    }

    #[test]
    fn matches_by_distinguished_row_id() {
        assert!(is_super_admin(&[assignment(1, "GERENTE", true, true)]));
    }

    #[test]
    fn inactive_assignment_or_role_does_not_count() {
        assert!(!is_super_admin(&[assignment(1, "SUPERADMIN", true, false)]));
        assert!(!is_super_admin(&[assignment(1, "SUPERADMIN", false, true)]));
    }

    #[test]
    fn ordinary_roles_do_not_count() {
        let roles = [
            assignment(3, "VENDEDOR", true, true),
            assignment(4, "ALMACEN", true, true),
        ];
        assert!(!is_super_admin(&roles));
    }

    #[test]
    fn one_qualifying_assignment_among_many_is_enough() {
        let roles = [
            assignment(3, "VENDEDOR", true, true),
            assignment(1, "GERENTE", true, true),
        ];
        assert!(is_super_admin(&roles));
    }
}
