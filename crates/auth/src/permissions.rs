//! Permission names and the derived grant set.

use std::borrow::Cow;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "ventas.ver"). There is
/// no wildcard value: the superadmin grant set is fetched from the
/// directory, never spelled as `"*"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionName(Cow<'static, str>);

impl PermissionName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PermissionName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PermissionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The flattened grant set for one resolved user.
///
/// Immutable once derived; the session context swaps whole sets on identity
/// change. Every predicate short-circuits to `true` for superadmins.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PermissionSet {
    super_admin: bool,
    permissions: HashSet<String>,
    roles: HashSet<String>,
}

impl PermissionSet {
    pub fn new(
        super_admin: bool,
        permissions: HashSet<String>,
        roles: HashSet<String>,
    ) -> Self {
        Self {
            super_admin,
            permissions,
            roles,
        }
    }

    /// The grant set of an unauthenticated or unprovisioned caller.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_super_admin(&self) -> bool {
        self.super_admin
    }

    pub fn permission_names(&self) -> &HashSet<String> {
        &self.permissions
    }

    pub fn tiene_permiso(&self, name: &str) -> bool {
        self.super_admin || self.permissions.contains(name)
    }

    pub fn tiene_algun_permiso<S: AsRef<str>>(&self, names: &[S]) -> bool {
        self.super_admin || names.iter().any(|n| self.permissions.contains(n.as_ref()))
    }

    pub fn tiene_todos_los_permisos<S: AsRef<str>>(&self, names: &[S]) -> bool {
        self.super_admin || names.iter().all(|n| self.permissions.contains(n.as_ref()))
    }

    pub fn tiene_rol(&self, name: &str) -> bool {
        self.super_admin || self.roles.contains(name)
    }

    pub fn tiene_algun_rol<S: AsRef<str>>(&self, names: &[S]) -> bool {
        self.super_admin || names.iter().any(|n| self.roles.contains(n.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn granted(perms: &[&str]) -> PermissionSet {
        PermissionSet::new(false, set_of(perms), set_of(&["VENDEDOR"]))
    }

    #[test]
    fn empty_set_denies_everything() {
        let set = PermissionSet::empty();
        assert!(!set.tiene_permiso("ventas.ver"));
        assert!(!set.tiene_algun_permiso(&["ventas.ver", "productos.ver"]));
        assert!(!set.tiene_rol("VENDEDOR"));
    }

    #[test]
    fn membership_predicates() {
        let set = granted(&["ventas.ver", "productos.ver"]);
        assert!(set.tiene_permiso("ventas.ver"));
        assert!(!set.tiene_permiso("ventas.crear"));
        assert!(set.tiene_algun_permiso(&["ventas.crear", "productos.ver"]));
        assert!(set.tiene_todos_los_permisos(&["ventas.ver", "productos.ver"]));
        assert!(!set.tiene_todos_los_permisos(&["ventas.ver", "ventas.crear"]));
        assert!(set.tiene_rol("VENDEDOR"));
        assert!(set.tiene_algun_rol(&["ALMACEN", "VENDEDOR"]));
        assert!(!set.tiene_algun_rol(&["ALMACEN"]));
    }

    #[test]
    fn super_admin_short_circuits_every_predicate() {
        let set = PermissionSet::new(true, HashSet::new(), HashSet::new());
        assert!(set.tiene_permiso("anything.at.all"));
        assert!(set.tiene_algun_permiso(&["a", "b"]));
        assert!(set.tiene_todos_los_permisos(&["a", "b"]));
        assert!(set.tiene_rol("whatever"));
        assert!(set.tiene_algun_rol(&["whatever"]));
    }

    #[test]
    fn vacuous_all_is_true_vacuous_any_is_false() {
        let set = granted(&["ventas.ver"]);
        let none: &[&str] = &[];
        assert!(set.tiene_todos_los_permisos(none));
        assert!(!set.tiene_algun_permiso(none));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// `tiene_todos_los_permisos(P)` implies `tiene_algun_permiso(P)`
            /// for any non-empty P, for any grant set.
            #[test]
            fn todos_implies_alguno(
                granted in proptest::collection::hash_set("[a-z]{1,6}\\.[a-z]{1,6}", 0..8),
                asked in proptest::collection::vec("[a-z]{1,6}\\.[a-z]{1,6}", 1..6),
                super_admin in any::<bool>(),
            ) {
                let set = PermissionSet::new(super_admin, granted, HashSet::new());
                if set.tiene_todos_los_permisos(&asked) {
                    prop_assert!(set.tiene_algun_permiso(&asked));
                }
            }

            /// A single-element query behaves identically across the three
            /// permission predicates.
            #[test]
            fn single_element_queries_agree(
                granted in proptest::collection::hash_set("[a-z]{1,6}", 0..8),
                asked in "[a-z]{1,6}",
            ) {
                let set = PermissionSet::new(false, granted, HashSet::new());
                let one = [asked.as_str()];
                prop_assert_eq!(set.tiene_permiso(&asked), set.tiene_algun_permiso(&one));
                prop_assert_eq!(set.tiene_permiso(&asked), set.tiene_todos_los_permisos(&one));
            }
        }
    }
}
