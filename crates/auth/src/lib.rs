//! `mostrador-auth` — authorization oracle for the admin console.
//!
//! Decides, for a resolved system user, whether they are a superadmin and
//! which permission names their active roles grant. The predicate surface
//! (`tiene_permiso` and friends) is pure and operates over an immutable
//! [`PermissionSet`]; derivation is the only part that touches the directory.

pub mod oracle;
pub mod permissions;
pub mod superadmin;

pub use oracle::AuthorizationOracle;
pub use permissions::{PermissionName, PermissionSet};
pub use superadmin::{SUPERADMIN_ROLE_ID, SUPERADMIN_ROLE_NAMES, is_super_admin};
