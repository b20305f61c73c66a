//! Strongly-typed identifiers used across the console core.
//!
//! The identity provider keys its users by UUID; directory rows use `i64`
//! primary keys. Both kinds are opaque newtypes so a role id can never be
//! passed where an organization id is expected.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identity-provider user id (the subject of the bearer session).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthUserId(Uuid);

impl AuthUserId {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
    /// for determinism.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AuthUserId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for AuthUserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for AuthUserId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<AuthUserId> for Uuid {
    fn from(value: AuthUserId) -> Self {
        value.0
    }
}

impl FromStr for AuthUserId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s)
            .map_err(|e| DomainError::invalid_id(format!("AuthUserId: {}", e)))?;
        Ok(Self(uuid))
    }
}

macro_rules! impl_row_id {
    ($t:ident, $name:literal) => {
        /// Directory row identifier.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(i64);

        impl $t {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value: i64 = s
                    .parse()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(value))
            }
        }
    };
}

impl_row_id!(SystemUserId, "SystemUserId");
impl_row_id!(OrganizationId, "OrganizationId");
impl_row_id!(RoleId, "RoleId");
impl_row_id!(PermissionId, "PermissionId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_id_round_trips_through_str() {
        let id: OrganizationId = "42".parse().unwrap();
        assert_eq!(id, OrganizationId::new(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn row_id_rejects_garbage() {
        let err = "not-a-number".parse::<RoleId>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
    }

    #[test]
    fn auth_user_id_rejects_malformed_uuid() {
        let err = "xyz".parse::<AuthUserId>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
    }
}
