//! Guard states and per-route permission requirements.

use serde::{Deserialize, Serialize};

use mostrador_auth::{PermissionName, PermissionSet};

/// The states a protected navigation moves through.
///
/// `CheckingAuth → (Unauthenticated | CheckingOrg) → (Onboarding |
/// CheckingPermission) → (Denied | Granted)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardState {
    CheckingAuth,
    /// Terminal: redirect to sign-in.
    Unauthenticated,
    CheckingOrg,
    /// Terminal: blocking prompt for an authenticated identity with no
    /// usable membership. Protected children keep rendering underneath so
    /// a granted membership is detectable without a hard navigation.
    Onboarding,
    CheckingPermission,
    /// Terminal: access denied, with a "go back" affordance. No redirect,
    /// preserving browser history.
    Denied,
    /// Terminal: render the route's children.
    Granted,
}

impl GuardState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GuardState::Unauthenticated
                | GuardState::Onboarding
                | GuardState::Denied
                | GuardState::Granted
        )
    }

    pub fn renders_children(&self) -> bool {
        matches!(self, GuardState::Granted | GuardState::Onboarding)
    }

    pub fn redirects_to_sign_in(&self) -> bool {
        matches!(self, GuardState::Unauthenticated)
    }
}

/// What a route demands of the caller's grant set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteRequirement {
    /// Authentication and membership only.
    None,
    Permission(PermissionName),
    AnyOf(Vec<PermissionName>),
    AllOf(Vec<PermissionName>),
}

impl RouteRequirement {
    pub fn permission(name: impl Into<std::borrow::Cow<'static, str>>) -> Self {
        Self::Permission(PermissionName::new(name))
    }

    pub fn satisfied_by(&self, permissions: &PermissionSet) -> bool {
        match self {
            RouteRequirement::None => true,
            RouteRequirement::Permission(name) => permissions.tiene_permiso(name.as_str()),
            RouteRequirement::AnyOf(names) => permissions.tiene_algun_permiso(names),
            RouteRequirement::AllOf(names) => permissions.tiene_todos_los_permisos(names),
        }
    }
}
