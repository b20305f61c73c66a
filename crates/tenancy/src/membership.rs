//! Organization membership validation.

use std::sync::Arc;

use tracing::debug;

use mostrador_core::{AuthUserId, Directory, Organization};

use crate::resolver::{ResolvedUser, SystemUserResolver};

/// Why a membership check came back invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipReason {
    /// No domain user exists for this identity yet; onboarding applies.
    NewUser,
    /// The user exists but has no organization, or its organization is
    /// deactivated.
    NoActiveOrganization,
}

impl core::fmt::Display for MembershipReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MembershipReason::NewUser => write!(f, "new user, needs onboarding"),
            MembershipReason::NoActiveOrganization => write!(f, "no active organization"),
        }
    }
}

/// Outcome of a membership check. Value-typed on purpose: this runs on the
/// hot path of every protected render and must never throw.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipCheck {
    pub valid: bool,
    /// The resolved user, when one exists (also present on some invalid
    /// outcomes, e.g. a member of a deactivated organization).
    pub user: Option<ResolvedUser>,
    /// The active membership organization; `None` unless `valid`.
    pub organization: Option<Organization>,
    pub reason: Option<MembershipReason>,
}

impl MembershipCheck {
    fn valid(user: ResolvedUser, organization: Organization) -> Self {
        Self {
            valid: true,
            user: Some(user),
            organization: Some(organization),
            reason: None,
        }
    }

    fn invalid(reason: MembershipReason, user: Option<ResolvedUser>) -> Self {
        Self {
            valid: false,
            user,
            organization: None,
            reason: Some(reason),
        }
    }
}

/// Decides whether an identity currently has a usable organization
/// membership, distinguishing "new user" from "deprovisioned or disabled".
pub struct MembershipValidator {
    resolver: SystemUserResolver,
}

impl MembershipValidator {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self {
            resolver: SystemUserResolver::new(directory),
        }
    }

    /// Exhaustive policy:
    ///
    /// | system user | organization ref | organization active | result |
    /// |---|---|---|---|
    /// | absent | — | — | invalid, `NewUser` |
    /// | present | none | — | invalid, `NoActiveOrganization` |
    /// | present | present | false | invalid, `NoActiveOrganization` |
    /// | present | present | true | valid |
    ///
    /// Fetch failures upstream already degraded to the absent/none rows, so
    /// an outage reads as "unprovisioned" rather than bricking navigation.
    pub async fn validate(&self, auth_user_id: AuthUserId) -> MembershipCheck {
        let Some(resolved) = self.resolver.resolve(auth_user_id).await else {
            debug!(%auth_user_id, "membership check: no system user");
            return MembershipCheck::invalid(MembershipReason::NewUser, None);
        };

        match resolved.organization.clone() {
            None => MembershipCheck::invalid(MembershipReason::NoActiveOrganization, Some(resolved)),
            Some(org) if !org.active => {
                debug!(org_id = %org.id, "membership check: organization deactivated");
                MembershipCheck::invalid(MembershipReason::NoActiveOrganization, Some(resolved))
            }
            Some(org) => MembershipCheck::valid(resolved, org),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mostrador_infra::InMemoryDirectory;

    #[tokio::test]
    async fn absent_user_is_new_user() {
        let validator = MembershipValidator::new(Arc::new(InMemoryDirectory::new()));
        let check = validator.validate(AuthUserId::new()).await;

        assert!(!check.valid);
        assert_eq!(check.reason, Some(MembershipReason::NewUser));
        assert!(check.user.is_none());
        assert!(check.organization.is_none());
    }

    #[tokio::test]
    async fn user_without_organization_is_invalid() {
        let directory = InMemoryDirectory::new();
        let auth_id = AuthUserId::new();
        directory.insert_user(auth_id, None, true);

        let validator = MembershipValidator::new(Arc::new(directory));
        let check = validator.validate(auth_id).await;

        assert!(!check.valid);
        assert_eq!(check.reason, Some(MembershipReason::NoActiveOrganization));
        assert!(check.user.is_some());
    }

    #[tokio::test]
    async fn deactivated_organization_is_invalid_never_valid() {
        let directory = InMemoryDirectory::new();
        let auth_id = AuthUserId::new();
        directory.insert_organization(5, "Cerrada SA", false);
        directory.insert_user(auth_id, Some(5), true);

        let validator = MembershipValidator::new(Arc::new(directory));
        let check = validator.validate(auth_id).await;

        assert!(!check.valid);
        assert_eq!(check.reason, Some(MembershipReason::NoActiveOrganization));
        assert!(check.organization.is_none());
    }

    #[tokio::test]
    async fn active_membership_is_valid() {
        let directory = InMemoryDirectory::new();
        let auth_id = AuthUserId::new();
        directory.insert_organization(5, "Ferretería Centro", true);
        directory.insert_user(auth_id, Some(5), true);

        let validator = MembershipValidator::new(Arc::new(directory));
        let check = validator.validate(auth_id).await;

        assert!(check.valid);
        assert!(check.reason.is_none());
        assert_eq!(check.organization.unwrap().id.get(), 5);
    }

    #[tokio::test]
    async fn directory_outage_degrades_to_new_user() {
        let directory = InMemoryDirectory::new();
        let auth_id = AuthUserId::new();
        directory.insert_organization(5, "Ferretería Centro", true);
        directory.insert_user(auth_id, Some(5), true);
        directory.set_unavailable(true);

        let validator = MembershipValidator::new(Arc::new(directory));
        let check = validator.validate(auth_id).await;

        assert!(!check.valid);
        assert_eq!(check.reason, Some(MembershipReason::NewUser));
    }
}
