//! The provisioning-window impersonation guard.
//!
//! Creating a user through the identity provider briefly signs the browser
//! in as the user being created. While a durable guard record marks that
//! window, any auth-change reporting a different user id is suppressed and
//! the original token pair re-applied instead of being accepted as a
//! session switch. The record expires on its own so a stuck flag can never
//! hijack future sign-ins.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use mostrador_core::{AuthUserId, TokenPair};
use mostrador_events::AuthChange;

/// Bump when the record shape changes; readers drop unknown versions.
pub const PROVISIONING_GUARD_VERSION: u32 = 1;

/// Durable marker for the "creating user" window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningGuard {
    pub version: u32,
    pub original_user_id: AuthUserId,
    pub original_tokens: TokenPair,
    pub created_at: DateTime<Utc>,
}

impl ProvisioningGuard {
    pub fn new(
        original_user_id: AuthUserId,
        original_tokens: TokenPair,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            version: PROVISIONING_GUARD_VERSION,
            original_user_id,
            original_tokens,
            created_at,
        }
    }

    pub fn is_expired(&self, policy: &ImpersonationPolicy, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at) > policy.max_age
    }
}

/// Maximum lifetime of the guard record. 30 seconds unless configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImpersonationPolicy {
    pub max_age: Duration,
}

impl Default for ImpersonationPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::seconds(30),
        }
    }
}

/// What to do with an auth-change while a guard record exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Process the notification normally.
    Accept,
    /// Swallow the notification and re-apply the original tokens.
    Suppress { restore: TokenPair },
    /// The record outlived its window; discard it, then process normally.
    Expired,
}

/// Pure suppression rule over (record, event, now).
pub fn evaluate_guard(
    record: &ProvisioningGuard,
    change: &AuthChange,
    policy: &ImpersonationPolicy,
    now: DateTime<Utc>,
) -> GuardDecision {
    if record.is_expired(policy, now) {
        return GuardDecision::Expired;
    }
    match change.reported_user() {
        Some(reported) if reported != record.original_user_id => GuardDecision::Suppress {
            restore: record.original_tokens.clone(),
        },
        _ => GuardDecision::Accept,
    }
}
