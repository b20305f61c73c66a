//! The guard chain evaluator.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;
use tracing::{debug, warn};

use mostrador_core::{AuthUserId, IdentityProvider};
use mostrador_session::SessionContext;

use crate::state::{GuardState, RouteRequirement};

/// Watchdog timeout per checking state. 8 seconds unless configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardConfig {
    pub watchdog: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            watchdog: Duration::from_secs(8),
        }
    }
}

/// Evaluates the guard chain for one protected navigation.
///
/// Evaluation is idempotent: with unchanged inputs a re-run lands on the
/// same terminal state (the second pass rides the resolution cache).
pub struct RouteGuard {
    identity: Arc<dyn IdentityProvider>,
    context: Arc<SessionContext>,
    config: GuardConfig,
}

impl RouteGuard {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        context: Arc<SessionContext>,
        config: GuardConfig,
    ) -> Self {
        Self {
            identity,
            context,
            config,
        }
    }

    /// Run the chain to a terminal state.
    pub async fn evaluate(&self, requirement: &RouteRequirement) -> GuardState {
        let mut state = GuardState::CheckingAuth;
        let mut user: Option<AuthUserId> = None;
        loop {
            let next = self.step(state, &mut user, requirement).await;
            debug!(from = ?state, to = ?next, "guard transition");
            if next.is_terminal() {
                return next;
            }
            state = next;
        }
    }

    /// The one authoritative transition function.
    async fn step(
        &self,
        state: GuardState,
        user: &mut Option<AuthUserId>,
        requirement: &RouteRequirement,
    ) -> GuardState {
        match state {
            GuardState::CheckingAuth => {
                match timeout(self.config.watchdog, self.identity.current_user()).await {
                    Ok(Ok(Some(user_id))) => {
                        *user = Some(user_id);
                        GuardState::CheckingOrg
                    }
                    Ok(Ok(None)) => GuardState::Unauthenticated,
                    Ok(Err(err)) => {
                        // Provider error: fail closed.
                        warn!(error = %err, "auth check failed, treating as unauthenticated");
                        GuardState::Unauthenticated
                    }
                    Err(_) => match self.requery_session().await {
                        Some(user_id) => {
                            *user = Some(user_id);
                            GuardState::CheckingOrg
                        }
                        None => GuardState::Unauthenticated,
                    },
                }
            }

            GuardState::CheckingOrg => {
                let Some(user_id) = *user else {
                    return GuardState::Unauthenticated;
                };
                match timeout(self.config.watchdog, self.context.ensure_resolved(user_id)).await {
                    Ok(snapshot) => {
                        // Superadmins bypass membership entirely.
                        if snapshot.is_super_admin || snapshot.membership_valid {
                            GuardState::CheckingPermission
                        } else {
                            GuardState::Onboarding
                        }
                    }
                    // Membership unknown after the watchdog fired: a live
                    // session degrades to "treat as unprovisioned".
                    Err(_) => match self.requery_session().await {
                        Some(_) => GuardState::Onboarding,
                        None => GuardState::Unauthenticated,
                    },
                }
            }

            GuardState::CheckingPermission => {
                let Some(user_id) = *user else {
                    return GuardState::Unauthenticated;
                };
                match timeout(self.config.watchdog, self.context.ensure_resolved(user_id)).await {
                    Ok(snapshot) => {
                        if requirement.satisfied_by(&snapshot.permissions) {
                            GuardState::Granted
                        } else {
                            GuardState::Denied
                        }
                    }
                    // Grants unknown: fail closed, keep the session.
                    Err(_) => match self.requery_session().await {
                        Some(_) => GuardState::Denied,
                        None => GuardState::Unauthenticated,
                    },
                }
            }

            terminal => terminal,
        }
    }

    /// The watchdog's escape hatch: ask the provider directly instead of
    /// waiting on whatever got stuck.
    async fn requery_session(&self) -> Option<AuthUserId> {
        warn!("guard watchdog fired, re-querying the session directly");
        match self.identity.session().await {
            Ok(Some(session)) if !session.is_expired(Utc::now()) => Some(session.user_id),
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, "direct session re-query failed, treating as unauthenticated");
                None
            }
        }
    }
}
