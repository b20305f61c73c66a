//! The process-wide session/organization context.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};

use mostrador_auth::{AuthorizationOracle, PermissionSet};
use mostrador_core::{
    AuthUserId, Directory, IdentityError, IdentityProvider, Organization, StorageError, StoreError,
    TokenPair,
};
use mostrador_events::{AuthChange, AuthEventKind};
use mostrador_tenancy::{MembershipReason, MembershipValidator, ResolvedUser};

use crate::cache::{ResolutionCache, ResolutionSnapshot};
use crate::impersonation::{GuardDecision, ImpersonationPolicy, ProvisioningGuard, evaluate_guard};
use crate::storage::{RecordStore, SessionHint, ViewedOrganizationRecord};

/// Tunables for the session core. Cache staleness lives on the injected
/// [`ResolutionCache`](crate::cache::ResolutionCache) itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionConfig {
    pub impersonation: ImpersonationPolicy,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("no authenticated session")]
    NoSession,

    #[error("only superadmins can enter another organization's view")]
    NotSuperAdmin,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// What screens read. Cloned out whole so readers never observe a torn
/// update.
#[derive(Debug, Clone, Default)]
pub struct ContextSnapshot {
    pub usuario: Option<ResolvedUser>,
    /// The organization whose data is on screen: a superadmin's viewed
    /// organization when one is active, else the user's own membership.
    pub organization: Option<Organization>,
    /// The membership organization, kept apart so the UI can tell
    /// impersonation from membership.
    pub organizacion_original: Option<Organization>,
    pub permissions: PermissionSet,
    pub is_super_admin: bool,
    pub membership_valid: bool,
    pub membership_reason: Option<MembershipReason>,
    pub loading: bool,
    pub error: Option<String>,
}

struct ContextState {
    /// Bumped on every trigger; in-flight resolutions carry the epoch they
    /// started under and discard themselves when it moved.
    epoch: u64,
    current_user: Option<AuthUserId>,
    snapshot: ContextSnapshot,
}

impl ContextState {
    fn new() -> Self {
        Self {
            epoch: 0,
            current_user: None,
            snapshot: ContextSnapshot {
                loading: true,
                ..ContextSnapshot::default()
            },
        }
    }
}

/// Single source of truth for the authenticated user and the resolved
/// organization. Re-derives on explicit triggers only; never polls.
pub struct SessionContext {
    identity: Arc<dyn IdentityProvider>,
    directory: Arc<dyn Directory>,
    validator: MembershipValidator,
    oracle: AuthorizationOracle,
    records: RecordStore,
    cache: Arc<ResolutionCache>,
    config: SessionConfig,
    state: Mutex<ContextState>,
}

impl SessionContext {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        directory: Arc<dyn Directory>,
        records: RecordStore,
        cache: Arc<ResolutionCache>,
        config: SessionConfig,
    ) -> Self {
        Self {
            identity,
            validator: MembershipValidator::new(directory.clone()),
            oracle: AuthorizationOracle::new(directory.clone()),
            directory,
            records,
            cache,
            config,
            state: Mutex::new(ContextState::new()),
        }
    }

    /// Current state, as one consistent value.
    pub fn snapshot(&self) -> ContextSnapshot {
        self.lock_state().snapshot.clone()
    }

    // ── triggers ─────────────────────────────────────────────────────────

    /// Initial mount. Prefers the volatile session hint over a full session
    /// fetch; falls back to asking the provider.
    pub async fn bootstrap(&self) {
        let now = Utc::now();

        if let Some(hint) = self.records.session_hint() {
            if !hint.is_expired(now) {
                debug!(user_id = %hint.user_id, "bootstrapping from session hint");
                self.resolve_for(hint.user_id, false).await;
                return;
            }
            let _ = self.records.clear_session_hint();
        }

        match self.identity.session().await {
            Ok(Some(session)) if !session.is_expired(now) => {
                if let Err(err) = self
                    .records
                    .put_session_hint(&SessionHint::new(session.user_id, session.expires_at))
                {
                    warn!(error = %err, "failed to persist session hint");
                }
                self.resolve_for(session.user_id, false).await;
            }
            Ok(_) => self.apply_signed_out_state(None),
            Err(err) => {
                warn!(error = %err, "session fetch failed on mount, treating as unauthenticated");
                self.apply_signed_out_state(Some(err.to_string()));
            }
        }
    }

    /// One auth-change notification from the internal bus.
    pub async fn handle_auth_change(&self, change: AuthChange) {
        let now = Utc::now();

        if let Some(guard) = self.records.provisioning_guard() {
            match evaluate_guard(&guard, &change, &self.config.impersonation, now) {
                GuardDecision::Suppress { restore } => {
                    warn!(kind = ?change.kind, "suppressing session switch during user provisioning");
                    if let Err(err) = self.identity.apply_tokens(&restore).await {
                        warn!(error = %err, "failed to re-apply the original token pair");
                    }
                    return;
                }
                GuardDecision::Expired => {
                    debug!("provisioning guard outlived its window, discarding");
                    let _ = self.records.clear_provisioning_guard();
                }
                GuardDecision::Accept => {}
            }
        }

        match change.kind {
            AuthEventKind::SignedOut => self.apply_signed_out_state(None),
            AuthEventKind::SignedIn | AuthEventKind::TokenRefreshed => {
                match change.reported_user() {
                    // Rotation may carry changed claims, so neither kind
                    // trusts the cache.
                    Some(user_id) => self.resolve_for(user_id, true).await,
                    None => warn!(kind = ?change.kind, "auth change without a session, ignoring"),
                }
            }
            AuthEventKind::InitialSession => match change.reported_user() {
                // Fires on every tab focus; an unexpired cache entry for
                // the same user makes this a no-op.
                Some(user_id) => self.resolve_for(user_id, false).await,
                // The provider restored nothing; any leftover viewed
                // organization has outlived its session.
                None => self.apply_signed_out_state(None),
            },
        }
    }

    /// Explicit re-derivation after a mutation that could change membership
    /// or grants. Bypasses the cache.
    pub async fn refresh(&self) {
        let current = self.lock_state().current_user;
        match current {
            Some(user_id) => {
                self.cache.invalidate_user(user_id);
                self.resolve_for(user_id, true).await;
            }
            None => self.bootstrap().await,
        }
    }

    // ── resolution ───────────────────────────────────────────────────────

    /// Make sure state reflects `auth_user_id` (cache permitting) and hand
    /// back the resulting snapshot. The guard chain drives this per
    /// navigation; repeated calls with a warm cache are cheap.
    pub async fn ensure_resolved(&self, auth_user_id: AuthUserId) -> ContextSnapshot {
        self.resolve_for(auth_user_id, false).await;
        self.snapshot()
    }

    /// `force` bypasses the cache short-circuit (sign-in, token refresh,
    /// explicit refresh). Non-forced calls ride an unexpired cache entry.
    async fn resolve_for(&self, auth_user_id: AuthUserId, force: bool) {
        let now = Utc::now();

        let epoch = {
            let mut state = self.lock_state();
            if state.current_user != Some(auth_user_id) {
                // Identity switch: drop everything keyed by the previous
                // user before anything downstream can read it.
                if let Some(previous) = state.current_user {
                    self.cache.invalidate_user(previous);
                }
                state.current_user = Some(auth_user_id);
                state.snapshot = ContextSnapshot {
                    loading: true,
                    ..ContextSnapshot::default()
                };
            } else {
                if !force
                    && !state.snapshot.loading
                    && self.cache.get(auth_user_id, now).is_some()
                {
                    debug!(%auth_user_id, "resolution cache hit");
                    return;
                }
                state.snapshot.loading = true;
            }
            state.epoch += 1;
            state.epoch
        };

        let check = self.validator.validate(auth_user_id).await;
        let assignments = check
            .user
            .as_ref()
            .map(|u| u.assignments.clone())
            .unwrap_or_default();
        let permissions = self.oracle.granted_permissions(&assignments).await;
        let is_super_admin = permissions.is_super_admin();

        let viewed = if is_super_admin {
            self.records.viewed_organization().map(|r| r.organization)
        } else {
            None
        };
        let organizacion_original = check.organization.clone();
        let organization = viewed.or_else(|| organizacion_original.clone());

        let mut state = self.lock_state();
        if state.epoch != epoch || state.current_user != Some(auth_user_id) {
            debug!(%auth_user_id, "discarding stale resolution result");
            return;
        }
        state.snapshot = ContextSnapshot {
            usuario: check.user,
            organization: organization.clone(),
            organizacion_original,
            permissions,
            is_super_admin,
            membership_valid: check.valid,
            membership_reason: check.reason,
            loading: false,
            error: None,
        };
        self.cache.put(ResolutionSnapshot {
            user_id: auth_user_id,
            is_super_admin,
            organization,
            cached_at: now,
        });
    }

    // ── organization view (impersonation) ────────────────────────────────

    /// Point the console at another organization's data. Superadmin only;
    /// the choice is persisted so it survives a reload.
    pub fn enter_organization(&self, organization: Organization) -> Result<(), ContextError> {
        let user_id = {
            let state = self.lock_state();
            if !state.snapshot.is_super_admin {
                return Err(ContextError::NotSuperAdmin);
            }
            state.current_user.ok_or(ContextError::NoSession)?
        };

        self.records.put_viewed_organization(&ViewedOrganizationRecord::new(
            organization.clone(),
            Utc::now(),
        ))?;

        let mut state = self.lock_state();
        state.snapshot.organization = Some(organization.clone());
        self.cache.put(ResolutionSnapshot {
            user_id,
            is_super_admin: true,
            organization: Some(organization),
            cached_at: Utc::now(),
        });
        Ok(())
    }

    /// Back to the caller's own membership view. Always clears the durable
    /// record, even when no view was active.
    pub fn exit_organization(&self) -> Result<(), ContextError> {
        self.records.clear_viewed_organization()?;

        let mut state = self.lock_state();
        state.snapshot.organization = state.snapshot.organizacion_original.clone();
        if let Some(user_id) = state.current_user {
            self.cache.put(ResolutionSnapshot {
                user_id,
                is_super_admin: state.snapshot.is_super_admin,
                organization: state.snapshot.organization.clone(),
                cached_at: Utc::now(),
            });
        }
        Ok(())
    }

    /// Active organizations, for the superadmin's tenant picker.
    pub async fn active_organizations(&self) -> Result<Vec<Organization>, StoreError> {
        self.directory.active_organizations().await
    }

    // ── provisioning window ──────────────────────────────────────────────

    /// Open the "creating user" window: until it closes (or times out), a
    /// session switch to another user is suppressed.
    pub fn begin_user_provisioning(&self, original_tokens: TokenPair) -> Result<(), ContextError> {
        let user_id = self.lock_state().current_user.ok_or(ContextError::NoSession)?;
        self.records
            .put_provisioning_guard(&ProvisioningGuard::new(user_id, original_tokens, Utc::now()))?;
        Ok(())
    }

    pub fn end_user_provisioning(&self) -> Result<(), ContextError> {
        self.records.clear_provisioning_guard()?;
        Ok(())
    }

    // ── password setup flag ──────────────────────────────────────────────

    pub fn skip_password_setup(&self) -> Result<(), ContextError> {
        let user_id = self.lock_state().current_user.ok_or(ContextError::NoSession)?;
        self.records.skip_password_setup(user_id)?;
        Ok(())
    }

    pub fn password_setup_skipped(&self) -> bool {
        self.lock_state()
            .current_user
            .is_some_and(|user_id| self.records.password_setup_skipped(user_id))
    }

    // ── sign-out ─────────────────────────────────────────────────────────

    /// Clear all client-side state for the current session, then terminate
    /// it at the provider.
    pub async fn sign_out(&self) -> Result<(), IdentityError> {
        self.apply_signed_out_state(None);
        self.identity.sign_out().await
    }

    fn apply_signed_out_state(&self, error: Option<String>) {
        let previous = {
            let mut state = self.lock_state();
            let previous = state.current_user.take();
            // Bumping the epoch also discards any in-flight resolution.
            state.epoch += 1;
            state.snapshot = ContextSnapshot {
                loading: false,
                error,
                ..ContextSnapshot::default()
            };
            previous
        };
        if let Some(user_id) = previous {
            self.cache.invalidate_user(user_id);
        }
        self.records.sweep_on_sign_out(previous);
    }

    // ── predicate passthroughs for screens ───────────────────────────────

    pub fn tiene_permiso(&self, name: &str) -> bool {
        self.lock_state().snapshot.permissions.tiene_permiso(name)
    }

    pub fn tiene_algun_permiso<S: AsRef<str>>(&self, names: &[S]) -> bool {
        self.lock_state().snapshot.permissions.tiene_algun_permiso(names)
    }

    pub fn tiene_todos_los_permisos<S: AsRef<str>>(&self, names: &[S]) -> bool {
        self.lock_state()
            .snapshot
            .permissions
            .tiene_todos_los_permisos(names)
    }

    pub fn is_super_admin(&self) -> bool {
        self.lock_state().snapshot.is_super_admin
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ContextState> {
        // Single logical thread; a poisoned lock means a panicked test.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
