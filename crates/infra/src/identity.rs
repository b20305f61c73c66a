//! Scriptable in-memory identity provider.
//!
//! Stands in for the hosted provider in tests and local development. Every
//! state change publishes the matching [`AuthChange`] to the internal bus,
//! so consumers see the same notification stream they would in production.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mostrador_core::{AuthUserId, IdentityError, IdentityProvider, Session, TokenPair};
use mostrador_events::{AuthChange, AuthEventKind, EventBus, InMemoryEventBus, Subscription};

#[derive(Default)]
struct IdentityState {
    session: Option<Session>,
    /// Token pairs applied via `apply_tokens`, oldest first.
    applied: Vec<TokenPair>,
    /// Known token pairs and the session each restores.
    registry: HashMap<String, Session>,
    unavailable: bool,
}

pub struct InMemoryIdentity {
    state: Mutex<IdentityState>,
    bus: Arc<InMemoryEventBus<AuthChange>>,
}

impl InMemoryIdentity {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(IdentityState::default()),
            bus: Arc::new(InMemoryEventBus::new()),
        }
    }

    pub fn subscribe(&self) -> Subscription<AuthChange> {
        self.bus.subscribe()
    }

    /// Establish a session and notify, as a completed sign-in would.
    pub fn sign_in(&self, session: Session) {
        self.lock().session = Some(session.clone());
        self.publish(AuthChange::signed_in(session));
    }

    /// Replay the provider's startup notification for whatever session is
    /// currently stored (possibly none).
    pub fn emit_initial_session(&self) {
        let session = self.lock().session.clone();
        self.publish(AuthChange {
            kind: AuthEventKind::InitialSession,
            session,
        });
    }

    /// Rotate tokens for the current session and notify.
    pub fn refresh_token(&self) {
        let session = self.lock().session.clone();
        if let Some(session) = session {
            self.publish(AuthChange::token_refreshed(session));
        }
    }

    /// Teach the provider a token pair so `apply_tokens` can restore the
    /// session it belongs to.
    pub fn register_tokens(&self, tokens: &TokenPair, session: Session) {
        self.lock()
            .registry
            .insert(tokens.access_token().to_string(), session);
    }

    pub fn applied_tokens(&self) -> Vec<TokenPair> {
        self.lock().applied.clone()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.lock().session.clone()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    fn publish(&self, change: AuthChange) {
        // Publishing only fails on a poisoned lock inside the bus.
        let _ = self.bus.publish(change);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, IdentityState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check_available(&self) -> Result<(), IdentityError> {
        if self.lock().unavailable {
            return Err(IdentityError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

impl Default for InMemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentity {
    async fn current_user(&self) -> Result<Option<AuthUserId>, IdentityError> {
        self.check_available()?;
        Ok(self.lock().session.as_ref().map(|s| s.user_id))
    }

    async fn session(&self) -> Result<Option<Session>, IdentityError> {
        self.check_available()?;
        Ok(self.lock().session.clone())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.check_available()?;
        self.lock().session = None;
        self.publish(AuthChange::signed_out());
        Ok(())
    }

    async fn apply_tokens(&self, tokens: &TokenPair) -> Result<(), IdentityError> {
        self.check_available()?;
        let mut state = self.lock();
        state.applied.push(tokens.clone());
        if let Some(session) = state.registry.get(tokens.access_token()).cloned() {
            state.session = Some(session);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn session_for(user_id: AuthUserId) -> Session {
        Session {
            user_id,
            email_identities: vec!["email".to_string()],
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn sign_in_publishes_and_updates_session() {
        let identity = InMemoryIdentity::new();
        let sub = identity.subscribe();
        let user = AuthUserId::new();

        identity.sign_in(session_for(user));

        assert_eq!(identity.current_user().await.unwrap(), Some(user));
        let events = sub.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AuthEventKind::SignedIn);
    }

    #[tokio::test]
    async fn apply_registered_tokens_restores_that_session() {
        let identity = InMemoryIdentity::new();
        let original = AuthUserId::new();
        let tokens = TokenPair::new("acc", "ref").unwrap();
        identity.register_tokens(&tokens, session_for(original));

        identity.sign_in(session_for(AuthUserId::new()));
        identity.apply_tokens(&tokens).await.unwrap();

        assert_eq!(identity.current_user().await.unwrap(), Some(original));
        assert_eq!(identity.applied_tokens(), vec![tokens]);
    }

    #[tokio::test]
    async fn outage_fails_session_reads() {
        let identity = InMemoryIdentity::new();
        identity.set_unavailable(true);
        assert!(identity.session().await.is_err());
    }
}
