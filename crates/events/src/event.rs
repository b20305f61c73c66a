//! Identity change notifications.

use serde::{Deserialize, Serialize};

use mostrador_core::Session;

/// The auth-state events consumed from the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    /// Fired by the provider when a stored session is restored on load or
    /// tab focus. Deduplicated downstream against cached state.
    InitialSession,
}

/// One auth-change notification, republished internally.
///
/// `session` is `None` for `SignedOut`; for the other kinds it carries the
/// session the provider reported alongside the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthChange {
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}

impl AuthChange {
    pub fn signed_in(session: Session) -> Self {
        Self {
            kind: AuthEventKind::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            kind: AuthEventKind::SignedOut,
            session: None,
        }
    }

    pub fn token_refreshed(session: Session) -> Self {
        Self {
            kind: AuthEventKind::TokenRefreshed,
            session: Some(session),
        }
    }

    pub fn initial_session(session: Session) -> Self {
        Self {
            kind: AuthEventKind::InitialSession,
            session: Some(session),
        }
    }

    /// The user id this notification reports, if it carries a session.
    pub fn reported_user(&self) -> Option<mostrador_core::AuthUserId> {
        self.session.as_ref().map(|s| s.user_id)
    }
}
