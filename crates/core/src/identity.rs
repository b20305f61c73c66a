//! Identity-provider port.
//!
//! Sign-in/out, token issuance and session storage are owned by the external
//! identity provider. The core consumes this narrow surface; auth-change
//! notifications arrive separately through the internal event bus
//! (`mostrador-events`).

use async_trait::async_trait;
use thiserror::Error;

use crate::id::AuthUserId;
use crate::model::{Session, TokenPair};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// The consumed slice of the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Currently authenticated user, if any. Provider errors are surfaced so
    /// the guard chain can fail closed.
    async fn current_user(&self) -> Result<Option<AuthUserId>, IdentityError>;

    /// The current bearer session, if any.
    async fn session(&self) -> Result<Option<Session>, IdentityError>;

    /// Terminate the current session at the provider.
    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Re-apply a previously captured token pair, restoring that session.
    ///
    /// Used by the provisioning guard to undo an unwanted session switch.
    async fn apply_tokens(&self, tokens: &TokenPair) -> Result<(), IdentityError>;
}
