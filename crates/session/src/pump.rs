//! Bridges the internal event bus to the session context.
//!
//! The runtime is notification-driven and logically single-threaded: the
//! pump drains queued auth-changes in arrival order and applies them one at
//! a time, which is exactly the ordering guarantee the context's staleness
//! tagging assumes.

use std::sync::Arc;

use mostrador_events::{AuthChange, Subscription};

use crate::context::SessionContext;

pub struct AuthPump {
    subscription: Subscription<AuthChange>,
    context: Arc<SessionContext>,
}

impl AuthPump {
    pub fn new(subscription: Subscription<AuthChange>, context: Arc<SessionContext>) -> Self {
        Self {
            subscription,
            context,
        }
    }

    /// Apply everything currently queued, in order. Returns how many
    /// notifications were processed.
    pub async fn tick(&self) -> usize {
        let changes = self.subscription.drain();
        let processed = changes.len();
        for change in changes {
            self.context.handle_auth_change(change).await;
        }
        processed
    }
}
