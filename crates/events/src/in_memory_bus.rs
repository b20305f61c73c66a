//! In-memory bus. The only transport this core needs: everything runs in
//! one browser context, so "in memory" is the production configuration,
//! not a test double.

use std::sync::{Mutex, mpsc};

use crate::bus::{EventBus, Subscription};

#[derive(Debug)]
pub enum InMemoryBusError {
    /// Publish failed due to internal lock poisoning.
    Poisoned,
}

/// Fan-out bus over per-subscriber channels.
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    subscribers: Mutex<Vec<mpsc::Sender<M>>>,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = InMemoryBusError;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        let mut subs = self
            .subscribers
            .lock()
            .map_err(|_| InMemoryBusError::Poisoned)?;

        // Drop any dead subscribers while publishing.
        subs.retain(|tx| tx.send(message.clone()).is_ok());

        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        let (tx, rx) = mpsc::channel();

        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }

        Subscription::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{AuthChange, AuthEventKind};
    use chrono::Utc;
    use mostrador_core::{AuthUserId, Session};

    fn session() -> Session {
        Session {
            user_id: AuthUserId::new(),
            email_identities: vec!["email".to_string()],
            expires_at: Utc::now() + chrono::TimeDelta::hours(1),
        }
    }

    #[test]
    fn every_subscriber_sees_every_event_in_publish_order() {
        let bus = InMemoryEventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        bus.publish(AuthChange::signed_in(session())).unwrap();
        bus.publish(AuthChange::signed_out()).unwrap();

        for sub in [&a, &b] {
            let events = sub.drain();
            assert_eq!(events.len(), 2);
            assert_eq!(events[0].kind, AuthEventKind::SignedIn);
            assert_eq!(events[1].kind, AuthEventKind::SignedOut);
        }
    }

    #[test]
    fn dropped_subscribers_are_pruned_on_publish() {
        let bus = InMemoryEventBus::new();
        let keep = bus.subscribe();
        drop(bus.subscribe());

        bus.publish(AuthChange::signed_out()).unwrap();
        assert_eq!(keep.drain().len(), 1);

        // Publishing again must not error on the dead channel.
        bus.publish(AuthChange::signed_out()).unwrap();
        assert_eq!(keep.drain().len(), 1);
    }

    #[test]
    fn late_subscriber_misses_earlier_events() {
        let bus = InMemoryEventBus::new();
        bus.publish(AuthChange::signed_out()).unwrap();

        let late = bus.subscribe();
        assert!(late.try_recv().is_err());
    }
}
