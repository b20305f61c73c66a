//! `mostrador-events` — the internal identity event bus.
//!
//! The identity provider's auth-change notification fans out exactly once
//! into an ordered stream of internal events. Every collaborator that cares
//! about identity changes (the session context, the guard chain's tests, a
//! future audit sink) holds its own subscription, so re-derivation order is
//! the subscription order rather than an accident of callback registration.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::{AuthChange, AuthEventKind};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
