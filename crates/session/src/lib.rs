//! `mostrador-session` — process-wide session and organization context.
//!
//! The single source of truth for "who is signed in and which tenant are
//! they looking at". State is re-derived on explicit triggers only (mount,
//! provider notifications, caller refresh), cached with a short TTL, and
//! guarded against stale writes by tagging every in-flight resolution with
//! the identity it was issued for.

pub mod cache;
pub mod context;
pub mod impersonation;
pub mod pump;
pub mod storage;

pub use cache::{CachePolicy, ResolutionCache, ResolutionSnapshot};
pub use context::{ContextError, ContextSnapshot, SessionConfig, SessionContext};
pub use impersonation::{
    GuardDecision, ImpersonationPolicy, PROVISIONING_GUARD_VERSION, ProvisioningGuard,
    evaluate_guard,
};
pub use pump::AuthPump;
pub use storage::{RecordStore, SessionHint, ViewedOrganizationRecord};
