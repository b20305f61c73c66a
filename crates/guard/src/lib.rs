//! `mostrador-guard` — the route guard chain.
//!
//! Every protected navigation runs the same explicit state machine:
//! authentication gate, organization/onboarding gate, then the per-route
//! permission gate, short-circuiting into one of four terminal states
//! (redirect to sign-in, onboarding prompt, denial screen, render). A
//! bounded watchdog converts any stuck check into a direct session
//! re-query, so a dropped notification can never hang the UI.

pub mod chain;
pub mod state;

pub use chain::{GuardConfig, RouteGuard};
pub use state::{GuardState, RouteRequirement};
