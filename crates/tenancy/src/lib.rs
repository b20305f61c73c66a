//! `mostrador-tenancy` — multi-tenancy resolution.
//!
//! Maps an identity-provider user to its domain record, organization and
//! roles, and decides whether that user currently has a usable membership.
//! Both components run on the hot path of every protected render and
//! therefore never fail outward: failures degrade to the conservative
//! "unprovisioned" outcome.

pub mod membership;
pub mod resolver;

pub use membership::{MembershipCheck, MembershipReason, MembershipValidator};
pub use resolver::{ResolvedUser, SystemUserResolver};
