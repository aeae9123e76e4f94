//! Access-control decisions for Rho command surfaces.
//!
//! The runtime resolves the acting principal's role memberships at call time
//! and asks this crate for an allow/deny decision against the configured
//! operator role.

pub mod role_gate;

pub use role_gate::{evaluate_role_gate, AccessDecision};
