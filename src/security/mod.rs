//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (origin policy)
//!     → rate_limit.rs (per-address sliding window)
//!     → limits.rs (body shape and depth)
//!     → roms::filename (field validation)
//! Outgoing response:
//!     → headers.rs (CSP, nosniff, frame options)
//! ```
//!
//! # Design Decisions
//! - Defense in depth: multiple layers of protection
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod cors;
pub mod headers;
pub mod limits;
pub mod rate_limit;

pub use limits::{check_body, BodyViolation};
pub use rate_limit::{rate_limit_middleware, Decision, RateLimiter};
