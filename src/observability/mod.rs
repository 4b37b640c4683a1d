//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters and histograms via `metrics`)
//!
//! Consumers:
//!     → stdout (pretty in development, JSON in production)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every request span
//! - Metrics are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
