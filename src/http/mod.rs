//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layer stack)
//!     → request.rs (request ID, tracing span)
//!     → audit.rs (records every >= 400 response)
//!     → security::rate_limit (per-address ceiling, API routes only)
//!     → handlers.rs (health, roms, rom-play, rom-stats)
//!        | assets.rs (ROM bytes, front-end bundle)
//!     → error.rs (ApiError → JSON error body)
//! ```

pub mod assets;
pub mod audit;
pub mod error;
pub mod handlers;
pub mod request;
pub mod server;

pub use error::ApiError;
pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{build_router, AppState, HttpServer};
