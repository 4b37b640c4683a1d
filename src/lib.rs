//! Browser GBA launcher server library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod roms;
pub mod security;
pub mod store;

pub use config::LauncherConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
