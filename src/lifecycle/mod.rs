//! Process lifecycle: bring-up, stop signals, teardown.
//!
//! ```text
//! startup.rs   config → ROM dir + DB dir → SQLite store → AppState
//! signals.rs   SIGINT / SIGTERM → Shutdown::trigger
//! shutdown.rs  latched flag → server stops accepting, drains → store closed
//! ```
//!
//! The store is closed only after the HTTP server has drained.

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
