#![forbid(unsafe_code)]

//! Planning poker runtime.
//!
//! Wraps the pure kernel with durable snapshots and backlog exports,
//! per-game sessions, a multi-game hub with discussion timers, and
//! environment configuration.
//!
//! No round logic lives here. Every transition is delegated to the
//! kernel and only committed once its effect is on disk.

pub mod config;
pub mod error;
pub mod feature_import;
pub mod hub;
pub mod session;
pub mod snapshot_codec;
pub mod store;
pub mod telemetry;

pub use config::RuntimeConfig;
pub use error::{ErrorKind, Result, RuntimeError};
pub use hub::GameHub;
pub use session::{Receipt, Session};
pub use store::{FileStore, GameStore, MemoryStore};
