#![forbid(unsafe_code)]

/// Version of the canonical state layout. Part of every state hash.
pub const ENGINE_VERSION: u32 = 1;

pub mod deck;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod registry;
pub mod turns;
pub mod resolver;
pub mod state;
pub mod snapshot;
pub mod transitions;
pub mod invariants;
pub mod hashing;
pub mod engine;
