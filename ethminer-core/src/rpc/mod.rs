//! Miner JSON-RPC module
//!
//! Asks ethminer's TCP API (`miner_getstat1`) for its current speed instead of
//! reading the log.

pub mod client;
pub mod types;

pub use client::RpcProbe;
pub use types::{StatReply, StatRequest};
