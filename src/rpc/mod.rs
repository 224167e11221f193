//! JSON-RPC Client Module
//!
//! Talks to a node's HTTP JSON-RPC interface to read block data.

mod client;
mod error;
mod methods;

pub use client::*;
pub use error::*;
pub use methods::*;
