//! Encoding, decoding and in-memory representation of the CQL binary protocol. This crate does
//! no I/O of its own — reading frames off a socket, pooling connections and routing queries to
//! hosts is the job of the `cdrs-tokio` crate built on top of it.

pub mod compression;
pub mod consistency;
pub mod error;
pub mod frame;
pub mod query;
pub mod token;
pub mod types;

pub use error::{Error, Result};
