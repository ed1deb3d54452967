//! Consensus-critical serialization.
//!
//! Everything that crosses the wire or the snapshot file goes through the
//! [`Encodable`]/[`Decodable`] traits defined here. The encoding is
//! deterministic: little-endian integers, compact-size prefixed collections,
//! hashes in internal byte order.

pub mod encode;

pub use encode::{Decodable, Encodable, VarInt, deserialize, deserialize_partial, serialize};
