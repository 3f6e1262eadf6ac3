//! # hostsched-id
//!
//! Identifier types shared by the scheduler crates.
//!
//! ## Host IDs
//!
//! A host id names a schedulable storage back-end. It is either a plain
//! host name or a composite of the form `host@backend#pool`:
//!
//! - `host1`
//! - `host1#pool1`
//! - `share-node-3@lvm#fast`
//!
//! Host ids are opaque: two ids are the same host only if their full
//! strings are equal.
//!
//! ## Request IDs
//!
//! Scheduling requests carry a prefixed ULID (`req_{ulid}`) so that every
//! log line for one decision can be correlated.

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;
