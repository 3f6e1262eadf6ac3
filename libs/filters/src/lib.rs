//! # hostsched-filters
//!
//! Host filtering primitives for the storage scheduler.
//!
//! A scheduling decision evaluates a list of candidate [`HostState`]
//! snapshots against the request-side [`FilterProperties`]. Each active
//! [`HostFilter`] is a pure predicate; a host stays a candidate only if every
//! filter in the [`FilterChain`] accepts it.
//!
//! Filters are looked up by name through the [`FilterHandler`], which is
//! populated from a registration table at startup rather than discovered
//! at runtime.
//!
//! ## Invariants
//!
//! - Filters hold no per-request state; evaluating a host twice with the
//!   same inputs gives the same answer.
//! - Capacity sentinels (`infinite`, `unknown`) never take part in
//!   arithmetic.
//! - An unknown filter name is a configuration error raised when the chain
//!   is built, never while hosts are evaluated.

mod capacity;
mod error;
pub mod extra_specs;
mod filter;
pub mod filters;
mod handler;
mod host_state;
mod liveness;
mod properties;

pub use capacity::Capacity;
pub use error::{FilterError, FilterResult};
pub use filter::{filter_all, FilterChain, HostFilter, HostVerdict};
pub use handler::{FilterDescriptor, FilterEnv, FilterHandler, RegisterOutcome, STANDARD_NAMESPACE};
pub use host_state::{HostState, ServiceRecord};
pub use liveness::{HeartbeatLiveness, ServiceLiveness, StaticLiveness, DEFAULT_SERVICE_DOWN_TIME};
pub use properties::{FilterProperties, ResourceType, RetryInfo, SchedulerHints};
