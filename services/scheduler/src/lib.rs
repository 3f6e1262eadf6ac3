//! hostsched scheduler service.
//!
//! Ships the `hostsched` binary and exposes the driver for integration
//! testing and embedding:
//!
//! - [`driver::FilterScheduler`] runs the configured filter chain over a
//!   host snapshot and picks a host
//! - [`config::Config`] loads scheduler tunables from the environment
//! - [`input`] reads host snapshots and requests from JSON files

pub mod config;
pub mod driver;
pub mod input;
