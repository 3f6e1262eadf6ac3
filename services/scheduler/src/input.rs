//! Loading host snapshots and requests from JSON files.
//!
//! A host snapshot is a JSON array of host states as reported by the
//! capacity-reporting side; a request is a JSON object of filter
//! properties.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use hostsched_filters::{FilterProperties, HostState};

/// Reads a host snapshot.
pub fn load_hosts(path: &Path) -> Result<Vec<HostState>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read host snapshot from {:?}", path))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse host snapshot from {:?}", path))
}

/// Reads a scheduling request.
pub fn load_request(path: &Path) -> Result<FilterProperties> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read request from {:?}", path))?;
    let value: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("Request in {:?} is not valid JSON", path))?;
    FilterProperties::from_json(value)
        .with_context(|| format!("Failed to parse request from {:?}", path))
}
