//! Snapshot of a candidate host as seen by the filters.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hostsched_id::HostId;
use serde::{Deserialize, Deserializer, Serialize};

use crate::Capacity;

/// Service record of the process managing a host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Administratively disabled.
    #[serde(default)]
    pub disabled: bool,

    /// Availability zone the service runs in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,

    /// Last heartbeat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Registration time; stands in for the heartbeat until the first one arrives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ServiceRecord {
    /// Most recent sign of life: `updated_at`, else `created_at`.
    pub fn last_heartbeat(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }
}

/// Capacity and liveness snapshot of one host or pool.
///
/// Built by the capacity-reporting side for a single decision and only read
/// by filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostState {
    pub host: HostId,

    #[serde(default, alias = "free_capacity")]
    pub free_capacity_gb: Capacity,

    #[serde(default, alias = "total_capacity")]
    pub total_capacity_gb: Capacity,

    /// Share of total capacity held back from allocation, 0..=100.
    #[serde(default, deserialize_with = "deserialize_percentage")]
    pub reserved_percentage: u8,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub service: ServiceRecord,

    /// Driver-reported capabilities, possibly nested.
    #[serde(default)]
    pub capabilities: BTreeMap<String, serde_json::Value>,
}

impl HostState {
    /// Creates a host with unknown capacity and an enabled service.
    pub fn new(host: HostId) -> Self {
        Self {
            host,
            free_capacity_gb: Capacity::Unknown,
            total_capacity_gb: Capacity::Unknown,
            reserved_percentage: 0,
            updated_at: None,
            service: ServiceRecord::default(),
            capabilities: BTreeMap::new(),
        }
    }

    pub fn with_free_capacity(mut self, free: Capacity) -> Self {
        self.free_capacity_gb = free;
        self
    }

    pub fn with_total_capacity(mut self, total: Capacity) -> Self {
        self.total_capacity_gb = total;
        self
    }

    /// Values above 100 are clamped.
    pub fn with_reserved_percentage(mut self, percentage: u8) -> Self {
        self.reserved_percentage = percentage.min(100);
        self
    }

    pub fn with_service(mut self, service: ServiceRecord) -> Self {
        self.service = service;
        self
    }

    pub fn with_capability(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.capabilities.insert(key.into(), value);
        self
    }

    /// Availability zone of the host's service.
    pub fn availability_zone(&self) -> Option<&str> {
        self.service.availability_zone.as_deref()
    }

    /// Resolves a dotted attribute path such as `free_capacity_gb` or
    /// `capabilities.thin_provisioning` to a JSON value.
    pub fn attribute(&self, path: &str) -> Option<serde_json::Value> {
        let mut segments = path.split('.');
        let root = match segments.next()? {
            "host" => serde_json::Value::from(self.host.as_str()),
            "free_capacity_gb" | "free_capacity" => self.free_capacity_gb.to_json(),
            "total_capacity_gb" | "total_capacity" => self.total_capacity_gb.to_json(),
            "reserved_percentage" => serde_json::Value::from(self.reserved_percentage),
            "availability_zone" => serde_json::Value::from(self.availability_zone()?),
            "capabilities" => serde_json::to_value(&self.capabilities).ok()?,
            "service" => serde_json::to_value(&self.service).ok()?,
            _ => return None,
        };

        segments.try_fold(root, |value, segment| match value {
            serde_json::Value::Object(mut map) => map.remove(segment),
            _ => None,
        })
    }
}

fn deserialize_percentage<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<u8>::deserialize(deserializer)?.unwrap_or(0);
    if value > 100 {
        return Err(serde::de::Error::custom(format!(
            "reserved_percentage must be between 0 and 100, got {value}"
        )));
    }
    Ok(value)
}
