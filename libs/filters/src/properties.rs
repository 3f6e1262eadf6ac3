//! Request-side context handed to every filter.

use std::collections::BTreeMap;

use hostsched_id::{HostId, RequestId};
use serde::{Deserialize, Serialize};

use crate::FilterResult;

/// Hosts already tried for one request.
///
/// The scheduler appends to `hosts` after each attempt; filters only read it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryInfo {
    #[serde(default)]
    pub num_attempts: u32,

    #[serde(default)]
    pub hosts: Vec<HostId>,
}

impl RetryInfo {
    /// Returns true if `host` was already attempted.
    pub fn contains(&self, host: &HostId) -> bool {
        self.hosts.iter().any(|tried| tried == host)
    }

    /// Records `host` as attempted. Hosts are kept in attempt order.
    pub fn record_attempt(&mut self, host: HostId) {
        self.hosts.push(host);
    }
}

/// Share type requested by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceType {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub extra_specs: BTreeMap<String, serde_json::Value>,
}

/// Free-form placement hints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerHints {
    /// JSON-encoded query expression evaluated by the JSON filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Everything a filter may know about the request being placed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,

    /// Requested size in gigabytes.
    #[serde(default)]
    pub size: u64,

    /// Host that already holds the resource, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_exists_on: Option<HostId>,

    /// `None` means rescheduling is disabled for this request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<ResourceType>,

    #[serde(default)]
    pub scheduler_hints: SchedulerHints,
}

impl FilterProperties {
    /// Properties for a request of `size` gigabytes.
    pub fn with_size(size: u64) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    /// Parses properties from a JSON request body.
    ///
    /// Malformed fields (for example a non-numeric `size`) are reported as
    /// [`FilterError::InvalidRequest`](crate::FilterError::InvalidRequest).
    pub fn from_json(value: serde_json::Value) -> FilterResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilterError;
    use serde_json::json;

    #[test]
    fn test_empty_properties() {
        let props = FilterProperties::from_json(json!({})).unwrap();
        assert_eq!(props.size, 0);
        assert!(props.retry.is_none());
        assert!(props.share_exists_on.is_none());
    }

    #[test]
    fn test_retry_parsed() {
        let props = FilterProperties::from_json(json!({
            "size": 100,
            "retry": {"num_attempts": 2, "hosts": ["host2"]}
        }))
        .unwrap();
        let retry = props.retry.unwrap();
        assert_eq!(retry.num_attempts, 2);
        assert!(retry.contains(&HostId::parse("host2").unwrap()));
        assert!(!retry.contains(&HostId::parse("host1").unwrap()));
    }

    #[test]
    fn test_non_numeric_size_is_invalid_request() {
        let err = FilterProperties::from_json(json!({"size": "big"})).unwrap_err();
        assert!(matches!(err, FilterError::InvalidRequest(_)));
    }

    #[test]
    fn test_record_attempt_keeps_order() {
        let mut retry = RetryInfo::default();
        retry.record_attempt(HostId::parse("b").unwrap());
        retry.record_attempt(HostId::parse("a").unwrap());
        assert_eq!(retry.hosts[0], "b");
        assert_eq!(retry.hosts[1], "a");
    }
}
