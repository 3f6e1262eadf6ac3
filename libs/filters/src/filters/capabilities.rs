//! Capabilities filter.

use tracing::debug;

use crate::extra_specs;
use crate::{FilterProperties, FilterResult, HostFilter, HostState};

/// Scope prefix of extra specs checked against host capabilities.
const CAPABILITIES_SCOPE: &str = "capabilities";

/// Keeps hosts whose reported capabilities satisfy the extra specs of the
/// requested resource type.
///
/// Keys scoped with a prefix other than `capabilities:` belong to other
/// consumers and are ignored. The remaining `:`-separated path is looked up
/// in the (possibly nested) capability map.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilitiesFilter;

impl CapabilitiesFilter {
    pub const NAME: &'static str = "CapabilitiesFilter";

    fn satisfies(host: &HostState, key: &str, requirement: &serde_json::Value) -> bool {
        let mut scope: Vec<&str> = key.split(':').collect();
        if scope.len() > 1 {
            if scope[0] != CAPABILITIES_SCOPE {
                return true;
            }
            scope.remove(0);
        }

        let Some(requirement) = extra_specs::spec_string(requirement) else {
            debug!(key, "Extra spec has no comparable value, ignoring");
            return true;
        };

        let Some((first, rest)) = scope.split_first() else {
            return false;
        };
        let capability = rest
            .iter()
            .try_fold(host.capabilities.get(*first), |cap, segment| {
                cap.map(|value| value.get(*segment))
            })
            .flatten();

        match capability.and_then(extra_specs::spec_string) {
            Some(value) => extra_specs::matches(&value, &requirement),
            None => false,
        }
    }
}

impl HostFilter for CapabilitiesFilter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn host_passes(&self, host: &HostState, props: &FilterProperties) -> bool {
        let Some(resource_type) = &props.resource_type else {
            return true;
        };

        for (key, requirement) in &resource_type.extra_specs {
            if !Self::satisfies(host, key, requirement) {
                debug!(
                    host = %host.host,
                    key = %key,
                    requirement = %requirement,
                    "Host capability does not satisfy extra spec"
                );
                return false;
            }
        }
        true
    }

    fn validate(&self, props: &FilterProperties) -> FilterResult<()> {
        match &props.resource_type {
            Some(resource_type) => extra_specs::validate(&resource_type.extra_specs),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_support::host_id;
    use crate::ResourceType;
    use serde_json::json;

    fn host() -> HostState {
        HostState::new(host_id("host1#pool1"))
            .with_capability("driver_handles_share_servers", json!(false))
            .with_capability("snapshot_support", json!(true))
            .with_capability("total_iops", json!(5000))
            .with_capability("storage", json!({"tier": "gold", "media": "ssd,nvme"}))
    }

    fn props(specs: serde_json::Value) -> FilterProperties {
        FilterProperties {
            resource_type: Some(ResourceType {
                name: "default".to_string(),
                extra_specs: serde_json::from_value(specs).unwrap(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_resource_type_passes() {
        assert!(CapabilitiesFilter.host_passes(&host(), &FilterProperties::default()));
    }

    #[test]
    fn test_unscoped_and_scoped_keys_match() {
        let props = props(json!({
            "driver_handles_share_servers": "False",
            "capabilities:snapshot_support": "<is> True",
            "capabilities:total_iops": ">= 4000"
        }));
        assert!(CapabilitiesFilter.host_passes(&host(), &props));
    }

    #[test]
    fn test_nested_capability_path() {
        assert!(CapabilitiesFilter.host_passes(
            &host(),
            &props(json!({"capabilities:storage:tier": "<or> silver <or> gold"}))
        ));
        assert!(CapabilitiesFilter.host_passes(
            &host(),
            &props(json!({"capabilities:storage:media": "<in> nvme"}))
        ));
    }

    #[test]
    fn test_other_scopes_are_ignored() {
        let props = props(json!({"quota:max_shares": "1"}));
        assert!(CapabilitiesFilter.host_passes(&host(), &props));
    }

    #[test]
    fn test_missing_capability_fails() {
        let props = props(json!({"capabilities:replication": "True"}));
        assert!(!CapabilitiesFilter.host_passes(&host(), &props));
    }

    #[test]
    fn test_unsatisfied_requirement_fails() {
        let props = props(json!({"total_iops": ">= 6000"}));
        assert!(!CapabilitiesFilter.host_passes(&host(), &props));
    }

    #[test]
    fn test_boolean_spec_value_compares_as_word() {
        let props = props(json!({"snapshot_support": true}));
        assert!(CapabilitiesFilter.host_passes(&host(), &props));
    }

    #[test]
    fn test_validate_rejects_bad_specs() {
        assert!(CapabilitiesFilter.validate(&props(json!({"key": 5}))).is_err());
        assert!(CapabilitiesFilter.validate(&props(json!({"key": "5"}))).is_ok());
    }
}
