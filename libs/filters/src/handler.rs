//! Registry of filter implementations, addressed by namespace and name.
//!
//! Filters are registered from static tables at startup (see
//! [`FilterHandler::with_standard_filters`]) or by an explicit plugin
//! loading step calling [`FilterHandler::register`]. The scheduler then
//! builds its active chain from configured names.
//!
//! Name collisions are resolved first-wins: a second descriptor with an
//! already registered name is ignored and logged.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::filters::{
    AvailabilityZoneFilter, CapabilitiesFilter, CapacityFilter, JsonFilter, RetryFilter,
};
use crate::{
    FilterChain, FilterError, FilterResult, HeartbeatLiveness, HostFilter, ServiceLiveness,
};

/// Namespace holding the filters shipped with this crate.
pub const STANDARD_NAMESPACE: &str = "hostsched.scheduler.filters";

/// Process-wide collaborators handed to filter factories.
#[derive(Clone)]
pub struct FilterEnv {
    pub liveness: Arc<dyn ServiceLiveness>,
}

impl FilterEnv {
    pub fn new(liveness: Arc<dyn ServiceLiveness>) -> Self {
        Self { liveness }
    }
}

impl Default for FilterEnv {
    fn default() -> Self {
        Self::new(Arc::new(HeartbeatLiveness::default()))
    }
}

impl fmt::Debug for FilterEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterEnv").finish_non_exhaustive()
    }
}

/// Constructor for a filter implementation.
pub type FilterFactory = fn(&FilterEnv) -> Box<dyn HostFilter>;

/// A registered filter type.
#[derive(Clone, Copy)]
pub struct FilterDescriptor {
    pub name: &'static str,
    pub factory: FilterFactory,
}

impl FilterDescriptor {
    pub const fn new(name: &'static str, factory: FilterFactory) -> Self {
        Self { name, factory }
    }

    /// Instantiates the filter.
    pub fn build(&self, env: &FilterEnv) -> Box<dyn HostFilter> {
        (self.factory)(env)
    }
}

impl fmt::Debug for FilterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterDescriptor")
            .field("name", &self.name)
            .finish()
    }
}

impl PartialEq for FilterDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for FilterDescriptor {}

/// Result of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered,

    /// A descriptor with the same name already exists and was kept.
    Duplicate,

    /// The entry was skipped.
    Malformed(String),
}

/// The standard filters, in registration order.
const STANDARD_FILTERS: &[FilterDescriptor] = &[
    FilterDescriptor::new(AvailabilityZoneFilter::NAME, |_| Box::new(AvailabilityZoneFilter)),
    FilterDescriptor::new(CapabilitiesFilter::NAME, |_| Box::new(CapabilitiesFilter)),
    FilterDescriptor::new(CapacityFilter::NAME, |env| {
        Box::new(CapacityFilter::new(env.liveness.clone()))
    }),
    FilterDescriptor::new(JsonFilter::NAME, |_| Box::new(JsonFilter)),
    FilterDescriptor::new(RetryFilter::NAME, |_| Box::new(RetryFilter)),
];

type Namespaces = BTreeMap<String, BTreeMap<&'static str, FilterDescriptor>>;

/// Filter registry and chain builder.
#[derive(Debug, Default)]
pub struct FilterHandler {
    namespaces: RwLock<Namespaces>,
}

impl FilterHandler {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the standard filters under
    /// [`STANDARD_NAMESPACE`].
    pub fn with_standard_filters() -> Self {
        let handler = Self::new();
        for descriptor in STANDARD_FILTERS {
            handler.register(STANDARD_NAMESPACE, *descriptor);
        }
        handler
    }

    /// Registers a filter type under `namespace`.
    ///
    /// Malformed entries are skipped and reported; they never prevent other
    /// registrations.
    pub fn register(&self, namespace: &str, descriptor: FilterDescriptor) -> RegisterOutcome {
        if let Some(reason) = malformed_reason(namespace, descriptor.name) {
            warn!(
                namespace,
                name = descriptor.name,
                reason = %reason,
                "Skipping malformed filter entry"
            );
            return RegisterOutcome::Malformed(reason);
        }

        let mut namespaces = match self.namespaces.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let filters = namespaces.entry(namespace.to_string()).or_default();

        if filters.contains_key(descriptor.name) {
            warn!(
                namespace,
                name = descriptor.name,
                "Filter already registered, keeping the first"
            );
            return RegisterOutcome::Duplicate;
        }

        filters.insert(descriptor.name, descriptor);
        debug!(namespace, name = descriptor.name, "Registered filter");
        RegisterOutcome::Registered
    }

    /// All filter types in `namespace`, sorted by name. Unknown namespaces
    /// are empty.
    pub fn get_all_classes(&self, namespace: &str) -> Vec<FilterDescriptor> {
        let namespaces = match self.namespaces.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        namespaces
            .get(namespace)
            .map(|filters| filters.values().copied().collect())
            .unwrap_or_default()
    }

    /// Looks up one filter type by name.
    pub fn get(&self, namespace: &str, name: &str) -> Option<FilterDescriptor> {
        let namespaces = match self.namespaces.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        namespaces.get(namespace)?.get(name).copied()
    }

    /// Builds the active chain from configured filter names, in order.
    ///
    /// Fails on the first name that is not registered.
    pub fn build_chain<S: AsRef<str>>(
        &self,
        namespace: &str,
        names: &[S],
        env: &FilterEnv,
    ) -> FilterResult<FilterChain> {
        let filters = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(namespace, name)
                    .map(|descriptor| descriptor.build(env))
                    .ok_or_else(|| FilterError::UnknownFilter {
                        namespace: namespace.to_string(),
                        name: name.to_string(),
                    })
            })
            .collect::<FilterResult<Vec<_>>>()?;

        Ok(FilterChain::new(filters))
    }
}

fn malformed_reason(namespace: &str, name: &str) -> Option<String> {
    if namespace.trim().is_empty() {
        return Some("empty namespace".to_string());
    }
    if name.is_empty() {
        return Some("empty filter name".to_string());
    }
    if name.chars().any(char::is_whitespace) {
        return Some(format!("filter name '{name}' contains whitespace"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FilterProperties, HostState, StaticLiveness};

    struct Reject;

    impl HostFilter for Reject {
        fn name(&self) -> &'static str {
            "RetryFilter"
        }

        fn host_passes(&self, _host: &HostState, _props: &FilterProperties) -> bool {
            false
        }
    }

    fn names(descriptors: &[FilterDescriptor]) -> Vec<&'static str> {
        descriptors.iter().map(|d| d.name).collect()
    }

    #[test]
    fn test_standard_filters_discovered() {
        let handler = FilterHandler::with_standard_filters();
        let classes = handler.get_all_classes(STANDARD_NAMESPACE);
        assert_eq!(
            names(&classes),
            vec![
                "AvailabilityZoneFilter",
                "CapabilitiesFilter",
                "CapacityFilter",
                "JsonFilter",
                "RetryFilter",
            ]
        );
    }

    #[test]
    fn test_discovery_is_idempotent() {
        let handler = FilterHandler::with_standard_filters();
        assert_eq!(
            handler.get_all_classes(STANDARD_NAMESPACE),
            handler.get_all_classes(STANDARD_NAMESPACE)
        );
    }

    #[test]
    fn test_unknown_namespace_is_empty() {
        let handler = FilterHandler::with_standard_filters();
        assert!(handler.get_all_classes("somewhere.else").is_empty());
    }

    #[test]
    fn test_duplicate_name_first_wins() {
        let handler = FilterHandler::with_standard_filters();
        let outcome = handler.register(
            STANDARD_NAMESPACE,
            FilterDescriptor::new("RetryFilter", |_| Box::new(Reject)),
        );
        assert_eq!(outcome, RegisterOutcome::Duplicate);

        let chain = handler
            .build_chain(STANDARD_NAMESPACE, &["RetryFilter"], &FilterEnv::default())
            .unwrap();
        let host = HostState::new("host1".parse().unwrap());
        assert!(chain.host_passes(&host, &FilterProperties::default()));
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let handler = FilterHandler::new();
        let bad = handler.register(
            "plugins",
            FilterDescriptor::new("Bad Name", |_| Box::new(Reject)),
        );
        let empty = handler.register("plugins", FilterDescriptor::new("", |_| Box::new(Reject)));
        let good = handler.register(
            "plugins",
            FilterDescriptor::new("Reject", |_| Box::new(Reject)),
        );

        assert!(matches!(bad, RegisterOutcome::Malformed(_)));
        assert!(matches!(empty, RegisterOutcome::Malformed(_)));
        assert_eq!(good, RegisterOutcome::Registered);
        assert_eq!(names(&handler.get_all_classes("plugins")), vec!["Reject"]);
    }

    #[test]
    fn test_build_chain_keeps_configured_order() {
        let handler = FilterHandler::with_standard_filters();
        let env = FilterEnv::new(Arc::new(StaticLiveness(true)));
        let chain = handler
            .build_chain(STANDARD_NAMESPACE, &["RetryFilter", "CapacityFilter"], &env)
            .unwrap();
        assert_eq!(chain.names(), vec!["RetryFilter", "CapacityFilter"]);
    }

    #[test]
    fn test_build_chain_unknown_name_fails_fast() {
        let handler = FilterHandler::with_standard_filters();
        let err = handler
            .build_chain(
                STANDARD_NAMESPACE,
                &["CapacityFilter", "NoSuchFilter"],
                &FilterEnv::default(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            FilterError::UnknownFilter {
                namespace: STANDARD_NAMESPACE.to_string(),
                name: "NoSuchFilter".to_string(),
            }
        );
        assert!(!err.is_invalid_request());
    }
}
