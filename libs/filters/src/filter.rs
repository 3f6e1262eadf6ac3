//! The filter capability and the chain that combines filters.

use hostsched_id::HostId;
use serde::Serialize;
use tracing::debug;

use crate::{FilterProperties, FilterResult, HostState};

/// A predicate deciding whether a host stays a candidate for a request.
///
/// `host_passes` must depend only on its two arguments and on read-only
/// configuration fixed at construction, so that filters can be shared
/// across threads and evaluated in any order.
pub trait HostFilter: Send + Sync {
    /// Registered name of the filter.
    fn name(&self) -> &'static str;

    /// Returns `true` if the host is NOT excluded by this filter.
    fn host_passes(&self, host: &HostState, props: &FilterProperties) -> bool;

    /// Checks request-side inputs this filter depends on before any host is
    /// evaluated.
    fn validate(&self, _props: &FilterProperties) -> FilterResult<()> {
        Ok(())
    }
}

/// Hosts accepted by a single filter, in input order.
pub fn filter_all<'a, I>(
    filter: &'a dyn HostFilter,
    hosts: I,
    props: &'a FilterProperties,
) -> impl Iterator<Item = &'a HostState> + 'a
where
    I: IntoIterator<Item = &'a HostState>,
    I::IntoIter: 'a,
{
    hosts
        .into_iter()
        .filter(move |host| filter.host_passes(host, props))
}

/// Outcome of running the chain over one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostVerdict {
    pub host: HostId,
    pub passed: bool,

    /// First filter that rejected the host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_by: Option<&'static str>,
}

/// Ordered set of active filters combined with logical AND.
pub struct FilterChain {
    filters: Vec<Box<dyn HostFilter>>,
}

impl FilterChain {
    pub fn new(filters: Vec<Box<dyn HostFilter>>) -> Self {
        Self { filters }
    }

    /// Names of the active filters, in evaluation order.
    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Runs every filter's request validation.
    pub fn validate(&self, props: &FilterProperties) -> FilterResult<()> {
        self.filters.iter().try_for_each(|f| f.validate(props))
    }

    /// Name of the first filter rejecting `host`, or `None` if all accept.
    pub fn first_rejection(
        &self,
        host: &HostState,
        props: &FilterProperties,
    ) -> Option<&'static str> {
        self.filters
            .iter()
            .find(|f| !f.host_passes(host, props))
            .map(|f| f.name())
    }

    /// Returns true if every filter accepts the host.
    pub fn host_passes(&self, host: &HostState, props: &FilterProperties) -> bool {
        match self.first_rejection(host, props) {
            None => true,
            Some(filter) => {
                debug!(host = %host.host, filter, "Host rejected");
                false
            }
        }
    }

    /// Hosts accepted by every filter, in candidate order.
    pub fn filter_hosts<'a>(
        &self,
        hosts: &'a [HostState],
        props: &FilterProperties,
    ) -> Vec<&'a HostState> {
        hosts
            .iter()
            .filter(|host| self.host_passes(host, props))
            .collect()
    }

    /// Per-host verdicts, in candidate order.
    pub fn evaluate(&self, hosts: &[HostState], props: &FilterProperties) -> Vec<HostVerdict> {
        hosts
            .iter()
            .map(|host| {
                let rejected_by = self.first_rejection(host, props);
                HostVerdict {
                    host: host.host.clone(),
                    passed: rejected_by.is_none(),
                    rejected_by,
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.names())
            .finish()
    }
}
