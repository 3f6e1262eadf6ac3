//! Filter scheduler.
//!
//! The driver is responsible for:
//! - Building the active filter chain from configured names
//! - Tracking scheduling attempts in the request's retry info
//! - Running the chain over a host snapshot and picking a host
//!
//! Hosts are not weighed: the first surviving host in candidate order is
//! selected.

use hostsched_filters::{
    FilterChain, FilterEnv, FilterError, FilterHandler, FilterProperties, HostState, HostVerdict,
    RetryInfo, STANDARD_NAMESPACE,
};
use hostsched_id::HostId;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::{DEFAULT_FILTERS, DEFAULT_MAX_ATTEMPTS};

/// Result type for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Errors that can occur during scheduling.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no valid host was found: {0}")]
    NoValidHost(String),
}

impl From<FilterError> for SchedulerError {
    fn from(err: FilterError) -> Self {
        if err.is_invalid_request() {
            SchedulerError::InvalidRequest(err.to_string())
        } else {
            SchedulerError::Configuration(err.to_string())
        }
    }
}

/// Options for building a [`FilterScheduler`].
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Active filter names, in evaluation order.
    pub filter_names: Vec<String>,

    /// Attempts allowed per request; 1 disables rescheduling.
    pub max_attempts: u32,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            filter_names: DEFAULT_FILTERS.iter().map(|name| name.to_string()).collect(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Host picked for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub host: HostId,

    /// Attempt number of this decision, when rescheduling is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_attempts: Option<u32>,
}

/// Scheduler that filters candidate hosts through a chain of host filters.
#[derive(Debug)]
pub struct FilterScheduler {
    chain: FilterChain,
    max_attempts: u32,
}

impl FilterScheduler {
    /// Builds the scheduler from the standard filter namespace.
    ///
    /// Fails if a configured filter is not registered or `max_attempts` is 0.
    pub fn new(
        handler: &FilterHandler,
        options: &SchedulerOptions,
        env: &FilterEnv,
    ) -> SchedulerResult<Self> {
        let chain = handler.build_chain(STANDARD_NAMESPACE, &options.filter_names, env)?;
        Self::from_chain(chain, options.max_attempts)
    }

    /// Wraps an already built chain.
    pub fn from_chain(chain: FilterChain, max_attempts: u32) -> SchedulerResult<Self> {
        if max_attempts < 1 {
            return Err(SchedulerError::Configuration(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        info!(filters = ?chain.names(), max_attempts, "Filter scheduler ready");
        Ok(Self {
            chain,
            max_attempts,
        })
    }

    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Starts or advances the request's retry info.
    ///
    /// With `max_attempts == 1` rescheduling is disabled and the properties
    /// are left untouched.
    pub fn populate_retry(&self, props: &mut FilterProperties) -> SchedulerResult<()> {
        if self.max_attempts == 1 {
            return Ok(());
        }

        let retry = props.retry.get_or_insert_with(RetryInfo::default);
        let attempt = retry.num_attempts.checked_add(1);
        if let Some(attempt) = attempt {
            retry.num_attempts = attempt;
        }

        if attempt.is_none_or(|attempt| attempt > self.max_attempts) {
            let request = props
                .request_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "unidentified request".to_string());
            return Err(SchedulerError::NoValidHost(format!(
                "exceeded max scheduling attempts {} for {}",
                self.max_attempts, request
            )));
        }
        Ok(())
    }

    /// Hosts accepted by every active filter, in candidate order.
    pub fn filter_hosts<'a>(
        &self,
        hosts: &'a [HostState],
        props: &FilterProperties,
    ) -> SchedulerResult<Vec<&'a HostState>> {
        self.chain.validate(props)?;
        Ok(self.chain.filter_hosts(hosts, props))
    }

    /// Per-host verdicts for operator inspection.
    pub fn evaluate(
        &self,
        hosts: &[HostState],
        props: &FilterProperties,
    ) -> SchedulerResult<Vec<HostVerdict>> {
        self.chain.validate(props)?;
        Ok(self.chain.evaluate(hosts, props))
    }

    /// Picks a host for the request and records it as attempted.
    #[instrument(skip_all, fields(request_id = ?props.request_id, candidates = hosts.len()))]
    pub fn schedule(
        &self,
        hosts: &[HostState],
        props: &mut FilterProperties,
    ) -> SchedulerResult<Selection> {
        self.populate_retry(props)?;

        let survivors = self.filter_hosts(hosts, props)?;
        debug!(survivors = survivors.len(), "Filtered candidate hosts");

        let Some(chosen) = survivors.first() else {
            warn!(size_gb = props.size, "No host passed the filter chain");
            return Err(SchedulerError::NoValidHost(format!(
                "none of {} candidate hosts passed the filters",
                hosts.len()
            )));
        };

        let host = chosen.host.clone();
        let num_attempts = props.retry.as_mut().map(|retry| {
            retry.record_attempt(host.clone());
            retry.num_attempts
        });

        info!(host = %host, num_attempts, "Selected host");
        Ok(Selection { host, num_attempts })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use hostsched_filters::{Capacity, StaticLiveness};

    fn scheduler(filters: &[&str], max_attempts: u32) -> FilterScheduler {
        let handler = FilterHandler::with_standard_filters();
        let options = SchedulerOptions {
            filter_names: filters.iter().map(|f| f.to_string()).collect(),
            max_attempts,
        };
        let env = FilterEnv::new(Arc::new(StaticLiveness(true)));
        FilterScheduler::new(&handler, &options, &env).unwrap()
    }

    fn host(id: &str, free: u64) -> HostState {
        HostState::new(HostId::parse(id).unwrap()).with_free_capacity(Capacity::Numeric(free))
    }

    #[test]
    fn test_unknown_filter_is_configuration_error() {
        let handler = FilterHandler::with_standard_filters();
        let options = SchedulerOptions {
            filter_names: vec!["CapacityFilter".to_string(), "WeightFilter".to_string()],
            max_attempts: 3,
        };
        let err = FilterScheduler::new(&handler, &options, &FilterEnv::default()).unwrap_err();
        assert!(matches!(err, SchedulerError::Configuration(_)));
    }

    #[test]
    fn test_zero_max_attempts_rejected() {
        let err = FilterScheduler::from_chain(FilterChain::new(Vec::new()), 0).unwrap_err();
        assert!(matches!(err, SchedulerError::Configuration(_)));
    }

    #[test]
    fn test_populate_retry_starts_and_advances() {
        let scheduler = scheduler(&["RetryFilter"], 3);
        let mut props = FilterProperties::default();

        scheduler.populate_retry(&mut props).unwrap();
        assert_eq!(props.retry.as_ref().unwrap().num_attempts, 1);

        scheduler.populate_retry(&mut props).unwrap();
        scheduler.populate_retry(&mut props).unwrap();
        assert_eq!(props.retry.as_ref().unwrap().num_attempts, 3);

        let err = scheduler.populate_retry(&mut props).unwrap_err();
        assert!(matches!(err, SchedulerError::NoValidHost(_)));
    }

    #[test]
    fn test_populate_retry_saturated_counter_is_exhausted() {
        let scheduler = scheduler(&["RetryFilter"], 3);
        let mut props = FilterProperties::from_json(serde_json::json!({
            "retry": {"num_attempts": u32::MAX, "hosts": []}
        }))
        .unwrap();

        let err = scheduler.schedule(&[host("h", 1)], &mut props).unwrap_err();
        assert!(matches!(err, SchedulerError::NoValidHost(_)));
        assert_eq!(props.retry.as_ref().unwrap().num_attempts, u32::MAX);
    }

    #[test]
    fn test_populate_retry_disabled_with_single_attempt() {
        let scheduler = scheduler(&["RetryFilter"], 1);
        let mut props = FilterProperties::default();
        scheduler.populate_retry(&mut props).unwrap();
        assert!(props.retry.is_none());
    }

    #[test]
    fn test_schedule_picks_first_survivor_and_records_it() {
        let scheduler = scheduler(&["CapacityFilter", "RetryFilter"], 3);
        let hosts = vec![host("small", 10), host("big1", 500), host("big2", 800)];
        let mut props = FilterProperties::with_size(100);

        let first = scheduler.schedule(&hosts, &mut props).unwrap();
        assert_eq!(first.host, "big1");
        assert_eq!(first.num_attempts, Some(1));

        // The failed attempt on big1 is remembered by the retry filter.
        let second = scheduler.schedule(&hosts, &mut props).unwrap();
        assert_eq!(second.host, "big2");
        assert_eq!(second.num_attempts, Some(2));
        assert_eq!(props.retry.as_ref().unwrap().hosts.len(), 2);

        let err = scheduler.schedule(&hosts, &mut props).unwrap_err();
        assert!(matches!(err, SchedulerError::NoValidHost(_)));
    }

    #[test]
    fn test_schedule_without_retry_tracking() {
        let scheduler = scheduler(&["CapacityFilter", "RetryFilter"], 1);
        let hosts = vec![host("big1", 500)];
        let mut props = FilterProperties::with_size(100);

        let selection = scheduler.schedule(&hosts, &mut props).unwrap();
        assert_eq!(selection.num_attempts, None);
        assert!(props.retry.is_none());
    }

    #[test]
    fn test_invalid_query_is_invalid_request() {
        let scheduler = scheduler(&["JsonFilter"], 3);
        let mut props = FilterProperties::default();
        props.scheduler_hints.query = Some("[\"bogus\"]".to_string());

        let err = scheduler.schedule(&[host("h", 1)], &mut props).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidRequest(_)));
    }
}
