//! Retry filter.

use tracing::debug;

use crate::{FilterProperties, HostFilter, HostState};

/// Rejects hosts already attempted for this request.
///
/// The attempt history lives in `FilterProperties::retry`; without it every
/// host counts as a first attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryFilter;

impl RetryFilter {
    pub const NAME: &'static str = "RetryFilter";
}

impl HostFilter for RetryFilter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn host_passes(&self, host: &HostState, props: &FilterProperties) -> bool {
        let Some(retry) = &props.retry else {
            return true;
        };

        let passes = !retry.contains(&host.host);
        debug!(
            host = %host.host,
            num_attempts = retry.num_attempts,
            passes,
            "Checked host against previous attempts"
        );
        passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_support::host_id;
    use crate::RetryInfo;

    fn props_with_retry(num_attempts: u32, hosts: &[&str]) -> FilterProperties {
        FilterProperties {
            retry: Some(RetryInfo {
                num_attempts,
                hosts: hosts.iter().map(|h| host_id(h)).collect(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_retry_disabled() {
        let host = HostState::new(host_id("host1"));
        assert!(RetryFilter.host_passes(&host, &FilterProperties::default()));
    }

    #[test]
    fn test_retry_pass() {
        let host = HostState::new(host_id("host1"));
        assert!(RetryFilter.host_passes(&host, &props_with_retry(2, &["host2"])));
    }

    #[test]
    fn test_retry_fail() {
        let host = HostState::new(host_id("host1"));
        assert!(!RetryFilter.host_passes(&host, &props_with_retry(1, &["host1"])));
    }

    #[test]
    fn test_pool_of_attempted_host_is_distinct() {
        let host = HostState::new(host_id("host1#pool2"));
        assert!(RetryFilter.host_passes(&host, &props_with_retry(1, &["host1#pool1"])));
    }
}
