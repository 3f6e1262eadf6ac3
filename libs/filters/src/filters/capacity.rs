//! Capacity filter.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{Capacity, FilterProperties, HostFilter, HostState, ServiceLiveness};

/// Rejects hosts that are down, disabled, or cannot fit the requested size
/// once their reservation is taken out.
///
/// The reservation is `total * reserved_percentage / 100` and is subtracted
/// from *free* capacity. When total capacity is not reported as a number,
/// free capacity is used as the reservation base.
pub struct CapacityFilter {
    liveness: Arc<dyn ServiceLiveness>,
}

impl CapacityFilter {
    pub const NAME: &'static str = "CapacityFilter";

    pub fn new(liveness: Arc<dyn ServiceLiveness>) -> Self {
        Self { liveness }
    }

    /// Usable capacity scaled by 100 so that the percentage carve-out stays
    /// exact in integer arithmetic.
    fn usable_x100(free: u64, total: Capacity, reserved_percentage: u8) -> i128 {
        let base = total.as_numeric().unwrap_or(free);
        let reserved = i128::from(reserved_percentage.min(100));
        i128::from(free) * 100 - i128::from(base) * reserved
    }
}

impl HostFilter for CapacityFilter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn host_passes(&self, host: &HostState, props: &FilterProperties) -> bool {
        if host.service.disabled {
            debug!(host = %host.host, "Service is disabled");
            return false;
        }
        if !self.liveness.service_is_up(&host.service) {
            debug!(host = %host.host, "Service is down");
            return false;
        }

        if props.share_exists_on.as_ref() == Some(&host.host) {
            return true;
        }

        let free = match host.free_capacity_gb {
            Capacity::Infinite | Capacity::Unknown => return true,
            Capacity::Numeric(free) => free,
        };

        if props.size == 0 {
            return true;
        }

        let usable_x100 = Self::usable_x100(free, host.total_capacity_gb, host.reserved_percentage);
        if usable_x100 >= i128::from(props.size) * 100 {
            return true;
        }

        warn!(
            host = %host.host,
            requested_gb = props.size,
            available_gb = usable_x100 as f64 / 100.0,
            free_gb = free,
            reserved_percentage = host.reserved_percentage,
            "Insufficient free space for share creation"
        );
        false
    }
}
