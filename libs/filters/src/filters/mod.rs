//! Standard host filters.

mod availability_zone;
mod capabilities;
mod capacity;
mod json;
mod retry;

pub use availability_zone::AvailabilityZoneFilter;
pub use capabilities::CapabilitiesFilter;
pub use capacity::CapacityFilter;
pub use json::{JsonFilter, JsonQuery};
pub use retry::RetryFilter;

#[cfg(test)]
pub(crate) mod test_support {
    use hostsched_id::HostId;

    use crate::{Capacity, HostState, ServiceRecord};

    pub fn host_id(id: &str) -> HostId {
        HostId::parse(id).unwrap()
    }

    pub fn gb(n: u64) -> Capacity {
        Capacity::Numeric(n)
    }

    /// Enabled host with the given free capacity and nothing else reported.
    pub fn host(id: &str, free: Capacity) -> HostState {
        HostState::new(host_id(id))
            .with_free_capacity(free)
            .with_service(ServiceRecord::default())
    }
}
