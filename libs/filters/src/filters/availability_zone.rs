//! Availability zone filter.

use crate::{FilterProperties, HostFilter, HostState};

/// Keeps hosts in the requested availability zone. Requests without a zone
/// accept every host.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvailabilityZoneFilter;

impl AvailabilityZoneFilter {
    pub const NAME: &'static str = "AvailabilityZoneFilter";
}

impl HostFilter for AvailabilityZoneFilter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn host_passes(&self, host: &HostState, props: &FilterProperties) -> bool {
        match props.availability_zone.as_deref() {
            Some(zone) => host.availability_zone() == Some(zone),
            None => true,
        }
    }
}
