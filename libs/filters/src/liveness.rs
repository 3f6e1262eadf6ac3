//! Service liveness checks.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::ServiceRecord;

/// Default maximum heartbeat age before a service counts as down.
pub const DEFAULT_SERVICE_DOWN_TIME: Duration = Duration::from_secs(60);

/// Answers whether the service behind a host is alive.
///
/// Implementations must be fast local computations; filters call this once
/// per candidate host.
pub trait ServiceLiveness: Send + Sync {
    fn service_is_up(&self, service: &ServiceRecord) -> bool;
}

/// Heartbeat-age liveness: a service is up if its last heartbeat is no
/// older (or newer, for skewed clocks) than `service_down_time`.
#[derive(Debug, Clone)]
pub struct HeartbeatLiveness {
    service_down_time: Duration,
}

impl HeartbeatLiveness {
    pub fn new(service_down_time: Duration) -> Self {
        Self { service_down_time }
    }

    pub fn service_down_time(&self) -> Duration {
        self.service_down_time
    }

    /// Liveness evaluated against an explicit clock reading.
    pub fn is_up_at(&self, service: &ServiceRecord, now: DateTime<Utc>) -> bool {
        let Some(last_heartbeat) = service.last_heartbeat() else {
            debug!("Service has never reported a heartbeat");
            return false;
        };

        let elapsed = (now - last_heartbeat).abs();
        match elapsed.to_std() {
            Ok(elapsed) => elapsed <= self.service_down_time,
            Err(_) => false,
        }
    }
}

impl Default for HeartbeatLiveness {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_DOWN_TIME)
    }
}

impl ServiceLiveness for HeartbeatLiveness {
    fn service_is_up(&self, service: &ServiceRecord) -> bool {
        self.is_up_at(service, Utc::now())
    }
}

/// Liveness with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct StaticLiveness(pub bool);

impl ServiceLiveness for StaticLiveness {
    fn service_is_up(&self, _service: &ServiceRecord) -> bool {
        self.0
    }
}
