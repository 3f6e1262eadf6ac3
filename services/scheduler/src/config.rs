//! Scheduler configuration (environment driven).

use std::time::Duration;

use anyhow::{bail, Context, Result};
use hostsched_filters::DEFAULT_SERVICE_DOWN_TIME;

use crate::driver::SchedulerOptions;

/// Filters enabled when `HOSTSCHED_FILTERS` is not set.
pub const DEFAULT_FILTERS: &[&str] = &[
    "AvailabilityZoneFilter",
    "CapacityFilter",
    "CapabilitiesFilter",
    "JsonFilter",
    "RetryFilter",
];

/// Default number of scheduling attempts per request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct Config {
    /// Active filter names, in evaluation order.
    pub filter_names: Vec<String>,

    /// Attempts allowed per request; 1 disables rescheduling.
    pub max_attempts: u32,

    /// Heartbeat age after which a service counts as down.
    pub service_down_time: Duration,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let filter_names = match var("HOSTSCHED_FILTERS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_FILTERS.iter().map(|name| name.to_string()).collect(),
        };

        let max_attempts: u32 = var("HOSTSCHED_MAX_ATTEMPTS")
            .map(|v| v.parse())
            .transpose()
            .context("HOSTSCHED_MAX_ATTEMPTS must be a positive integer.")?
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);
        if max_attempts < 1 {
            bail!("HOSTSCHED_MAX_ATTEMPTS must be at least 1, got {max_attempts}.");
        }

        let service_down_time = var("HOSTSCHED_SERVICE_DOWN_TIME")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("HOSTSCHED_SERVICE_DOWN_TIME must be an integer (seconds).")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SERVICE_DOWN_TIME);

        let log_level = var("HOSTSCHED_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            filter_names,
            max_attempts,
            service_down_time,
            log_level,
        })
    }

    /// Options for the filter scheduler.
    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            filter_names: self.filter_names.clone(),
            max_attempts: self.max_attempts,
        }
    }
}
