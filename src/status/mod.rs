//! Service status model, single-service resolution and concurrent aggregation.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::constants::STATUS_SCHEMA_VERSION;
use crate::service::ServiceDescriptor;

pub mod aggregator;
pub mod resolver;

pub use aggregator::StatusAggregator;
pub use resolver::StatusResolver;

/// Observed state of a service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ServiceState {
    /// A matching process exists.
    Running,
    /// Not running and not expected to run.
    Stopped,
    /// Not running although enabled at boot.
    Crashed,
    /// Resolution did not finish within the query deadline.
    Unknown,
}

impl ServiceState {
    /// Classifies a lookup result; never yields `Unknown`.
    pub fn classify(found: bool, enabled: bool) -> Self {
        match (found, enabled) {
            (true, _) => ServiceState::Running,
            (false, true) => ServiceState::Crashed,
            (false, false) => ServiceState::Stopped,
        }
    }
}

/// Status of one service, produced fresh on every resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub service: String,
    pub enabled: bool,
    pub state: ServiceState,
    pub pids: Vec<u32>,
}

impl ServiceStatus {
    pub fn new(service: &ServiceDescriptor, state: ServiceState, pids: Vec<u32>) -> Self {
        Self {
            service: service.name.clone(),
            enabled: service.enabled,
            state,
            pids,
        }
    }

    /// Fallback used when resolution did not complete in time.
    pub fn unknown(service: &ServiceDescriptor) -> Self {
        Self::new(service, ServiceState::Unknown, Vec::new())
    }

    pub fn is_running(&self) -> bool {
        self.state == ServiceState::Running
    }
}

/// Narrows a status query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusFilter {
    /// Only these services; empty means all.
    pub services: Vec<String>,
    /// Only results in one of these states; empty means any.
    pub states: Vec<ServiceState>,
    /// Only services with this enabled-at-boot flag.
    pub enabled: Option<bool>,
}

impl StatusFilter {
    /// Whether `service` should be resolved at all.
    pub fn selects(&self, service: &ServiceDescriptor) -> bool {
        (self.services.is_empty() || self.services.iter().any(|name| *name == service.name))
            && self.enabled.is_none_or(|enabled| enabled == service.enabled)
    }

    /// Whether a resolved status should be reported.
    pub fn accepts(&self, status: &ServiceStatus) -> bool {
        self.states.is_empty() || self.states.contains(&status.state)
    }
}

/// Machine-readable result of a status query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub schema_version: String,
    pub captured_at: DateTime<Utc>,
    pub services: Vec<ServiceStatus>,
}

impl StatusReport {
    pub fn new(services: Vec<ServiceStatus>) -> Self {
        Self {
            schema_version: STATUS_SCHEMA_VERSION.to_string(),
            captured_at: Utc::now(),
            services,
        }
    }
}
