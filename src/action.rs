//! Action verbs understood by the dispatcher.
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::error::ServiceError;

/// One of the four lifecycle actions a service can receive.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    AsRefStr,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActionVerb {
    Start,
    Stop,
    Restart,
    Reload,
}

/// Post-condition the readiness watcher waits for after an action is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerExpectation {
    /// The marker file exists and has content.
    Populated,
    /// The marker file is gone.
    Removed,
}

impl ActionVerb {
    /// Parses a user-supplied action name.
    pub fn parse(name: &str) -> Result<Self, ServiceError> {
        name.trim()
            .to_ascii_lowercase()
            .parse()
            .map_err(|_| ServiceError::UnknownAction(name.to_string()))
    }

    /// What the readiness watcher should wait for, if anything.
    pub fn marker_expectation(self) -> Option<MarkerExpectation> {
        match self {
            ActionVerb::Start | ActionVerb::Restart => Some(MarkerExpectation::Populated),
            ActionVerb::Stop => Some(MarkerExpectation::Removed),
            ActionVerb::Reload => None,
        }
    }

    /// Name of the hook event fired before this action.
    pub fn pre_hook_event(self) -> String {
        format!("service.pre_{}", self.as_ref())
    }
}
