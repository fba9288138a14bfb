//! Single-service status resolution.
use std::sync::Arc;

use tracing::debug;

use super::{ServiceState, ServiceStatus};
use crate::locator::ProcessLocator;
use crate::service::ServiceDescriptor;
use crate::watcher::ReadinessWatch;

/// Classifies one service from a process lookup and its enabled flag.
#[derive(Clone)]
pub struct StatusResolver {
    locator: Arc<dyn ProcessLocator>,
}

impl StatusResolver {
    pub fn new(locator: Arc<dyn ProcessLocator>) -> Self {
        Self { locator }
    }

    /// Resolves the current status of `service`.
    ///
    /// A pending readiness watch is joined first; the wait is bounded by the
    /// watch's own retry budget.
    pub fn resolve(
        &self,
        service: &ServiceDescriptor,
        prior_watch: Option<ReadinessWatch>,
    ) -> ServiceStatus {
        if let Some(watch) = prior_watch {
            let outcome = watch.join();
            debug!("Readiness for '{}' before status check: {outcome:?}", service.name);
        }

        let located = self.locator.locate(&service.identity);
        let state = ServiceState::classify(located.found, service.enabled);
        debug!("Service '{}' resolved to {state} (pids {:?})", service.name, located.pids);

        let pids = if state == ServiceState::Running {
            located.pids
        } else {
            Vec::new()
        };
        ServiceStatus::new(service, state, pids)
    }
}

impl std::fmt::Debug for StatusResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusResolver").finish_non_exhaustive()
    }
}
