//! Action dispatch: hook, readiness watch, adapter call and status check.
use std::sync::Arc;

use tracing::{info, warn};

use crate::action::ActionVerb;
use crate::adapter::ActionAdapter;
use crate::error::ServiceError;
use crate::hooks::HookNotifier;
use crate::service::ServiceDescriptor;
use crate::status::{ServiceStatus, StatusResolver};
use crate::watcher::{ReadinessWatch, WatchPolicy};

/// Runs one action against one service and reports the resulting status.
#[derive(Clone)]
pub struct ActionDispatcher {
    adapter: Arc<dyn ActionAdapter>,
    notifier: Arc<dyn HookNotifier>,
    resolver: StatusResolver,
    policy: WatchPolicy,
}

impl ActionDispatcher {
    pub fn new(
        adapter: Arc<dyn ActionAdapter>,
        notifier: Arc<dyn HookNotifier>,
        resolver: StatusResolver,
        policy: WatchPolicy,
    ) -> Self {
        Self {
            adapter,
            notifier,
            resolver,
            policy,
        }
    }

    pub fn policy(&self) -> &WatchPolicy {
        &self.policy
    }

    /// Performs `verb` on `service`.
    ///
    /// The pre-action hook fires first. The readiness watch starts before the
    /// adapter runs so its window covers the command itself, and status is
    /// resolved only after the watch finishes. A failed reload is retried once
    /// as a restart.
    pub fn perform(
        &self,
        verb: ActionVerb,
        service: &ServiceDescriptor,
        extra_args: &[String],
    ) -> Result<ServiceStatus, ServiceError> {
        self.notifier.notify(&verb.pre_hook_event(), &service.name);

        let watch = ReadinessWatch::start(service.marker(), verb, &self.policy);

        if let Err(source) = self.adapter.execute(verb, service, extra_args) {
            watch.cancel();

            if verb == ActionVerb::Reload {
                warn!(
                    "Reload of '{}' failed ({source}); falling back to restart",
                    service.name
                );
                return self.perform(ActionVerb::Restart, service, extra_args);
            }

            return Err(ServiceError::ActionFailed {
                action: verb,
                service: service.name.clone(),
                source,
            });
        }

        let status = self.resolver.resolve(service, Some(watch));
        info!("{verb} of '{}' finished: {}", service.name, status.state);
        Ok(status)
    }
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("resolver", &self.resolver)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
