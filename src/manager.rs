//! Caller-facing service manager: named actions and status queries.
use std::sync::Arc;

use tracing::{debug, info};

use crate::action::ActionVerb;
use crate::adapter::{ActionAdapter, ShellAdapter};
use crate::config::Config;
use crate::dispatcher::ActionDispatcher;
use crate::error::{ConfigError, ServiceError};
use crate::hooks::{HookNotifier, ShellHooks};
use crate::locator::{ProcessLocator, SystemLocator};
use crate::service::ServiceDescriptor;
use crate::status::{ServiceStatus, StatusAggregator, StatusFilter, StatusResolver};
use crate::watcher::WatchPolicy;

/// Entry point for starting, stopping and inspecting configured services.
#[derive(Debug, Clone)]
pub struct ServiceManager {
    services: Vec<ServiceDescriptor>,
    dispatcher: ActionDispatcher,
    aggregator: StatusAggregator,
}

impl ServiceManager {
    /// Builds a manager that runs shell commands and inspects the live process table.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let adapter = Arc::new(ShellAdapter::from_config(config));
        let notifier = Arc::new(ShellHooks::from_config(config)?);
        let locator = Arc::new(SystemLocator::with_probe_timeout(config.probe_timeout()?));

        let manager = Self::new(
            config.descriptors(),
            adapter,
            notifier,
            locator,
            config.watch_policy()?,
        );
        Ok(manager.with_status_deadline(config.status_deadline()?))
    }

    /// Assembles a manager from explicit collaborators.
    pub fn new(
        services: Vec<ServiceDescriptor>,
        adapter: Arc<dyn ActionAdapter>,
        notifier: Arc<dyn HookNotifier>,
        locator: Arc<dyn ProcessLocator>,
        policy: WatchPolicy,
    ) -> Self {
        let resolver = StatusResolver::new(locator);
        Self {
            services,
            dispatcher: ActionDispatcher::new(adapter, notifier, resolver.clone(), policy),
            aggregator: StatusAggregator::new(resolver),
        }
    }

    /// Overrides the deadline for aggregate status queries.
    pub fn with_status_deadline(mut self, deadline: std::time::Duration) -> Self {
        let resolver = self.aggregator.resolver().clone();
        self.aggregator = StatusAggregator::with_deadline(resolver, deadline);
        self
    }

    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    pub fn service(&self, name: &str) -> Result<&ServiceDescriptor, ServiceError> {
        self.services
            .iter()
            .find(|service| service.name == name)
            .ok_or_else(|| ServiceError::UnknownService(name.to_string()))
    }

    /// Performs a named action, e.g. `"start"`, on a configured service.
    pub fn perform(
        &self,
        action: &str,
        service: &str,
        extra_args: &[String],
    ) -> Result<ServiceStatus, ServiceError> {
        let verb = ActionVerb::parse(action)?;
        self.perform_verb(verb, service, extra_args)
    }

    pub fn perform_verb(
        &self,
        verb: ActionVerb,
        service: &str,
        extra_args: &[String],
    ) -> Result<ServiceStatus, ServiceError> {
        let descriptor = self.service(service)?;
        info!("Performing {verb} on '{service}'");
        self.dispatcher.perform(verb, descriptor, extra_args)
    }

    /// Statuses of every service selected by `filter`, in configuration order.
    pub fn query_all(&self, filter: Option<&StatusFilter>) -> Vec<ServiceStatus> {
        let selected: Vec<ServiceDescriptor> = self
            .services
            .iter()
            .filter(|service| filter.is_none_or(|f| f.selects(service)))
            .cloned()
            .collect();
        debug!("Querying status of {} service(s)", selected.len());

        self.aggregator
            .resolve_all(&selected)
            .into_iter()
            .filter(|status| filter.is_none_or(|f| f.accepts(status)))
            .collect()
    }

    /// Current status of a single service.
    pub fn status(&self, service: &str) -> Result<ServiceStatus, ServiceError> {
        let descriptor = self.service(service)?;
        Ok(self.aggregator.resolver().resolve(descriptor, None))
    }

    /// Whether the service currently has a running process.
    pub fn is_started(&self, service: &str) -> Result<bool, ServiceError> {
        Ok(self.status(service)?.is_running())
    }
}
