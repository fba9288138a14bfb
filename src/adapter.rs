//! Action adapters: the concrete commands behind each service action.
use std::{
    collections::HashMap,
    process::{Command, Stdio},
};

use tracing::{debug, info, warn};

use crate::action::ActionVerb;
use crate::config::Config;
use crate::constants::{BEST_EFFORT_PREFIX, DEFAULT_SHELL, FORCE_STOP_VERB, SHELL_COMMAND_FLAG};
use crate::error::AdapterError;
use crate::service::ServiceDescriptor;

/// Carries out an action for a service.
pub trait ActionAdapter: Send + Sync {
    fn execute(
        &self,
        action: ActionVerb,
        service: &ServiceDescriptor,
        extra_args: &[String],
    ) -> Result<(), AdapterError>;
}

/// A single shell command in an action sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStep {
    pub command: String,
    /// Failures of best-effort steps are logged and ignored.
    pub best_effort: bool,
}

impl CommandStep {
    /// Parses a configured command; a leading `-` marks it best-effort.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.strip_prefix(BEST_EFFORT_PREFIX) {
            Some(rest) => Self::best_effort(rest.trim_start()),
            None => Self::checked(trimmed),
        }
    }

    pub fn checked(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            best_effort: false,
        }
    }

    pub fn best_effort(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            best_effort: true,
        }
    }
}

/// How a service's actions are carried out, resolved once from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServicePlan {
    /// Every verb goes to the generic service manager.
    Generic { rc_name: String },
    /// Some verbs have dedicated command sequences; the rest fall back to generic.
    Scripted {
        rc_name: String,
        scripts: HashMap<ActionVerb, Vec<CommandStep>>,
    },
}

impl ServicePlan {
    fn rc_name(&self) -> &str {
        match self {
            ServicePlan::Generic { rc_name } | ServicePlan::Scripted { rc_name, .. } => rc_name,
        }
    }
}

/// Adapter that runs configured shell commands.
#[derive(Debug, Clone)]
pub struct ShellAdapter {
    service_manager: String,
    plans: HashMap<String, ServicePlan>,
}

impl ShellAdapter {
    pub fn new(service_manager: impl Into<String>, plans: HashMap<String, ServicePlan>) -> Self {
        Self {
            service_manager: service_manager.into(),
            plans,
        }
    }

    /// Builds one plan per configured service.
    pub fn from_config(config: &Config) -> Self {
        let plans = config
            .services
            .iter()
            .map(|service| {
                let rc_name = service.rc_name().to_string();
                let plan = if service.actions.is_empty() {
                    ServicePlan::Generic { rc_name }
                } else {
                    let scripts = service
                        .actions
                        .iter()
                        .map(|(verb, commands)| {
                            (
                                *verb,
                                commands
                                    .iter()
                                    .map(|c| CommandStep::parse(c))
                                    .collect::<Vec<_>>(),
                            )
                        })
                        .collect();
                    ServicePlan::Scripted { rc_name, scripts }
                };
                (service.name.clone(), plan)
            })
            .collect();

        Self::new(config.service_manager(), plans)
    }

    pub fn plan(&self, service: &str) -> Option<&ServicePlan> {
        self.plans.get(service)
    }

    /// Commands that `execute` would run, in order.
    pub fn steps(
        &self,
        action: ActionVerb,
        service: &str,
        extra_args: &[String],
    ) -> Vec<CommandStep> {
        let rc_name = self
            .plans
            .get(service)
            .map(ServicePlan::rc_name)
            .unwrap_or(service);

        if let Some(ServicePlan::Scripted { scripts, .. }) = self.plans.get(service)
            && let Some(steps) = scripts.get(&action)
        {
            return steps.clone();
        }

        self.generic_steps(action, rc_name, extra_args)
    }

    fn generic_steps(
        &self,
        action: ActionVerb,
        rc_name: &str,
        extra_args: &[String],
    ) -> Vec<CommandStep> {
        let mut steps = Vec::with_capacity(2);
        if action == ActionVerb::Restart {
            steps.push(CommandStep::best_effort(format!(
                "{} {} {}",
                self.service_manager, rc_name, FORCE_STOP_VERB
            )));
        }

        let mut command = format!("{} {} {}", self.service_manager, rc_name, action);
        for arg in extra_args {
            command.push(' ');
            command.push_str(arg);
        }
        steps.push(CommandStep::checked(command));
        steps
    }

    fn run_step(
        step: &CommandStep,
        action: ActionVerb,
        service: &str,
        extra_args: &[String],
    ) -> Result<(), AdapterError> {
        debug!("Calling: {action}({service}) -> `{}`", step.command);

        let status = Command::new(DEFAULT_SHELL)
            .arg(SHELL_COMMAND_FLAG)
            .arg(&step.command)
            .env("SERVICE_NAME", service)
            .env("SERVICE_ACTION", action.as_ref())
            .env("SERVICE_ARGS", extra_args.join(" "))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        let failure = match status {
            Ok(status) if status.success() => return Ok(()),
            Ok(status) => AdapterError::Exit {
                command: step.command.clone(),
                code: status.code(),
            },
            Err(source) => AdapterError::Spawn {
                command: step.command.clone(),
                source,
            },
        };

        if step.best_effort {
            warn!("Ignoring failed step for {action} of '{service}': {failure}");
            Ok(())
        } else {
            Err(failure)
        }
    }
}

impl ActionAdapter for ShellAdapter {
    fn execute(
        &self,
        action: ActionVerb,
        service: &ServiceDescriptor,
        extra_args: &[String],
    ) -> Result<(), AdapterError> {
        let steps = self.steps(action, &service.name, extra_args);
        if steps.is_empty() {
            return Err(AdapterError::Unsupported {
                action,
                service: service.name.clone(),
            });
        }

        for step in &steps {
            Self::run_step(step, action, &service.name, extra_args)?;
        }

        info!("Completed {action} of '{}' ({} step(s))", service.name, steps.len());
        Ok(())
    }
}
