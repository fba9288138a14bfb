//! Pre-action hook notification.
use std::{
    collections::HashMap,
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use tracing::{debug, error, warn};

use crate::config::Config;
use crate::constants::{CHILD_POLL_INTERVAL, DEFAULT_SHELL, SHELL_COMMAND_FLAG};
use crate::error::ConfigError;

/// Receives lifecycle events before an action runs. Fire-and-forget.
pub trait HookNotifier: Send + Sync {
    fn notify(&self, event: &str, service: &str);
}

/// Notifier that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl HookNotifier for NoopNotifier {
    fn notify(&self, event: &str, service: &str) {
        debug!("No hook registered for {event} ({service})");
    }
}

/// A configured hook command.
#[derive(Debug, Clone)]
struct ShellHook {
    command: String,
    timeout: Duration,
}

/// Runs the shell command configured for each event, bounded by a timeout.
#[derive(Debug, Clone, Default)]
pub struct ShellHooks {
    hooks: HashMap<String, ShellHook>,
}

impl ShellHooks {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut hooks = HashMap::new();
        for (event, action) in &config.hooks {
            hooks.insert(
                event.clone(),
                ShellHook {
                    command: action.command.clone(),
                    timeout: Config::hook_timeout(action)?,
                },
            );
        }
        Ok(Self { hooks })
    }

    /// Registers a hook command for `event`.
    pub fn with_hook(mut self, event: &str, command: &str, timeout: Duration) -> Self {
        self.hooks.insert(
            event.to_string(),
            ShellHook {
                command: command.to_string(),
                timeout,
            },
        );
        self
    }
}

impl HookNotifier for ShellHooks {
    fn notify(&self, event: &str, service: &str) {
        let Some(hook) = self.hooks.get(event) else {
            return;
        };

        debug!("Running {event} hook for '{service}': `{}`", hook.command);

        let spawned = Command::new(DEFAULT_SHELL)
            .arg(SHELL_COMMAND_FLAG)
            .arg(&hook.command)
            .env("SERVICE_NAME", service)
            .env("SERVICE_EVENT", event)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                error!("Failed to run {event} hook for '{service}': {err}");
                return;
            }
        };

        match wait_with_timeout(&mut child, hook.timeout) {
            Ok(Some(status)) if status.success() => {
                debug!("{event} hook for '{service}' completed successfully.");
            }
            Ok(Some(status)) => {
                warn!("{event} hook for '{service}' exited with status: {status:?}");
            }
            Ok(None) => {
                warn!(
                    "{event} hook for '{service}' timed out after {:?}. Terminating hook process.",
                    hook.timeout
                );
                if let Err(err) = child.kill() {
                    error!("Failed to terminate timed-out hook {event} for '{service}': {err}");
                }
                let _ = child.wait();
            }
            Err(err) => {
                error!("Failed while waiting for hook {event} on '{service}': {err}");
            }
        }
    }
}

/// Wait for a child process with a timeout, returning `Ok(None)` on timeout.
pub(crate) fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;

    loop {
        match child.try_wait()? {
            Some(status) => return Ok(Some(status)),
            None => {
                if Instant::now() >= deadline {
                    return Ok(None);
                }
                thread::sleep(CHILD_POLL_INTERVAL);
            }
        }
    }
}
