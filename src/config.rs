//! Configuration management for servicectl.
use regex::Regex;
use serde::Deserialize;
use std::{
    collections::{HashMap, HashSet},
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::action::ActionVerb;
use crate::constants::{
    DEFAULT_CONFIG_FILES, DEFAULT_HOOK_TIMEOUT, DEFAULT_PROBE_TIMEOUT, DEFAULT_SERVICE_MANAGER,
    PIDFILE_WRITE_GRACE, STATUS_DEADLINE, WATCH_POLL_INTERVAL, WATCH_RETRIES,
};
use crate::error::ConfigError;
use crate::service::{ProcessIdentity, ServiceDescriptor};
use crate::watcher::WatchPolicy;

/// Represents the structure of the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Configuration version.
    pub version: String,
    /// Binary used for generic `<rc-name> <verb>` invocations.
    pub service_manager: Option<String>,
    /// Overall budget for multi-service status queries (e.g. "15s").
    pub status_deadline: Option<String>,
    /// Upper bound for each custom status probe (e.g. "5s").
    pub probe_timeout: Option<String>,
    /// Readiness watcher timing.
    pub readiness: Option<ReadinessConfig>,
    /// Hook commands keyed by event name (e.g. `service.pre_start`).
    #[serde(default)]
    pub hooks: HashMap<String, HookAction>,
    /// Services in the order they are reported.
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

/// Timing knobs for the readiness watcher.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadinessConfig {
    /// Interval between marker checks.
    pub interval: Option<String>,
    /// Checks after the first before giving up.
    pub retries: Option<u32>,
    /// Delay after the marker first appears, before its size is checked.
    pub write_grace: Option<String>,
}

/// A hook command fired for a lifecycle event.
#[derive(Debug, Clone, Deserialize)]
pub struct HookAction {
    pub command: String,
    pub timeout: Option<String>,
}

/// Configuration for an individual service.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Symbolic service name.
    pub name: String,
    /// Process name to match.
    pub process: Option<String>,
    /// Pid file the daemon writes once it is up.
    pub pidfile: Option<PathBuf>,
    /// Whether the service should run from boot.
    #[serde(default)]
    pub enable: bool,
    /// Name handed to the service manager for generic verbs.
    pub rc_name: Option<String>,
    /// Custom status command; exit 0 means running.
    pub status_command: Option<String>,
    /// Scripted command sequences per action.
    #[serde(default)]
    pub actions: HashMap<ActionVerb, Vec<String>>,
}

impl ServiceConfig {
    /// Name used for generic service-manager invocations.
    pub fn rc_name(&self) -> &str {
        self.rc_name
            .as_deref()
            .or(self.process.as_deref())
            .unwrap_or(&self.name)
    }

    /// Builds the read-only descriptor the status engine works with.
    pub fn descriptor(&self) -> ServiceDescriptor {
        ServiceDescriptor::new(
            self.name.clone(),
            ProcessIdentity {
                process_name: self.process.clone(),
                pidfile: self.pidfile.clone(),
                probe: self.status_command.clone(),
            },
            self.enable,
        )
    }
}

impl Config {
    /// Looks up a service by name.
    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|svc| svc.name == name)
    }

    /// Descriptors for every configured service, in configuration order.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.services.iter().map(ServiceConfig::descriptor).collect()
    }

    pub fn service_manager(&self) -> &str {
        self.service_manager
            .as_deref()
            .unwrap_or(DEFAULT_SERVICE_MANAGER)
    }

    /// Deadline for aggregate status queries.
    pub fn status_deadline(&self) -> Result<Duration, ConfigError> {
        match self.status_deadline.as_deref() {
            Some(raw) => parse_duration("status_deadline", raw),
            None => Ok(STATUS_DEADLINE),
        }
    }

    /// Bound on a single `status_command` run.
    pub fn probe_timeout(&self) -> Result<Duration, ConfigError> {
        match self.probe_timeout.as_deref() {
            Some(raw) => parse_duration("probe_timeout", raw),
            None => Ok(DEFAULT_PROBE_TIMEOUT),
        }
    }

    /// Readiness watcher policy, falling back to the built-in defaults.
    pub fn watch_policy(&self) -> Result<WatchPolicy, ConfigError> {
        let readiness = self.readiness.clone().unwrap_or_default();
        let interval = match readiness.interval.as_deref() {
            Some(raw) => parse_duration("readiness.interval", raw)?,
            None => WATCH_POLL_INTERVAL,
        };
        let write_grace = match readiness.write_grace.as_deref() {
            Some(raw) => parse_duration("readiness.write_grace", raw)?,
            None => PIDFILE_WRITE_GRACE,
        };

        Ok(WatchPolicy {
            interval,
            retries: readiness.retries.unwrap_or(WATCH_RETRIES),
            write_grace,
        })
    }

    /// Timeout for a hook, falling back to the default bound.
    pub fn hook_timeout(action: &HookAction) -> Result<Duration, ConfigError> {
        match action.timeout.as_deref() {
            Some(raw) => parse_duration("hook timeout", raw),
            None => Ok(DEFAULT_HOOK_TIMEOUT),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for (idx, service) in self.services.iter().enumerate() {
            if service.name.trim().is_empty() {
                return Err(ConfigError::EmptyServiceName(idx));
            }
            if !seen.insert(service.name.as_str()) {
                return Err(ConfigError::DuplicateService(service.name.clone()));
            }
        }

        self.status_deadline()?;
        self.probe_timeout()?;
        self.watch_policy()?;
        for action in self.hooks.values() {
            Self::hook_timeout(action)?;
        }

        Ok(())
    }
}

/// Parses a duration in the format `<number>[ms|s|m|h]`; a bare number means seconds.
pub fn parse_duration(field: &str, raw: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration {
        field: field.to_string(),
        value: raw.to_string(),
    };

    let value = raw.trim();
    if value.is_empty() {
        return Err(invalid());
    }

    if let Some(stripped) = value.strip_suffix("ms") {
        let millis: u64 = stripped.trim().parse().map_err(|_| invalid())?;
        return Ok(Duration::from_millis(millis));
    }

    let (amount_str, multiplier) = if let Some(stripped) = value.strip_suffix('s') {
        (stripped.trim(), 1)
    } else if let Some(stripped) = value.strip_suffix('m') {
        (stripped.trim(), 60)
    } else if let Some(stripped) = value.strip_suffix('h') {
        (stripped.trim(), 3600)
    } else {
        (value, 1)
    };

    let amount: u64 = amount_str.parse().map_err(|_| invalid())?;
    Ok(Duration::from_secs(amount.saturating_mul(multiplier)))
}

/// Expands `${VAR}` references from the environment. Bare `$VAR` is left for the shell.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex is valid");

    let mut missing = None;
    let result = re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        match env::var(var_name) {
            Ok(value) => value,
            Err(_) => {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(var_name) => Err(ConfigError::MissingEnvVar(var_name)),
        None => Ok(result.into_owned()),
    }
}

/// Parses configuration text after environment expansion.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let expanded = expand_env_vars(content)?;
    let config: Config = serde_yaml::from_str(&expanded)?;
    config.validate()?;
    Ok(config)
}

/// Loads and parses the configuration file.
pub fn load_config(config_path: Option<&str>) -> Result<Config, ConfigError> {
    let config_path = config_path.map(Path::new).unwrap_or_else(|| {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(Path::new)
            .find(|candidate| candidate.exists())
            .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILES[0]))
    });

    let content = fs::read_to_string(config_path).map_err(|e| {
        ConfigError::ReadError(std::io::Error::new(
            e.kind(),
            format!("{} ({})", e, config_path.display()),
        ))
    })?;

    parse_config(&content)
}
