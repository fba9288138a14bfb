//! Error handling for servicectl.
use thiserror::Error;

use crate::action::ActionVerb;

/// Errors surfaced by the caller-facing operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The requested action name is not one of the supported verbs.
    #[error("Internal error: unknown action '{0}'")]
    UnknownAction(String),

    /// The service name does not appear in the loaded configuration.
    #[error("Unknown service '{0}'")]
    UnknownService(String),

    /// The action adapter failed to carry out the action.
    #[error("Failed to {action} service '{service}': {source}")]
    ActionFailed {
        /// The action that was being performed.
        action: ActionVerb,
        /// The service the action targeted.
        service: String,
        /// The underlying adapter failure.
        #[source]
        source: AdapterError,
    },

    /// Error loading the configuration the manager was built from.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failures reported by an action adapter while executing a command sequence.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The command could not be spawned at all.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        /// The command line that failed to spawn.
        command: String,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// The command ran but reported failure.
    #[error("`{command}` exited with status {code:?}")]
    Exit {
        /// The command line that failed.
        command: String,
        /// Exit code, or `None` when terminated by a signal.
        code: Option<i32>,
    },

    /// The adapter has no way to perform this action for the service.
    #[error("{action} is not supported for service '{service}'")]
    Unsupported {
        /// The unsupported action.
        action: ActionVerb,
        /// The service name.
        service: String,
    },
}

/// Errors raised while loading or validating the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error reading or accessing a configuration file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing YAML configuration.
    #[error("Invalid YAML format: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A `${VAR}` reference could not be resolved from the environment.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// A duration setting could not be parsed.
    #[error("Invalid duration '{value}' for {field}")]
    InvalidDuration {
        /// The setting that carried the value.
        field: String,
        /// The raw value.
        value: String,
    },

    /// Two services share the same name.
    #[error("Service '{0}' is defined more than once")]
    DuplicateService(String),

    /// A service entry has an empty name.
    #[error("Service at position {0} has an empty name")]
    EmptyServiceName(usize),
}
