//! Command-line interface for servicectl.
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use crate::status::{ServiceState, StatusFilter};

/// Log level accepted by `--log-level`, by name ("warn", "debug") or as 0-5.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLevelArg(LevelFilter);

impl LogLevelArg {
    /// Directive usable as an `EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self.0 {
            LevelFilter::OFF => "off",
            LevelFilter::ERROR => "error",
            LevelFilter::WARN => "warn",
            LevelFilter::INFO => "info",
            LevelFilter::DEBUG => "debug",
            LevelFilter::TRACE => "trace",
        }
    }
}

impl FromStr for LogLevelArg {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("log level cannot be empty".into());
        }

        const BY_NUMBER: [LevelFilter; 6] = [
            LevelFilter::OFF,
            LevelFilter::ERROR,
            LevelFilter::WARN,
            LevelFilter::INFO,
            LevelFilter::DEBUG,
            LevelFilter::TRACE,
        ];

        if let Ok(number) = trimmed.parse::<usize>() {
            return BY_NUMBER
                .get(number)
                .copied()
                .map(LogLevelArg)
                .ok_or_else(|| format!("unsupported log level number '{number}' (expected 0-5)"));
        }

        let level = match trimmed.to_ascii_lowercase().as_str() {
            "off" => LevelFilter::OFF,
            "error" | "err" => LevelFilter::ERROR,
            "warn" | "warning" => LevelFilter::WARN,
            "info" => LevelFilter::INFO,
            "debug" => LevelFilter::DEBUG,
            "trace" => LevelFilter::TRACE,
            _ => return Err(format!("invalid log level '{trimmed}'")),
        };
        Ok(LogLevelArg(level))
    }
}

/// Command-line interface for servicectl.
#[derive(Parser, Debug)]
#[command(name = "svcctl", version)]
#[command(about = "Start, stop and inspect system services", long_about = None)]
pub struct Cli {
    /// Path to the configuration file (defaults to `servicectl.yaml`, then `svcctl.yaml`).
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<String>,

    /// Override the logging verbosity for this invocation only.
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevelArg>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Target of a single-service action.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ActionArgs {
    /// Name of the configured service.
    pub service: String,

    /// Extra arguments passed through to the action command.
    #[arg(last = true)]
    pub extra: Vec<String>,
}

/// Available commands for svcctl.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a service and wait for it to come up.
    Start(ActionArgs),

    /// Stop a service and wait for it to go down.
    Stop(ActionArgs),

    /// Restart a service.
    Restart(ActionArgs),

    /// Reload a service, restarting it if the reload fails.
    Reload(ActionArgs),

    /// Run an action given by name.
    Action {
        /// One of start, stop, restart or reload.
        verb: String,

        #[command(flatten)]
        target: ActionArgs,
    },

    /// Show the status of configured services.
    Status {
        /// Only report this service (repeatable).
        #[arg(short, long = "service", value_name = "NAME")]
        services: Vec<String>,

        /// Only report services in this state (repeatable).
        #[arg(long = "state", value_name = "STATE")]
        states: Vec<ServiceState>,

        /// Only report services enabled at boot.
        #[arg(long)]
        enabled: bool,

        /// Emit machine-readable JSON output.
        #[arg(long)]
        json: bool,
    },

    /// Report whether a service is running; exits 1 when it is not.
    Started {
        /// Name of the configured service.
        service: String,
    },
}

impl Commands {
    /// Action name and target of the single-service action commands.
    pub fn action(&self) -> Option<(&str, &ActionArgs)> {
        match self {
            Commands::Start(args) => Some(("start", args)),
            Commands::Stop(args) => Some(("stop", args)),
            Commands::Restart(args) => Some(("restart", args)),
            Commands::Reload(args) => Some(("reload", args)),
            Commands::Action { verb, target } => Some((verb.as_str(), target)),
            Commands::Status { .. } | Commands::Started { .. } => None,
        }
    }

    /// Query filter for `status`.
    pub fn status_filter(&self) -> Option<StatusFilter> {
        match self {
            Commands::Status {
                services,
                states,
                enabled,
                ..
            } => Some(StatusFilter {
                services: services.clone(),
                states: states.clone(),
                enabled: enabled.then_some(true),
            }),
            _ => None,
        }
    }
}

/// Parses command-line arguments and returns a `Cli` struct.
pub fn parse_args() -> Cli {
    Cli::parse()
}
