//! Descriptors for supervisable services.
use std::path::PathBuf;

/// How a service's running process is recognised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessIdentity {
    /// Process name (pgrep-style pattern) to match.
    pub process_name: Option<String>,
    /// Pid file written by the daemon; doubles as its readiness marker.
    pub pidfile: Option<PathBuf>,
    /// Shell command whose zero exit status means the service is running.
    pub probe: Option<String>,
}

impl ProcessIdentity {
    /// Identity matched purely by process name.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            process_name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Identity matched through a pid file, optionally cross-checked by name.
    pub fn by_pidfile(pidfile: impl Into<PathBuf>, name: Option<&str>) -> Self {
        Self {
            process_name: name.map(str::to_string),
            pidfile: Some(pidfile.into()),
            probe: None,
        }
    }

    /// Identity answered by a custom status command.
    pub fn by_probe(command: impl Into<String>) -> Self {
        Self {
            probe: Some(command.into()),
            ..Self::default()
        }
    }
}

/// A service as seen by the readiness and status engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Symbolic service name used by callers.
    pub name: String,
    /// Process identity used for readiness and status checks.
    pub identity: ProcessIdentity,
    /// Whether the service is expected to run from boot.
    pub enabled: bool,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>, identity: ProcessIdentity, enabled: bool) -> Self {
        Self {
            name: name.into(),
            identity,
            enabled,
        }
    }

    /// The readiness marker, when the service writes one.
    pub fn marker(&self) -> Option<&std::path::Path> {
        self.identity.pidfile.as_deref()
    }
}
