//! Process lookup by pid file, process name or custom status probe.
use std::{
    collections::BTreeSet,
    fs,
    path::Path,
    process::{Command, Stdio},
    time::Duration,
};

use nix::{errno::Errno, sys::signal, unistd::Pid};
use regex::Regex;
use sysinfo::{ProcessStatus, ProcessesToUpdate, System};
use tracing::{debug, warn};

use crate::constants::{DEFAULT_PROBE_TIMEOUT, DEFAULT_SHELL, SHELL_COMMAND_FLAG};
use crate::hooks::wait_with_timeout;
use crate::service::ProcessIdentity;

/// Result of a process lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessMatch {
    /// Whether a live process matched.
    pub found: bool,
    /// Matching pids, ascending.
    pub pids: Vec<u32>,
}

impl ProcessMatch {
    pub fn none() -> Self {
        Self::default()
    }

    /// A match backed by concrete pids; empty means not found.
    pub fn from_pids(pids: impl IntoIterator<Item = u32>) -> Self {
        let pids: Vec<u32> = pids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        Self {
            found: !pids.is_empty(),
            pids,
        }
    }

    /// A positive match with no pid information (custom status probes).
    pub fn found_without_pids() -> Self {
        Self {
            found: true,
            pids: Vec::new(),
        }
    }
}

/// Answers whether the process behind a service identity is alive.
pub trait ProcessLocator: Send + Sync {
    /// Never fails: every lookup problem is a negative match.
    fn locate(&self, identity: &ProcessIdentity) -> ProcessMatch;
}

/// Locator backed by the live process table.
#[derive(Debug, Clone, Copy)]
pub struct SystemLocator {
    probe_timeout: Duration,
}

impl Default for SystemLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemLocator {
    pub fn new() -> Self {
        Self::with_probe_timeout(DEFAULT_PROBE_TIMEOUT)
    }

    /// Locator whose status probes are killed after `probe_timeout`.
    pub fn with_probe_timeout(probe_timeout: Duration) -> Self {
        Self { probe_timeout }
    }

    fn run_probe(&self, command: &str) -> ProcessMatch {
        let spawned = Command::new(DEFAULT_SHELL)
            .arg(SHELL_COMMAND_FLAG)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                debug!("Status probe `{command}` could not run: {err}");
                return ProcessMatch::none();
            }
        };

        match wait_with_timeout(&mut child, self.probe_timeout) {
            Ok(Some(status)) if status.success() => ProcessMatch::found_without_pids(),
            Ok(Some(status)) => {
                debug!("Status probe `{command}` reported not running: {status}");
                ProcessMatch::none()
            }
            Ok(None) => {
                warn!(
                    "Status probe `{command}` timed out after {:?}; treating as not running",
                    self.probe_timeout
                );
                if let Err(err) = child.kill() {
                    debug!("Failed to kill timed-out status probe `{command}`: {err}");
                }
                let _ = child.wait();
                ProcessMatch::none()
            }
            Err(err) => {
                debug!("Failed while waiting for status probe `{command}`: {err}");
                let _ = child.kill();
                let _ = child.wait();
                ProcessMatch::none()
            }
        }
    }

    fn match_pidfile(pidfile: &Path, name: Option<&str>) -> ProcessMatch {
        let recorded = match read_pidfile(pidfile) {
            Some(pids) => pids,
            None => return ProcessMatch::none(),
        };

        let alive: Vec<u32> = recorded.into_iter().filter(|pid| pid_alive(*pid)).collect();
        if alive.is_empty() {
            return ProcessMatch::none();
        }

        let mut system = System::new();
        let targets: Vec<sysinfo::Pid> =
            alive.iter().copied().map(sysinfo::Pid::from_u32).collect();
        system.refresh_processes(ProcessesToUpdate::Some(&targets), true);

        let pattern = name.map(name_pattern);
        ProcessMatch::from_pids(alive.into_iter().filter(|pid| {
            let Some(process) = system.process(sysinfo::Pid::from_u32(*pid)) else {
                return false;
            };
            if matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead) {
                return false;
            }
            match &pattern {
                Some(pattern) => pattern.is_match(&process.name().to_string_lossy()),
                None => true,
            }
        }))
    }

    fn match_name(name: &str) -> ProcessMatch {
        let pattern = name_pattern(name);
        let own_pid = std::process::id();

        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::All, true);

        ProcessMatch::from_pids(system.processes().iter().filter_map(|(pid, process)| {
            let pid = pid.as_u32();
            if pid == own_pid
                || matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead)
            {
                return None;
            }
            pattern
                .is_match(&process.name().to_string_lossy())
                .then_some(pid)
        }))
    }
}

impl ProcessLocator for SystemLocator {
    fn locate(&self, identity: &ProcessIdentity) -> ProcessMatch {
        if let Some(probe) = identity.probe.as_deref() {
            return self.run_probe(probe);
        }

        match (identity.pidfile.as_deref(), identity.process_name.as_deref()) {
            (Some(pidfile), name) => Self::match_pidfile(pidfile, name),
            (None, Some(name)) => Self::match_name(name),
            (None, None) => ProcessMatch::none(),
        }
    }
}

/// Reads every pid recorded in a pid file.
pub fn read_pidfile(path: &Path) -> Option<Vec<u32>> {
    let contents = fs::read_to_string(path).ok()?;
    let pids: Vec<u32> = contents
        .split_whitespace()
        .filter_map(|token| token.parse::<u32>().ok())
        .filter(|pid| *pid > 0)
        .collect();

    if pids.is_empty() { None } else { Some(pids) }
}

fn pid_alive(pid: u32) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    match signal::kill(Pid::from_raw(raw), None) {
        Ok(()) => true,
        Err(Errno::ESRCH) => false,
        // EPERM: the process exists but belongs to someone else.
        Err(_) => true,
    }
}

/// pgrep-style pattern; names that are not valid regexes are matched literally.
fn name_pattern(name: &str) -> Regex {
    Regex::new(name).unwrap_or_else(|_| {
        Regex::new(&regex::escape(name)).expect("escaped pattern is always valid")
    })
}
