//! Constants and default configuration values for servicectl.
//!
//! Timings here are production defaults; every one of them can be overridden
//! from the configuration file.

use std::time::Duration;

// ============================================================================
// File System Constants
// ============================================================================

/// Configuration file names probed, in order, when no path is given.
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["servicectl.yaml", "svcctl.yaml"];

// ============================================================================
// Shell Execution Constants
// ============================================================================

/// Default shell used for executing action commands, hooks and status probes.
pub const DEFAULT_SHELL: &str = "sh";

/// Shell argument flag for executing command strings.
pub const SHELL_COMMAND_FLAG: &str = "-c";

/// Generic service manager used for verbs without a scripted command sequence.
pub const DEFAULT_SERVICE_MANAGER: &str = "/usr/sbin/service";

/// Verb issued before a generic restart so a half-stopped daemon cannot block it.
pub const FORCE_STOP_VERB: &str = "forcestop";

/// Prefix marking a scripted command whose failure is ignored.
pub const BEST_EFFORT_PREFIX: char = '-';

// ============================================================================
// Readiness Watcher Timing
// ============================================================================

/// Interval between marker checks.
pub const WATCH_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Checks performed after the first one before the watcher gives up.
pub const WATCH_RETRIES: u32 = 5;

/// Delay after first seeing a marker file, so the daemon can finish writing its pid.
pub const PIDFILE_WRITE_GRACE: Duration = Duration::from_millis(100);

// ============================================================================
// Status Aggregation Timing
// ============================================================================

/// Overall budget for a multi-service status query.
pub const STATUS_DEADLINE: Duration = Duration::from_secs(15);

// ============================================================================
// Child Process Constants
// ============================================================================

/// Upper bound for a pre-action hook when the configuration sets no timeout.
pub const DEFAULT_HOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound for a custom status probe when the configuration sets no timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll interval while waiting on a hook or probe process.
pub const CHILD_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Version identifier for the machine-readable status report.
pub const STATUS_SCHEMA_VERSION: &str = "status.v1";
