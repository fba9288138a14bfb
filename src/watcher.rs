//! Readiness watcher: bounded polling of a daemon's pid file after an action.
//!
//! A [`ReadinessWatch`] is started right after the pre-action hook so its
//! polling window overlaps the adapter's command execution. The dispatcher
//! joins it before resolving status, which keeps the status check from racing
//! the daemon's own startup or shutdown. Running out of attempts is a normal
//! outcome; the process locator has the final word.
use std::{
    fs,
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread,
    time::{Duration, Instant},
};

use tracing::{debug, warn};

use crate::action::{ActionVerb, MarkerExpectation};
use crate::constants::{PIDFILE_WRITE_GRACE, WATCH_POLL_INTERVAL, WATCH_RETRIES};

/// Timing used by the readiness watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchPolicy {
    /// Sleep before each check.
    pub interval: Duration,
    /// Checks after the first one.
    pub retries: u32,
    /// Delay after first seeing the marker, before reading its size.
    pub write_grace: Duration,
}

impl Default for WatchPolicy {
    fn default() -> Self {
        Self {
            interval: WATCH_POLL_INTERVAL,
            retries: WATCH_RETRIES,
            write_grace: PIDFILE_WRITE_GRACE,
        }
    }
}

impl WatchPolicy {
    /// Upper bound on how long a watch can keep polling.
    pub fn budget(&self) -> Duration {
        self.interval
            .saturating_mul(self.retries.saturating_add(1))
            .saturating_add(self.write_grace)
    }
}

/// How a readiness watch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// Nothing to watch: no marker file, or the verb has no readiness condition.
    Skipped,
    /// The expected marker state was observed.
    Reached { after: Duration },
    /// All attempts were used up without seeing the expected state.
    TimedOut,
    /// The watch was cancelled by its owner.
    Cancelled,
}

/// One in-flight readiness poll, owned by the dispatch that started it.
///
/// Dropping the watch without joining it cancels the poll.
#[derive(Debug)]
pub struct ReadinessWatch {
    marker: Option<PathBuf>,
    verb: ActionVerb,
    started: Instant,
    stop: Option<Sender<()>>,
    handle: Option<thread::JoinHandle<WatchOutcome>>,
}

impl ReadinessWatch {
    /// Starts watching `marker` for the post-condition of `verb`.
    pub fn start(marker: Option<&Path>, verb: ActionVerb, policy: &WatchPolicy) -> Self {
        let (Some(marker), Some(expectation)) = (marker, verb.marker_expectation()) else {
            return Self::skipped(verb);
        };

        let (stop_tx, stop_rx) = mpsc::channel();
        let path = marker.to_path_buf();
        let policy = *policy;
        let spawned = thread::Builder::new()
            .name(format!("readiness-{verb}"))
            .spawn(move || poll_marker(&path, expectation, &policy, &stop_rx));

        match spawned {
            Ok(handle) => Self {
                marker: Some(marker.to_path_buf()),
                verb,
                started: Instant::now(),
                stop: Some(stop_tx),
                handle: Some(handle),
            },
            Err(err) => {
                warn!(
                    "Failed to spawn readiness watcher for {}: {err}",
                    marker.display()
                );
                Self::skipped(verb)
            }
        }
    }

    /// A watch that completes immediately.
    pub fn skipped(verb: ActionVerb) -> Self {
        Self {
            marker: None,
            verb,
            started: Instant::now(),
            stop: None,
            handle: None,
        }
    }

    /// Whether a poll thread is attached to this watch.
    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Time since the watch was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Waits for the poll to reach its post-condition or run out of attempts.
    pub fn join(mut self) -> WatchOutcome {
        let outcome = self.wait();
        debug!(
            "Readiness watch for {} ({}) finished after {:?}: {outcome:?}",
            self.describe_marker(),
            self.verb,
            self.elapsed()
        );
        outcome
    }

    /// Stops the poll early and waits for the thread to exit.
    pub fn cancel(mut self) -> WatchOutcome {
        self.stop.take();
        self.wait()
    }

    fn wait(&mut self) -> WatchOutcome {
        let Some(handle) = self.handle.take() else {
            return WatchOutcome::Skipped;
        };

        let outcome = handle.join().unwrap_or_else(|_| {
            warn!(
                "Readiness watcher for {} panicked",
                self.describe_marker()
            );
            WatchOutcome::TimedOut
        });
        self.stop.take();
        outcome
    }

    fn describe_marker(&self) -> String {
        self.marker
            .as_deref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<none>".to_string())
    }
}

impl Drop for ReadinessWatch {
    fn drop(&mut self) {
        // Closing the channel wakes the poll thread, which then exits on its own.
        self.stop.take();
    }
}

fn poll_marker(
    path: &Path,
    expectation: MarkerExpectation,
    policy: &WatchPolicy,
    stop: &Receiver<()>,
) -> WatchOutcome {
    let started = Instant::now();
    let mut grace_spent = false;

    for _ in 0..=policy.retries {
        match stop.recv_timeout(policy.interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return WatchOutcome::Cancelled,
        }

        let reached = match expectation {
            MarkerExpectation::Populated => {
                if path.exists() && !grace_spent {
                    grace_spent = true;
                    thread::sleep(policy.write_grace);
                }
                marker_populated(path)
            }
            MarkerExpectation::Removed => !path.exists(),
        };

        if reached {
            return WatchOutcome::Reached {
                after: started.elapsed(),
            };
        }
    }

    WatchOutcome::TimedOut
}

fn marker_populated(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.len() > 0)
        .unwrap_or(false)
}
