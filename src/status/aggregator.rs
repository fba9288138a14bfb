//! Concurrent multi-service status collection under one deadline.
use std::{
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use tracing::{debug, warn};

use super::{ServiceStatus, StatusResolver};
use crate::constants::STATUS_DEADLINE;
use crate::service::ServiceDescriptor;

/// Resolves many services at once; slow ones are reported as `UNKNOWN`.
#[derive(Debug, Clone)]
pub struct StatusAggregator {
    resolver: StatusResolver,
    deadline: Duration,
}

impl StatusAggregator {
    pub fn new(resolver: StatusResolver) -> Self {
        Self::with_deadline(resolver, STATUS_DEADLINE)
    }

    pub fn with_deadline(resolver: StatusResolver, deadline: Duration) -> Self {
        Self { resolver, deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn resolver(&self) -> &StatusResolver {
        &self.resolver
    }

    /// One status per input service, in input order.
    ///
    /// Returns no later than the deadline. Resolutions still running at that
    /// point are abandoned; their threads finish in the background and their
    /// results are discarded.
    pub fn resolve_all(&self, services: &[ServiceDescriptor]) -> Vec<ServiceStatus> {
        let mut results: Vec<Option<ServiceStatus>> = vec![None; services.len()];
        if services.is_empty() {
            return Vec::new();
        }

        let deadline = Instant::now() + self.deadline;
        let (tx, rx) = mpsc::channel();
        let mut pending = 0usize;

        for (index, service) in services.iter().enumerate() {
            let tx = tx.clone();
            let resolver = self.resolver.clone();
            let descriptor = service.clone();
            let spawned = thread::Builder::new()
                .name(format!("status-{}", service.name))
                .spawn(move || {
                    let status = resolver.resolve(&descriptor, None);
                    // The receiver is gone once the deadline has passed.
                    let _ = tx.send((index, status));
                });

            match spawned {
                Ok(_) => pending += 1,
                Err(err) => warn!("Failed to spawn status check for '{}': {err}", service.name),
            }
        }
        drop(tx);

        while pending > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((index, status)) => {
                    results[index] = Some(status);
                    pending -= 1;
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        "Status deadline of {:?} reached with {pending} service(s) unresolved",
                        self.deadline
                    );
                    break;
                }
                // Every sender dropped: the remaining threads panicked.
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        results
            .into_iter()
            .zip(services)
            .map(|(status, service)| {
                status.unwrap_or_else(|| {
                    debug!("No status for '{}' in time; reporting UNKNOWN", service.name);
                    ServiceStatus::unknown(service)
                })
            })
            .collect()
    }
}
