#[path = "common/mod.rs"]
mod common;

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use common::{FakeDaemonAdapter, StallingLocator, fast_policy};
use servicectl::{
    hooks::NoopNotifier,
    manager::ServiceManager,
    service::{ProcessIdentity, ServiceDescriptor},
    status::{
        ServiceState, ServiceStatus, StatusAggregator, StatusFilter, StatusReport, StatusResolver,
    },
};

fn named(name: &str, enabled: bool) -> ServiceDescriptor {
    ServiceDescriptor::new(name, ProcessIdentity::by_name(name), enabled)
}

fn stalling(stalled: &[&str], stall: Duration) -> Arc<StallingLocator> {
    Arc::new(StallingLocator {
        stalled: stalled.iter().map(|s| s.to_string()).collect(),
        stall,
    })
}

#[test]
fn stalled_lookup_becomes_unknown_at_deadline() {
    let aggregator = StatusAggregator::with_deadline(
        StatusResolver::new(stalling(&["nfsd"], Duration::from_secs(5))),
        Duration::from_millis(400),
    );
    let services = vec![named("sshd", true), named("nfsd", true), named("smbd", false)];

    let started = Instant::now();
    let statuses = aggregator.resolve_all(&services);
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(400));
    assert!(elapsed < Duration::from_secs(2), "query took {elapsed:?}");
    assert_eq!(statuses.len(), 3);
    assert_eq!(statuses[0].state, ServiceState::Running);
    assert_eq!(statuses[1].state, ServiceState::Unknown);
    assert!(statuses[1].pids.is_empty());
    assert_eq!(statuses[2].state, ServiceState::Running);
}

#[test]
fn lookups_run_concurrently() {
    let names: Vec<String> = (0..8).map(|i| format!("worker{i}")).collect();
    let stalled: Vec<&str> = names.iter().map(String::as_str).collect();
    let aggregator = StatusAggregator::with_deadline(
        StatusResolver::new(stalling(&stalled, Duration::from_millis(200))),
        Duration::from_secs(5),
    );
    let services: Vec<ServiceDescriptor> = names.iter().map(|n| named(n, false)).collect();

    let started = Instant::now();
    let statuses = aggregator.resolve_all(&services);

    assert!(started.elapsed() < Duration::from_secs(1));
    let reported: Vec<&str> = statuses.iter().map(|s| s.service.as_str()).collect();
    assert_eq!(reported, stalled);
    assert!(statuses.iter().all(|s| s.state == ServiceState::Running));
}

#[test]
fn manager_query_respects_filter_and_order() {
    let manager = ServiceManager::new(
        vec![named("ssh", true), named("ftp", false), named("nfs", true)],
        Arc::new(FakeDaemonAdapter::new()),
        Arc::new(NoopNotifier),
        stalling(&[], Duration::ZERO),
        fast_policy(),
    );

    let filter = StatusFilter {
        services: vec!["nfs".into(), "ssh".into()],
        ..StatusFilter::default()
    };
    let names: Vec<String> = manager
        .query_all(Some(&filter))
        .into_iter()
        .map(|s| s.service)
        .collect();
    assert_eq!(names, vec!["ssh", "nfs"]);

    let none_crashed = StatusFilter {
        states: vec![ServiceState::Crashed],
        ..StatusFilter::default()
    };
    assert!(manager.query_all(Some(&none_crashed)).is_empty());
}

#[test]
fn status_without_marker_returns_immediately() {
    let manager = ServiceManager::new(
        vec![named("cron", true)],
        Arc::new(FakeDaemonAdapter::new()),
        Arc::new(NoopNotifier),
        stalling(&[], Duration::ZERO),
        fast_policy(),
    );

    let started = Instant::now();
    let status = manager.perform("start", "cron", &[]).unwrap();
    assert!(started.elapsed() < fast_policy().interval);
    assert_eq!(status.state, ServiceState::Running);
}

#[test]
fn report_serializes_schema_and_states() {
    let statuses = vec![
        ServiceStatus::new(&named("ssh", true), ServiceState::Running, vec![22]),
        ServiceStatus::unknown(&named("nfs", true)),
    ];
    let json = serde_json::to_value(StatusReport::new(statuses)).unwrap();

    assert_eq!(json["schema_version"], "status.v1");
    assert!(json["captured_at"].is_string());
    assert_eq!(json["services"][0]["state"], "RUNNING");
    assert_eq!(json["services"][0]["pids"], serde_json::json!([22]));
    assert_eq!(json["services"][1]["state"], "UNKNOWN");
}
