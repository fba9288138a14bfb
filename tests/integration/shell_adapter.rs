#[path = "common/mod.rs"]
mod common;

use std::{fs, os::unix::fs::PermissionsExt, path::Path};

use common::wait_for_file_value;
use servicectl::{
    config::parse_config, locator::read_pidfile, manager::ServiceManager, status::ServiceState,
};
use tempfile::tempdir;

fn manager_for(yaml: &str) -> ServiceManager {
    let config = parse_config(yaml).expect("parse config");
    ServiceManager::from_config(&config).expect("build manager")
}

fn sleeper_config(dir: &Path) -> String {
    let pid = dir.join("sleeper.pid");
    let pid = pid.display();
    format!(
        r#"
version: "1"
readiness:
  interval: "100ms"
  retries: 10
  write_grace: "20ms"
services:
  - name: sleeper
    process: sleep
    pidfile: {pid}
    actions:
      start:
        - "sleep 60 > /dev/null 2>&1 & echo $! > {pid}"
      stop:
        - "-kill $(cat {pid})"
        - "rm -f {pid}"
      restart:
        - "-kill $(cat {pid})"
        - "rm -f {pid}"
        - "sleep 60 > /dev/null 2>&1 & echo $! > {pid}"
      reload:
        - "exit 3"
  - name: ghost
    process: "^svcctl-ghost-daemon$"
    pidfile: {ghost}
    enable: true
"#,
        ghost = dir.join("ghost.pid").display()
    )
}

#[test]
fn scripted_daemon_lifecycle() {
    let dir = tempdir().unwrap();
    let pidfile = dir.path().join("sleeper.pid");
    let manager = manager_for(&sleeper_config(dir.path()));

    let started = manager.perform("start", "sleeper", &[]).unwrap();
    assert_eq!(started.state, ServiceState::Running);
    assert_eq!(Some(started.pids.clone()), read_pidfile(&pidfile));
    assert!(manager.is_started("sleeper").unwrap());

    let reloaded = manager.perform("reload", "sleeper", &[]).unwrap();
    assert_eq!(reloaded.state, ServiceState::Running);
    assert_ne!(reloaded.pids, started.pids, "reload should have fallen back to restart");

    let statuses = manager.query_all(None);
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0].state, ServiceState::Running);
    assert_eq!(statuses[1].service, "ghost");
    assert_eq!(statuses[1].state, ServiceState::Crashed);

    let stopped = manager.perform("stop", "sleeper", &[]).unwrap();
    assert_eq!(stopped.state, ServiceState::Stopped);
    assert!(stopped.pids.is_empty());
    assert!(!pidfile.exists());
    assert!(!manager.is_started("sleeper").unwrap());
}

#[test]
fn commands_see_service_environment() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("env.out");
    let manager = manager_for(&format!(
        r#"
version: "1"
services:
  - name: echoer
    process: "^svcctl-echoer-never-runs$"
    actions:
      start:
        - "echo \"$SERVICE_ACTION $SERVICE_NAME $SERVICE_ARGS\" > {out}"
"#,
        out = out.display()
    ));

    let status = manager
        .perform("start", "echoer", &["--fast".to_string(), "1".to_string()])
        .unwrap();
    assert_eq!(status.state, ServiceState::Stopped);
    wait_for_file_value(&out, "start echoer --fast 1");
}

#[test]
fn generic_verbs_go_through_service_manager() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("calls.log");
    let script = dir.path().join("fake-service");
    fs::write(
        &script,
        format!("#!/bin/sh\necho \"$@\" >> {}\n", log.display()),
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let manager = manager_for(&format!(
        r#"
version: "1"
service_manager: {script}
services:
  - name: web
    process: "^svcctl-web-never-runs$"
    rc_name: nginx
"#,
        script = script.display()
    ));

    manager
        .perform("restart", "web", &["-v".to_string()])
        .unwrap();
    manager.perform("stop", "web", &[]).unwrap();

    let calls = fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = calls.lines().collect();
    assert_eq!(lines, vec!["nginx forcestop", "nginx restart -v", "nginx stop"]);
}

#[test]
fn failing_command_surfaces_as_action_error() {
    let manager = manager_for(
        r#"
version: "1"
services:
  - name: broken
    process: "^svcctl-broken$"
    actions:
      stop:
        - "-false"
        - "exit 7"
"#,
    );

    let err = manager.perform("stop", "broken", &[]).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("stop"), "{message}");
    assert!(message.contains("broken"), "{message}");
    assert!(message.contains("exit 7"), "{message}");
}
