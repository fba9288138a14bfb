#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
    thread,
    time::{Duration, Instant},
};

use servicectl::{
    action::ActionVerb,
    adapter::ActionAdapter,
    error::AdapterError,
    hooks::HookNotifier,
    locator::{ProcessLocator, ProcessMatch, read_pidfile},
    service::{ProcessIdentity, ServiceDescriptor},
    watcher::WatchPolicy,
};

/// Watch timing scaled down so a full timeout stays well under a second.
pub fn fast_policy() -> WatchPolicy {
    WatchPolicy {
        interval: Duration::from_millis(100),
        retries: 5,
        write_grace: Duration::from_millis(10),
    }
}

pub fn pidfile_service(name: &str, pidfile: &Path, enabled: bool) -> ServiceDescriptor {
    ServiceDescriptor::new(name, ProcessIdentity::by_pidfile(pidfile, None), enabled)
}

/// What the fake daemon does to its pid file after an action.
#[derive(Debug, Clone, Copy)]
pub enum MarkerEffect {
    /// Write a pid after the delay.
    Write(Duration),
    /// Remove the file after the delay.
    Remove(Duration),
    /// Leave the file alone.
    Nothing,
}

/// Adapter standing in for a real daemon: records every call and touches the
/// service's pid file in the background, like a forking daemon would.
#[derive(Default)]
pub struct FakeDaemonAdapter {
    pub calls: Mutex<Vec<(ActionVerb, String)>>,
    pub failing: Vec<ActionVerb>,
    effects: Vec<(ActionVerb, MarkerEffect)>,
}

impl FakeDaemonAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, verb: ActionVerb, effect: MarkerEffect) -> Self {
        self.effects.push((verb, effect));
        self
    }

    pub fn failing(mut self, verb: ActionVerb) -> Self {
        self.failing.push(verb);
        self
    }

    pub fn verbs(&self) -> Vec<ActionVerb> {
        self.calls.lock().unwrap().iter().map(|(verb, _)| *verb).collect()
    }
}

impl ActionAdapter for FakeDaemonAdapter {
    fn execute(
        &self,
        action: ActionVerb,
        service: &ServiceDescriptor,
        _extra_args: &[String],
    ) -> Result<(), AdapterError> {
        self.calls
            .lock()
            .unwrap()
            .push((action, service.name.clone()));

        if self.failing.contains(&action) {
            return Err(AdapterError::Exit {
                command: format!("fake {action} {}", service.name),
                code: Some(1),
            });
        }

        let effect = self
            .effects
            .iter()
            .find(|(verb, _)| *verb == action)
            .map(|(_, effect)| *effect)
            .unwrap_or(MarkerEffect::Nothing);

        if let Some(marker) = service.marker().map(Path::to_path_buf) {
            apply_effect(marker, effect);
        }
        Ok(())
    }
}

fn apply_effect(marker: PathBuf, effect: MarkerEffect) {
    match effect {
        MarkerEffect::Write(delay) => {
            thread::spawn(move || {
                thread::sleep(delay);
                fs::write(&marker, format!("{}\n", std::process::id())).unwrap();
            });
        }
        MarkerEffect::Remove(delay) => {
            thread::spawn(move || {
                thread::sleep(delay);
                let _ = fs::remove_file(&marker);
            });
        }
        MarkerEffect::Nothing => {}
    }
}

/// Locator that trusts the pid file alone: a pid on record means running.
pub struct PidfileLocator;

impl ProcessLocator for PidfileLocator {
    fn locate(&self, identity: &ProcessIdentity) -> ProcessMatch {
        identity
            .pidfile
            .as_deref()
            .and_then(read_pidfile)
            .map(ProcessMatch::from_pids)
            .unwrap_or_default()
    }
}

/// Locator that blocks for a fixed time on the named services.
pub struct StallingLocator {
    pub stalled: Vec<String>,
    pub stall: Duration,
}

impl ProcessLocator for StallingLocator {
    fn locate(&self, identity: &ProcessIdentity) -> ProcessMatch {
        let name = identity.process_name.clone().unwrap_or_default();
        if self.stalled.contains(&name) {
            thread::sleep(self.stall);
        }
        ProcessMatch::from_pids([4242])
    }
}

/// Notifier that remembers the events it saw.
#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<String>>,
}

impl HookNotifier for RecordingNotifier {
    fn notify(&self, event: &str, service: &str) {
        self.events.lock().unwrap().push(format!("{event} {service}"));
    }
}

pub fn wait_for_file_value(path: &Path, expected: &str) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(content) = fs::read_to_string(path)
            && content.trim() == expected
        {
            return;
        }

        if Instant::now() >= deadline {
            panic!("Timed out waiting for value '{}' in {:?}", expected, path);
        }

        thread::sleep(Duration::from_millis(50));
    }
}

pub fn wait_for_path(path: &Path) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !path.exists() {
        if Instant::now() >= deadline {
            panic!("Timed out waiting for {:?}", path);
        }
        thread::sleep(Duration::from_millis(50));
    }
}
