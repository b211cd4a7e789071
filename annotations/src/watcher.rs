// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! File watcher for annotation files
//!
//! Watches the workspace root recursively and forwards changes to files
//! with one of the watched names. Events are coalesced over a debounce
//! window on a worker thread, then handed to the change handler one path
//! at a time.

use log::{debug, error, info, warn};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct WatchError {
    message: String,
}

impl WatchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for WatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for WatchError {}

impl From<notify::Error> for WatchError {
    fn from(err: notify::Error) -> Self {
        WatchError::new(format!("File watcher error: {}", err))
    }
}

/// Health of a running watcher.
#[derive(Debug, Default)]
pub struct WatcherState {
    active: AtomicBool,
    stopping: AtomicBool,
    event_count: AtomicU64,
    handled_count: AtomicU64,
    error: RwLock<Option<String>>,
}

impl WatcherState {
    fn mark_active(&self) {
        self.active.store(true, Ordering::SeqCst);
    }

    fn request_stop(&self) {
        self.stopping.store(true, Ordering::SeqCst);
    }

    fn stop_requested(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    fn mark_stopped(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    fn record_error(&self, message: String) {
        match self.error.write() {
            Ok(mut error) => *error = Some(message),
            Err(_) => error!("🚨 CRITICAL: watcher state lock poisoned"),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Relevant file events received from the backend.
    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::SeqCst)
    }

    /// Paths the handler acted on after debouncing.
    pub fn handled_count(&self) -> u64 {
        self.handled_count.load(Ordering::SeqCst)
    }

    /// Last backend error, if any.
    pub fn error(&self) -> Option<String> {
        self.error.read().ok().and_then(|error| error.clone())
    }
}

pub struct SettingsWatcher {
    watcher: Option<RecommendedWatcher>,
    worker: Option<JoinHandle<()>>,
    root: PathBuf,
    state: Arc<WatcherState>,
}

impl SettingsWatcher {
    /// Start watching `root`. `handler` runs on the worker thread for every
    /// changed file whose name is in `file_names`; it returns whether the
    /// change was acted on.
    pub fn start<F>(
        root: &Path,
        file_names: Vec<String>,
        debounce: Duration,
        handler: F,
    ) -> Result<Self, WatchError>
    where
        F: Fn(&Path) -> bool + Send + 'static,
    {
        let state = Arc::new(WatcherState::default());
        let (sender, receiver) = mpsc::channel::<PathBuf>();

        let event_state = Arc::clone(&state);
        let mut watcher =
            notify::recommended_watcher(move |result: notify::Result<Event>| match result {
                Ok(event) => {
                    for path in relevant_paths(&event, &file_names) {
                        event_state.event_count.fetch_add(1, Ordering::SeqCst);
                        if sender.send(path).is_err() {
                            return;
                        }
                    }
                }
                Err(err) => {
                    warn!("File watcher error: {}", err);
                    event_state.record_error(err.to_string());
                }
            })?;
        watcher.watch(root, RecursiveMode::Recursive)?;

        let worker_state = Arc::clone(&state);
        let worker = thread::Builder::new()
            .name("annotations-watch".to_string())
            .spawn(move || dispatch_loop(receiver, debounce, handler, worker_state))
            .map_err(|err| WatchError::new(format!("Failed to start watcher thread: {}", err)))?;

        state.mark_active();
        info!("Watching annotation files under {}", root.display());
        Ok(Self {
            watcher: Some(watcher),
            worker: Some(worker),
            root: root.to_path_buf(),
            state,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> Arc<WatcherState> {
        Arc::clone(&self.state)
    }
}

impl Drop for SettingsWatcher {
    fn drop(&mut self) {
        self.state.request_stop();
        drop(self.watcher.take());
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            error!("Annotation watcher thread panicked");
        }
        self.state.mark_stopped();
        debug!("Stopped watching {}", self.root.display());
    }
}

fn relevant_paths(event: &Event, file_names: &[String]) -> Vec<PathBuf> {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    ) {
        return Vec::new();
    }
    event
        .paths
        .iter()
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| file_names.iter().any(|wanted| wanted == name))
        })
        .cloned()
        .collect()
}

/// Collect `first` plus everything arriving within `window`. The flag is
/// true when the sender side has gone away.
fn drain_batch(
    receiver: &Receiver<PathBuf>,
    first: PathBuf,
    window: Duration,
) -> (BTreeSet<PathBuf>, bool) {
    let mut batch = BTreeSet::from([first]);
    let deadline = Instant::now() + window;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return (batch, false);
        }
        match receiver.recv_timeout(remaining) {
            Ok(path) => {
                batch.insert(path);
            }
            Err(RecvTimeoutError::Timeout) => return (batch, false),
            Err(RecvTimeoutError::Disconnected) => return (batch, true),
        }
    }
}

fn dispatch_loop<F>(
    receiver: Receiver<PathBuf>,
    debounce: Duration,
    handler: F,
    state: Arc<WatcherState>,
) where
    F: Fn(&Path) -> bool,
{
    while !state.stop_requested() {
        let first = match receiver.recv_timeout(STOP_POLL_INTERVAL) {
            Ok(path) => path,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        let (batch, disconnected) = drain_batch(&receiver, first, debounce);
        for path in batch {
            if handler(&path) {
                state.handled_count.fetch_add(1, Ordering::SeqCst);
            }
        }
        if disconnected {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_fixtures::TestFixtureRoot;
    use notify::event::{CreateKind, ModifyKind, RenameMode};
    use std::fs;

    fn names() -> Vec<String> {
        vec!["groups.yaml".to_string(), "metadata-tags.yaml".to_string()]
    }

    #[test]
    fn test_relevant_paths_filters_by_name_and_kind() {
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/ws/P/.settings/.groups.yaml.tmp.1.0"))
            .add_path(PathBuf::from("/ws/P/.settings/groups.yaml"));
        assert_eq!(
            relevant_paths(&event, &names()),
            vec![PathBuf::from("/ws/P/.settings/groups.yaml")]
        );

        let access = Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("/ws/P/.settings/groups.yaml"));
        assert!(relevant_paths(&access, &names()).is_empty());

        let other = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/ws/P/src/main.bsl"));
        assert!(relevant_paths(&other, &names()).is_empty());
    }

    #[test]
    fn test_drain_batch_coalesces_duplicates() {
        let (sender, receiver) = mpsc::channel();
        let path = PathBuf::from("/ws/P/.settings/groups.yaml");
        sender.send(path.clone()).expect("send");
        sender.send(path.clone()).expect("send");
        sender
            .send(PathBuf::from("/ws/Q/.settings/groups.yaml"))
            .expect("send");

        let (batch, disconnected) = drain_batch(&receiver, path, Duration::from_millis(50));
        assert_eq!(batch.len(), 2);
        assert!(!disconnected);

        drop(sender);
        let (batch, disconnected) = drain_batch(
            &receiver,
            PathBuf::from("/ws/R/.settings/groups.yaml"),
            Duration::from_millis(50),
        );
        assert_eq!(batch.len(), 1);
        assert!(disconnected);
    }

    #[test]
    fn test_watcher_reports_external_edit() {
        let fixture = TestFixtureRoot::new_unique("watcher-edit").expect("fixture");
        fixture.create_project("Billing").expect("project");
        let settings = fixture.settings_dir("Billing");
        fs::create_dir_all(&settings).expect("settings dir");
        let root = fixture.path().canonicalize().expect("root");

        let (seen_sender, seen) = mpsc::channel();
        let watcher = SettingsWatcher::start(&root, names(), Duration::from_millis(50), move |path| {
            let _ = seen_sender.send(path.to_path_buf());
            true
        })
        .expect("watcher");
        assert!(watcher.state().is_active());

        fs::write(settings.join("groups.yaml"), "groups: []\n").expect("write");
        let path = seen
            .recv_timeout(Duration::from_secs(10))
            .expect("change event");
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("groups.yaml"));

        let state = watcher.state();
        drop(watcher);
        assert!(!state.is_active());
        assert!(state.event_count() >= 1);
    }
}
