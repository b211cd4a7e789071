// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use annotations::config::AnnotationsConfig;
use annotations::events::{AnnotationEvent, AnnotationListener, ListenerResult};
use annotations::repository::Repository;
use annotations::store::AnnotationStore;
use annotations::util::test_fixtures::TestFixtureRoot;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const PROJECT: &str = "app";

/// A workspace with one project and a store over it.
pub struct StoreHarness {
    pub fixture: TestFixtureRoot,
    pub store: AnnotationStore,
}

impl StoreHarness {
    pub fn new(prefix: &str) -> Self {
        let fixture = TestFixtureRoot::new_unique(prefix).expect("fixture root");
        fixture.create_project(PROJECT).expect("project dir");
        let store = open_store(&fixture);
        Self { fixture, store }
    }

    /// A second store over the same directory, sharing nothing in memory.
    pub fn reopen(&self) -> AnnotationStore {
        open_store(&self.fixture)
    }

    pub fn tags_path(&self) -> PathBuf {
        self.store.tags().file_path(PROJECT).expect("tags file path")
    }

    pub fn groups_path(&self) -> PathBuf {
        self.store.groups().file_path(PROJECT).expect("groups file path")
    }

    pub fn read(&self, path: &Path) -> String {
        std::fs::read_to_string(path).expect("read annotation file")
    }
}

pub fn open_store(fixture: &TestFixtureRoot) -> AnnotationStore {
    AnnotationStore::new(AnnotationsConfig::default(), Arc::new(fixture.workspace()))
}

/// Collects every event it sees.
#[derive(Default)]
pub struct EventRecorder {
    events: Mutex<Vec<AnnotationEvent>>,
}

impl EventRecorder {
    pub fn events(&self) -> Vec<AnnotationEvent> {
        self.events.lock().expect("recorder lock").clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().expect("recorder lock").len()
    }
}

impl AnnotationListener for EventRecorder {
    fn on_event(&self, event: &AnnotationEvent) -> ListenerResult {
        self.events
            .lock()
            .expect("recorder lock")
            .push(event.clone());
        Ok(())
    }
}

/// Repository that never persists anything.
pub struct FailingRepository<S> {
    pub saves: AtomicUsize,
    _storage: PhantomData<fn() -> S>,
}

impl<S> Default for FailingRepository<S> {
    fn default() -> Self {
        Self {
            saves: AtomicUsize::new(0),
            _storage: PhantomData,
        }
    }
}

impl<S: Default> Repository<S> for FailingRepository<S> {
    fn load(&self, _project: &str) -> S {
        S::default()
    }

    fn save(&self, _project: &str, _storage: &S) -> bool {
        self.saves.fetch_add(1, Ordering::SeqCst);
        false
    }

    fn exists(&self, _project: &str) -> bool {
        false
    }

    fn delete(&self, _project: &str) -> bool {
        false
    }

    fn file_path(&self, _project: &str) -> Option<PathBuf> {
        None
    }

    fn is_own_write(&self, _path: &Path) -> bool {
        false
    }
}
