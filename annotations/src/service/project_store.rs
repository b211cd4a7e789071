// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::cache::{ProjectCache, Shared};
use crate::events::{AnnotationEvent, ChangeBus};
use crate::model::Revisioned;
use crate::repository::Repository;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Cache, repository and bus for one annotation kind.
///
/// A mutation holds the project's write lock while it changes the storage
/// and saves it, then releases the lock and publishes. Saves and events only
/// happen when the storage revision moved.
pub(crate) struct ProjectStore<T> {
    label: &'static str,
    repository: Arc<dyn Repository<T>>,
    cache: ProjectCache<T>,
    bus: Arc<ChangeBus>,
}

impl<T: Revisioned> ProjectStore<T> {
    pub(crate) fn new(
        label: &'static str,
        repository: Arc<dyn Repository<T>>,
        bus: Arc<ChangeBus>,
    ) -> Self {
        Self {
            label,
            repository,
            cache: ProjectCache::new(label),
            bus,
        }
    }

    fn instance(&self, project: &str) -> Option<Shared<T>> {
        self.cache.get_or_load(project, || {
            debug!("Loading {} for project '{}'", self.label, project);
            self.repository.load(project)
        })
    }

    pub(crate) fn read<R>(&self, project: &str, query: impl FnOnce(&T) -> R) -> Option<R> {
        let instance = self.instance(project)?;
        let guard = match instance.read() {
            Ok(guard) => guard,
            Err(_) => {
                error!(
                    "🚨 CRITICAL: {} lock poisoned for project '{}'",
                    self.label, project
                );
                return None;
            }
        };
        Some(query(&*guard))
    }

    pub(crate) fn mutate<R>(
        &self,
        project: &str,
        event: AnnotationEvent,
        change: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        self.mutate_all(project, vec![event], change)
    }

    /// Like `mutate`, publishing each event in turn after a change.
    pub(crate) fn mutate_all<R>(
        &self,
        project: &str,
        events: Vec<AnnotationEvent>,
        change: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        let instance = self.instance(project)?;
        let (result, changed) = {
            let mut guard = match instance.write() {
                Ok(guard) => guard,
                Err(_) => {
                    error!(
                        "🚨 CRITICAL: {} lock poisoned for project '{}'",
                        self.label, project
                    );
                    return None;
                }
            };
            let revision = guard.revision();
            let result = change(&mut *guard);
            let changed = guard.revision() != revision;
            if changed && !self.repository.save(project, &*guard) {
                warn!(
                    "Unsaved {} changes for project '{}' stay in memory until the next save",
                    self.label, project
                );
            }
            (result, changed)
        };
        if changed {
            for event in &events {
                self.bus.publish(event);
            }
        }
        Some(result)
    }

    pub(crate) fn refresh(&self, project: &str, event: AnnotationEvent) {
        self.cache.invalidate(project);
        info!("Reloading {} for project '{}'", self.label, project);
        self.bus.publish(&event);
    }

    /// React to a change of the backing file. Echoes of our own writes are
    /// ignored; anything else evicts the cached instance.
    pub(crate) fn handle_file_change(
        &self,
        project: &str,
        path: &Path,
        event: AnnotationEvent,
    ) -> bool {
        if self.repository.is_own_write(path) {
            debug!("Ignoring own write to {}", path.display());
            return false;
        }
        let was_cached = self.cache.invalidate(project);
        info!(
            "{} file changed externally for project '{}'{}",
            self.label,
            project,
            if was_cached { ", cache evicted" } else { "" }
        );
        self.bus.publish(&event);
        true
    }

    pub(crate) fn evict(&self, project: &str) -> bool {
        self.cache.invalidate(project)
    }

    pub(crate) fn clear(&self) {
        self.cache.clear();
    }

    pub(crate) fn is_cached(&self, project: &str) -> bool {
        self.cache.is_cached(project)
    }

    pub(crate) fn file_path(&self, project: &str) -> Option<PathBuf> {
        self.repository.file_path(project)
    }

    pub(crate) fn exists(&self, project: &str) -> bool {
        self.repository.exists(project)
    }
}
