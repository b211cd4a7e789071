// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Lazily loaded per-project cache
//!
//! Each project maps to one shared `Arc<RwLock<T>>`. Lookups take the map's
//! read lock; a miss upgrades to the write lock, checks again and loads.
//! Eviction only drops the map entry, so holders of an instance keep using
//! it undisturbed.

use log::error;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub type Shared<T> = Arc<RwLock<T>>;

pub struct ProjectCache<T> {
    label: &'static str,
    entries: RwLock<HashMap<String, Shared<T>>>,
}

impl<T> ProjectCache<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cached instance for `project`, loading it with `load` on a miss.
    /// Returns `None` only when the cache lock is poisoned.
    pub fn get_or_load<F>(&self, project: &str, load: F) -> Option<Shared<T>>
    where
        F: FnOnce() -> T,
    {
        match self.entries.read() {
            Ok(entries) => {
                if let Some(entry) = entries.get(project) {
                    return Some(Arc::clone(entry));
                }
            }
            Err(_) => {
                error!("🚨 CRITICAL: {} cache read lock poisoned", self.label);
                return None;
            }
        }

        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(_) => {
                error!("🚨 CRITICAL: {} cache write lock poisoned", self.label);
                return None;
            }
        };
        if let Some(entry) = entries.get(project) {
            return Some(Arc::clone(entry));
        }
        let entry = Arc::new(RwLock::new(load()));
        entries.insert(project.to_string(), Arc::clone(&entry));
        Some(entry)
    }

    pub fn get(&self, project: &str) -> Option<Shared<T>> {
        match self.entries.read() {
            Ok(entries) => entries.get(project).cloned(),
            Err(_) => {
                error!("🚨 CRITICAL: {} cache read lock poisoned", self.label);
                None
            }
        }
    }

    pub fn is_cached(&self, project: &str) -> bool {
        self.get(project).is_some()
    }

    /// Drop the entry for `project`; returns whether one was cached.
    pub fn invalidate(&self, project: &str) -> bool {
        match self.entries.write() {
            Ok(mut entries) => entries.remove(project).is_some(),
            Err(_) => {
                error!("🚨 CRITICAL: {} cache write lock poisoned", self.label);
                false
            }
        }
    }

    pub fn clear(&self) {
        match self.entries.write() {
            Ok(mut entries) => entries.clear(),
            Err(_) => error!("🚨 CRITICAL: {} cache write lock poisoned", self.label),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
