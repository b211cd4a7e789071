// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::events::{AnnotationEvent, ChangeBus};
use crate::model::{Group, GroupHierarchy, normalize_group_path};
use crate::repository::Repository;
use crate::service::project_store::ProjectStore;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct GroupService {
    store: ProjectStore<GroupHierarchy>,
}

impl GroupService {
    pub fn new(repository: Arc<dyn Repository<GroupHierarchy>>, bus: Arc<ChangeBus>) -> Self {
        Self {
            store: ProjectStore::new("groups", repository, bus),
        }
    }

    fn changed(project: &str) -> AnnotationEvent {
        AnnotationEvent::GroupsChanged {
            project: project.to_string(),
        }
    }

    pub fn all_groups(&self, project: &str) -> Vec<Group> {
        self.store
            .read(project, |hierarchy| hierarchy.groups().to_vec())
            .unwrap_or_default()
    }

    pub fn snapshot(&self, project: &str) -> GroupHierarchy {
        self.store
            .read(project, GroupHierarchy::clone)
            .unwrap_or_default()
    }

    pub fn group(&self, project: &str, full_path: &str) -> Option<Group> {
        self.store
            .read(project, |hierarchy| hierarchy.group_by_full_path(full_path).cloned())
            .flatten()
    }

    pub fn groups_at_path(&self, project: &str, path: &str) -> Vec<Group> {
        self.store
            .read(project, |hierarchy| {
                hierarchy
                    .groups_at_path(path)
                    .into_iter()
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_groups_at_path(&self, project: &str, path: &str) -> bool {
        self.store
            .read(project, |hierarchy| hierarchy.has_groups_at_path(path))
            .unwrap_or(false)
    }

    pub fn group_count(&self, project: &str) -> usize {
        self.store
            .read(project, GroupHierarchy::len)
            .unwrap_or(0)
    }

    pub fn find_group_for_object(&self, project: &str, fqn: &str) -> Option<Group> {
        self.store
            .read(project, |hierarchy| hierarchy.find_group_for_object(fqn).cloned())
            .flatten()
    }

    pub fn grouped_objects_under(&self, project: &str, path: &str) -> BTreeSet<String> {
        self.store
            .read(project, |hierarchy| hierarchy.grouped_objects_under(path))
            .unwrap_or_default()
    }

    pub fn add_group(&self, project: &str, group: Group) -> bool {
        self.store
            .mutate(project, Self::changed(project), |hierarchy| {
                hierarchy.add_group(group)
            })
            .unwrap_or(false)
    }

    /// Create an empty group placed after its current siblings.
    pub fn create_group(
        &self,
        project: &str,
        name: &str,
        path: &str,
        description: Option<&str>,
    ) -> Option<Group> {
        let path = normalize_group_path(path)?;
        self.store
            .mutate(project, Self::changed(project), |hierarchy| {
                let group = Group::new(name, &path)
                    .with_description(description)
                    .with_order(hierarchy.next_order_at(&path));
                hierarchy.add_group(group.clone()).then_some(group)
            })
            .flatten()
    }

    pub fn remove_group(&self, project: &str, full_path: &str) -> bool {
        self.store
            .mutate(project, Self::changed(project), |hierarchy| {
                hierarchy.remove_group(full_path)
            })
            .unwrap_or(false)
    }

    pub fn rename_group(&self, project: &str, old_full_path: &str, new_name: &str) -> bool {
        self.store
            .mutate(project, Self::changed(project), |hierarchy| {
                hierarchy.rename_group(old_full_path, new_name)
            })
            .unwrap_or(false)
    }

    pub fn update_group(
        &self,
        project: &str,
        full_path: &str,
        new_name: &str,
        description: Option<&str>,
    ) -> bool {
        self.store
            .mutate(project, Self::changed(project), |hierarchy| {
                hierarchy.update_group(full_path, new_name, description)
            })
            .unwrap_or(false)
    }

    /// Regroup an object. A missing target leaves the object ungrouped and
    /// that state is saved.
    pub fn move_object_to_group(&self, project: &str, fqn: &str, target: &str) -> bool {
        self.store
            .mutate(project, Self::changed(project), |hierarchy| {
                hierarchy.move_object_to_group(fqn, target)
            })
            .unwrap_or(false)
    }

    pub fn remove_object_from_group(&self, project: &str, fqn: &str) -> bool {
        self.remove_object(project, fqn)
    }

    pub fn remove_object(&self, project: &str, fqn: &str) -> bool {
        self.store
            .mutate(project, Self::changed(project), |hierarchy| {
                hierarchy.remove_object(fqn)
            })
            .unwrap_or(false)
    }

    pub fn rename_object(&self, project: &str, old_fqn: &str, new_fqn: &str) -> bool {
        self.store
            .mutate(project, Self::changed(project), |hierarchy| {
                hierarchy.rename_object(old_fqn, new_fqn)
            })
            .unwrap_or(false)
    }

    pub fn refresh(&self, project: &str) {
        self.store.refresh(project, Self::changed(project));
    }

    pub fn handle_file_change(&self, project: &str, path: &Path) -> bool {
        self.store
            .handle_file_change(project, path, Self::changed(project))
    }

    pub fn evict(&self, project: &str) -> bool {
        self.store.evict(project)
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    pub fn is_cached(&self, project: &str) -> bool {
        self.store.is_cached(project)
    }

    pub fn file_path(&self, project: &str) -> Option<PathBuf> {
        self.store.file_path(project)
    }

    pub fn has_file(&self, project: &str) -> bool {
        self.store.exists(project)
    }
}
