// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::events::{AnnotationEvent, ChangeBus};
use crate::model::{Tag, TagCatalog, TagUpdate, canonical_tag_color};
use crate::repository::Repository;
use crate::service::project_store::ProjectStore;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A tag with its hotkey and the number of objects carrying it.
#[derive(Debug, Clone)]
pub struct TagSummary {
    pub tag: Tag,
    pub hotkey: Option<u8>,
    pub object_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyToggle {
    Assigned(Tag),
    Unassigned(Tag),
}

pub struct TagService {
    store: ProjectStore<TagCatalog>,
    default_color: String,
}

impl TagService {
    pub fn new(
        repository: Arc<dyn Repository<TagCatalog>>,
        bus: Arc<ChangeBus>,
        default_color: &str,
    ) -> Self {
        Self {
            store: ProjectStore::new("tags", repository, bus),
            default_color: canonical_tag_color(Some(default_color)),
        }
    }

    fn catalog_changed(project: &str) -> AnnotationEvent {
        AnnotationEvent::TagsChanged {
            project: project.to_string(),
        }
    }

    fn assignments_changed(project: &str, fqn: &str) -> AnnotationEvent {
        AnnotationEvent::AssignmentsChanged {
            project: project.to_string(),
            fqn: fqn.to_string(),
        }
    }

    pub fn tags(&self, project: &str) -> Vec<Tag> {
        self.store
            .read(project, |catalog| catalog.tags().to_vec())
            .unwrap_or_default()
    }

    pub fn tag(&self, project: &str, name: &str) -> Option<Tag> {
        self.store
            .read(project, |catalog| catalog.tag(name).cloned())
            .flatten()
    }

    /// Copy of the whole catalog, empty when it cannot be read.
    pub fn snapshot(&self, project: &str) -> TagCatalog {
        self.store
            .read(project, TagCatalog::clone)
            .unwrap_or_default()
    }

    /// Append a new tag; `color` falls back to the configured default.
    pub fn create_tag(
        &self,
        project: &str,
        name: &str,
        color: Option<&str>,
        description: Option<&str>,
    ) -> Option<Tag> {
        let color = color.unwrap_or(&self.default_color);
        let tag = Tag::new(name, Some(color), description);
        self.store
            .mutate(project, Self::catalog_changed(project), |catalog| {
                catalog.add_tag(tag.clone()).then_some(tag)
            })
            .flatten()
    }

    pub fn add_tag(
        &self,
        project: &str,
        name: &str,
        color: Option<&str>,
        description: Option<&str>,
    ) -> bool {
        self.create_tag(project, name, color, description).is_some()
    }

    pub fn update_tag(&self, project: &str, old_name: &str, update: TagUpdate) -> bool {
        self.store
            .mutate(project, Self::catalog_changed(project), |catalog| {
                catalog.update_tag(old_name, update)
            })
            .unwrap_or(false)
    }

    pub fn remove_tag(&self, project: &str, name: &str) -> bool {
        self.store
            .mutate(project, Self::catalog_changed(project), |catalog| {
                catalog.remove_tag(name)
            })
            .unwrap_or(false)
    }

    pub fn move_tag_up(&self, project: &str, name: &str) -> bool {
        self.store
            .mutate(project, Self::catalog_changed(project), |catalog| {
                catalog.move_tag_up(name)
            })
            .unwrap_or(false)
    }

    pub fn move_tag_down(&self, project: &str, name: &str) -> bool {
        self.store
            .mutate(project, Self::catalog_changed(project), |catalog| {
                catalog.move_tag_down(name)
            })
            .unwrap_or(false)
    }

    pub fn assign_tag(&self, project: &str, fqn: &str, tag_name: &str) -> bool {
        self.store
            .mutate(project, Self::assignments_changed(project, fqn), |catalog| {
                catalog.assign_tag(fqn, tag_name)
            })
            .unwrap_or(false)
    }

    pub fn unassign_tag(&self, project: &str, fqn: &str, tag_name: &str) -> bool {
        self.store
            .mutate(project, Self::assignments_changed(project, fqn), |catalog| {
                catalog.unassign_tag(fqn, tag_name)
            })
            .unwrap_or(false)
    }

    /// Flip the tag bound to `digit` on `fqn`. `None` when no tag sits at
    /// that hotkey.
    pub fn toggle_tag_by_hotkey(&self, project: &str, fqn: &str, digit: u8) -> Option<HotkeyToggle> {
        self.store
            .mutate(project, Self::assignments_changed(project, fqn), |catalog| {
                let tag = catalog.tag_at_hotkey(digit)?.clone();
                if catalog.unassign_tag(fqn, &tag.name) {
                    Some(HotkeyToggle::Unassigned(tag))
                } else if catalog.assign_tag(fqn, &tag.name) {
                    Some(HotkeyToggle::Assigned(tag))
                } else {
                    None
                }
            })
            .flatten()
    }

    pub fn object_tags(&self, project: &str, fqn: &str) -> Vec<Tag> {
        self.store
            .read(project, |catalog| {
                catalog.object_tags(fqn).into_iter().cloned().collect()
            })
            .unwrap_or_default()
    }

    pub fn objects_by_tag(&self, project: &str, tag_name: &str) -> BTreeSet<String> {
        self.store
            .read(project, |catalog| catalog.objects_by_tag(tag_name))
            .unwrap_or_default()
    }

    pub fn find_objects_by_tags(
        &self,
        project: &str,
        tag_names: &[String],
    ) -> BTreeMap<String, Vec<Tag>> {
        self.store
            .read(project, |catalog| {
                catalog
                    .find_objects_by_tags(tag_names)
                    .into_iter()
                    .map(|(fqn, tags)| (fqn, tags.into_iter().cloned().collect()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_assigned(&self, project: &str, fqn: &str, tag_name: &str) -> bool {
        self.store
            .read(project, |catalog| catalog.is_assigned(fqn, tag_name))
            .unwrap_or(false)
    }

    pub fn hotkey_index(&self, project: &str, name: &str) -> Option<u8> {
        self.store
            .read(project, |catalog| catalog.hotkey_index(name))
            .flatten()
    }

    pub fn tag_at_hotkey(&self, project: &str, digit: u8) -> Option<Tag> {
        self.store
            .read(project, |catalog| catalog.tag_at_hotkey(digit).cloned())
            .flatten()
    }

    pub fn tag_summaries(&self, project: &str) -> Vec<TagSummary> {
        self.store
            .read(project, |catalog| {
                catalog
                    .tags()
                    .iter()
                    .map(|tag| TagSummary {
                        tag: tag.clone(),
                        hotkey: catalog.hotkey_index(&tag.name),
                        object_count: catalog.object_count(&tag.name),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Move the tags of `old_fqn` to `new_fqn`, merging with existing ones.
    /// Both objects are announced.
    pub fn rename_object(&self, project: &str, old_fqn: &str, new_fqn: &str) -> bool {
        let events = vec![
            Self::assignments_changed(project, old_fqn),
            Self::assignments_changed(project, new_fqn),
        ];
        self.store
            .mutate_all(project, events, |catalog| {
                catalog.rename_object(old_fqn, new_fqn)
            })
            .unwrap_or(false)
    }

    pub fn remove_object(&self, project: &str, fqn: &str) -> bool {
        self.store
            .mutate(project, Self::assignments_changed(project, fqn), |catalog| {
                catalog.remove_object(fqn)
            })
            .unwrap_or(false)
    }

    /// Drop the cached catalog so the next access reloads it, and notify.
    pub fn refresh(&self, project: &str) {
        self.store.refresh(project, Self::catalog_changed(project));
    }

    pub fn handle_file_change(&self, project: &str, path: &Path) -> bool {
        self.store
            .handle_file_change(project, path, Self::catalog_changed(project))
    }

    /// Forget a project without notifying, e.g. when it closes.
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
