// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Entry point owning the tag and group services of a workspace
//!
//! `AnnotationStore` wires repositories, caches and the change bus together
//! and routes file change notifications to the right service. Hosts create
//! one per workspace and share it behind an `Arc`.

use crate::config::{AnnotationsConfig, ConfigError};
use crate::events::{AnnotationListener, ChangeBus, ListenerId};
use crate::model::{GroupHierarchy, TagCatalog};
use crate::refactoring::RefactoringParticipant;
use crate::repository::{GroupRepository, Repository, TagRepository};
use crate::service::{GroupService, TagService};
use crate::watcher::{SettingsWatcher, WatchError, WatcherState};
use crate::workspace::{FsWorkspace, Workspace};
use log::{error, info, warn};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Maps a changed file to its project and annotation kind.
struct ChangeRouter {
    workspace: Arc<dyn Workspace>,
    tags: Arc<TagService>,
    groups: Arc<GroupService>,
    tags_file: String,
    groups_file: String,
}

impl ChangeRouter {
    fn route(&self, path: &Path) -> bool {
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            return false;
        };
        if file_name != self.tags_file && file_name != self.groups_file {
            return false;
        }
        let Some(project) = self.workspace.project_for_settings_file(path) else {
            return false;
        };
        if file_name == self.tags_file {
            self.tags.handle_file_change(&project, path)
        } else {
            self.groups.handle_file_change(&project, path)
        }
    }

    fn watched_names(&self) -> Vec<String> {
        vec![self.tags_file.clone(), self.groups_file.clone()]
    }
}

pub struct AnnotationStore {
    config: AnnotationsConfig,
    workspace: Arc<dyn Workspace>,
    bus: Arc<ChangeBus>,
    tags: Arc<TagService>,
    groups: Arc<GroupService>,
    router: Arc<ChangeRouter>,
    watcher: Mutex<Option<SettingsWatcher>>,
}

impl AnnotationStore {
    pub fn new(config: AnnotationsConfig, workspace: Arc<dyn Workspace>) -> Self {
        let tag_repository = Arc::new(TagRepository::new(
            Arc::clone(&workspace),
            &config.tags_file,
        ));
        let group_repository = Arc::new(GroupRepository::new(
            Arc::clone(&workspace),
            &config.groups_file,
        ));
        Self::with_repositories(config, workspace, tag_repository, group_repository)
    }

    pub fn with_repositories(
        config: AnnotationsConfig,
        workspace: Arc<dyn Workspace>,
        tag_repository: Arc<dyn Repository<TagCatalog>>,
        group_repository: Arc<dyn Repository<GroupHierarchy>>,
    ) -> Self {
        let bus = Arc::new(ChangeBus::new());
        let tags = Arc::new(TagService::new(
            tag_repository,
            Arc::clone(&bus),
            &config.default_tag_color,
        ));
        let groups = Arc::new(GroupService::new(group_repository, Arc::clone(&bus)));
        let router = Arc::new(ChangeRouter {
            workspace: Arc::clone(&workspace),
            tags: Arc::clone(&tags),
            groups: Arc::clone(&groups),
            tags_file: config.tags_file.clone(),
            groups_file: config.groups_file.clone(),
        });
        Self {
            config,
            workspace,
            bus,
            tags,
            groups,
            router,
            watcher: Mutex::new(None),
        }
    }

    /// Open the workspace at `root` with its `annotations.yaml`, starting the
    /// file watcher when enabled. A watcher that fails to start is logged and
    /// the store works without it.
    pub fn open(root: &Path) -> Result<Self, ConfigError> {
        let config = AnnotationsConfig::load(root)?;
        let workspace = Arc::new(FsWorkspace::new(root, &config.settings_folder));
        let store = Self::new(config, workspace);
        if store.config.watch.enabled
            && let Err(err) = store.start_watching()
        {
            warn!("Annotation files will not be reloaded on external edits: {}", err);
        }
        Ok(store)
    }

    pub fn config(&self) -> &AnnotationsConfig {
        &self.config
    }

    pub fn workspace(&self) -> &Arc<dyn Workspace> {
        &self.workspace
    }

    pub fn tags(&self) -> &TagService {
        &self.tags
    }

    pub fn groups(&self) -> &GroupService {
        &self.groups
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    pub fn subscribe(&self, listener: Arc<dyn AnnotationListener>) -> ListenerId {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn refactoring_participant(&self) -> RefactoringParticipant {
        RefactoringParticipant::new(Arc::clone(&self.tags), Arc::clone(&self.groups))
    }

    /// Entry point for workspace file change notifications. Returns whether
    /// the path was an annotation file changed by someone else.
    pub fn handle_file_change(&self, path: &Path) -> bool {
        self.router.route(path)
    }

    /// Reload both annotation kinds of a project from disk.
    pub fn refresh(&self, project: &str) {
        self.tags.refresh(project);
        self.groups.refresh(project);
    }

    /// Forget the cached state of a closed project.
    pub fn close_project(&self, project: &str) {
        let tags = self.tags.evict(project);
        let groups = self.groups.evict(project);
        if tags || groups {
            info!("Released annotations of project '{}'", project);
        }
    }

    pub fn start_watching(&self) -> Result<(), WatchError> {
        let Some(root) = self.workspace.watch_root() else {
            return Err(WatchError::new("Workspace has no directory to watch"));
        };
        let mut slot = self
            .watcher
            .lock()
            .map_err(|_| WatchError::new("Watcher slot lock poisoned"))?;
        if slot.is_some() {
            return Ok(());
        }
        let router = Arc::clone(&self.router);
        let watcher = SettingsWatcher::start(
            &root,
            self.router.watched_names(),
            self.config.debounce(),
            move |path| router.route(path),
        )?;
        *slot = Some(watcher);
        Ok(())
    }

    pub fn stop_watching(&self) {
        match self.watcher.lock() {
            Ok(mut slot) => drop(slot.take()),
            Err(_) => error!("🚨 CRITICAL: watcher slot lock poisoned"),
        }
    }

    pub fn watcher_state(&self) -> Option<Arc<WatcherState>> {
        self.watcher
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(SettingsWatcher::state))
    }

    /// Stop watching, drop listeners and empty the caches.
    pub fn shutdown(&self) {
        self.stop_watching();
        self.bus.close();
        self.tags.clear();
        self.groups.clear();
        info!("Annotation store shut down");
    }
}
