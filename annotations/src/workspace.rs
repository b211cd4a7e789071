// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Project resolution for the annotation store
//!
//! A workspace maps project names to directories. The store never builds
//! paths on its own; it asks the workspace for the settings directory of a
//! project and, on file change events, for the project a file belongs to.

use log::warn;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_SETTINGS_FOLDER: &str = ".settings";

pub trait Workspace: Send + Sync {
    /// Directory of an existing project, or `None` for unknown or invalid names.
    fn project_dir(&self, project: &str) -> Option<PathBuf>;

    /// Hidden settings directory of a project. It may not exist yet.
    fn settings_dir(&self, project: &str) -> Option<PathBuf>;

    /// Project owning a file that lives directly inside a settings directory.
    fn project_for_settings_file(&self, path: &Path) -> Option<String>;

    /// Names of all projects currently present.
    fn projects(&self) -> Vec<String>;

    /// Directory to watch for external edits, when the workspace has one.
    fn watch_root(&self) -> Option<PathBuf> {
        None
    }
}

/// Checks that `value` is usable as one path segment: non-blank, no
/// separators, no `.`/`..` and no control characters.
pub fn validate_path_segment(value: &str, what: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} cannot be empty", what));
    }
    if value.contains('/') || value.contains('\\') {
        return Err(format!("{} '{}' must not contain path separators", what, value));
    }
    if value.chars().any(|c| c.is_control()) {
        return Err(format!("{} '{}' contains control characters", what, value));
    }
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(format!("{} '{}' is not a plain name", what, value)),
    }
}

/// Workspace laid out as one sub-directory per project under a root.
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
    settings_folder: String,
}

impl FsWorkspace {
    pub fn new(root: impl Into<PathBuf>, settings_folder: &str) -> Self {
        let root = root.into();
        let root = root.canonicalize().unwrap_or(root);
        Self {
            root,
            settings_folder: settings_folder.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings_folder(&self) -> &str {
        &self.settings_folder
    }

    fn same_dir(left: &Path, right: &Path) -> bool {
        if left == right {
            return true;
        }
        match (left.canonicalize(), right.canonicalize()) {
            (Ok(left), Ok(right)) => left == right,
            _ => false,
        }
    }
}

impl Workspace for FsWorkspace {
    fn project_dir(&self, project: &str) -> Option<PathBuf> {
        if let Err(err) = validate_path_segment(project, "Project name") {
            warn!("Rejected project name: {}", err);
            return None;
        }
        let dir = self.root.join(project);
        dir.is_dir().then_some(dir)
    }

    fn settings_dir(&self, project: &str) -> Option<PathBuf> {
        self.project_dir(project)
            .map(|dir| dir.join(&self.settings_folder))
    }

    fn project_for_settings_file(&self, path: &Path) -> Option<String> {
        let settings_dir = path.parent()?;
        if settings_dir.file_name()?.to_str()? != self.settings_folder {
            return None;
        }
        let project_dir = settings_dir.parent()?;
        let project = project_dir.file_name()?.to_str()?;
        let workspace_root = project_dir.parent()?;
        if !Self::same_dir(workspace_root, &self.root) {
            return None;
        }
        validate_path_segment(project, "Project name").ok()?;
        Some(project.to_string())
    }

    fn projects(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    "Failed to list projects in {}: {}",
                    self.root.display(),
                    err
                );
                return Vec::new();
            }
        };
        let mut projects: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| !name.starts_with('.'))
            .collect();
        projects.sort();
        projects
    }

    fn watch_root(&self) -> Option<PathBuf> {
        Some(self.root.clone())
    }
}
