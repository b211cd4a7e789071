// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::workspace::{DEFAULT_SETTINGS_FOLDER, FsWorkspace};

/// Scratch workspace under `target/test-fixtures`, removed on drop.
#[derive(Debug)]
pub struct TestFixtureRoot {
    path: PathBuf,
}

impl TestFixtureRoot {
    pub fn new_fixed(name: &str) -> std::io::Result<Self> {
        let root = fixtures_root().join(name);
        if root.exists() {
            fs::remove_dir_all(&root)?;
        }
        fs::create_dir_all(&root)?;
        Ok(Self { path: root })
    }

    pub fn new_unique(prefix: &str) -> std::io::Result<Self> {
        let name = format!("{}-{}", prefix, Uuid::new_v4());
        Self::new_fixed(&name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.path.join(project)
    }

    pub fn settings_dir(&self, project: &str) -> PathBuf {
        self.project_dir(project).join(DEFAULT_SETTINGS_FOLDER)
    }

    pub fn create_project(&self, project: &str) -> std::io::Result<PathBuf> {
        let dir = self.project_dir(project);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Write a settings file the way an external editor would.
    pub fn write_settings_file(
        &self,
        project: &str,
        file_name: &str,
        content: &str,
    ) -> std::io::Result<PathBuf> {
        let dir = self.settings_dir(project);
        fs::create_dir_all(&dir)?;
        let path = dir.join(file_name);
        fs::write(&path, content)?;
        Ok(path)
    }

    pub fn write_config(&self, content: &str) -> std::io::Result<PathBuf> {
        let path = self.path.join(crate::config::CONFIG_FILE_NAME);
        fs::write(&path, content)?;
        Ok(path)
    }

    pub fn workspace(&self) -> FsWorkspace {
        FsWorkspace::new(&self.path, DEFAULT_SETTINGS_FOLDER)
    }
}

impl Drop for TestFixtureRoot {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn fixtures_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let repo_root = manifest_dir.parent().unwrap_or(&manifest_dir);
    repo_root.join("target").join("test-fixtures")
}
