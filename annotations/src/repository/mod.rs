// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Per-project persistence of annotation files
//!
//! A repository owns one file name and maps a project to the file inside the
//! project's settings directory. It is the only part of the crate that
//! touches the file system for annotation data.

mod atomic_file;

pub use atomic_file::RepositoryError;

use crate::codec::{self, CodecError};
use crate::model::{GroupHierarchy, TagCatalog};
use crate::workspace::Workspace;
use log::{debug, error, warn};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub trait Repository<S>: Send + Sync {
    /// Load a project's storage. Missing or unreadable files yield an empty
    /// storage and a warning.
    fn load(&self, project: &str) -> S;

    fn save(&self, project: &str, storage: &S) -> bool;

    fn exists(&self, project: &str) -> bool;

    fn delete(&self, project: &str) -> bool;

    fn file_path(&self, project: &str) -> Option<PathBuf>;

    /// Whether the file at `path` still holds exactly what this repository
    /// last wrote there (or is still absent after a delete).
    fn is_own_write(&self, path: &Path) -> bool;
}

/// Describes one kind of annotation file.
pub trait AnnotationKind: Send + Sync + 'static {
    type Storage: Default;

    const LABEL: &'static str;

    fn encode(storage: &Self::Storage) -> Result<String, CodecError>;

    fn decode(content: &str) -> Result<Self::Storage, CodecError>;

    fn delete_when_empty(_storage: &Self::Storage) -> bool {
        false
    }
}

pub struct TagFile;

impl AnnotationKind for TagFile {
    type Storage = TagCatalog;

    const LABEL: &'static str = "tags";

    fn encode(storage: &TagCatalog) -> Result<String, CodecError> {
        codec::encode_tags(storage)
    }

    fn decode(content: &str) -> Result<TagCatalog, CodecError> {
        codec::decode_tags(content)
    }
}

pub struct GroupFile;

impl AnnotationKind for GroupFile {
    type Storage = GroupHierarchy;

    const LABEL: &'static str = "groups";

    fn encode(storage: &GroupHierarchy) -> Result<String, CodecError> {
        codec::encode_groups(storage)
    }

    fn decode(content: &str) -> Result<GroupHierarchy, CodecError> {
        codec::decode_groups(content)
    }

    fn delete_when_empty(storage: &GroupHierarchy) -> bool {
        storage.is_empty()
    }
}

type ContentDigest = [u8; 32];

fn digest(content: &[u8]) -> ContentDigest {
    Sha256::digest(content).into()
}

/// File-backed repository storing YAML under `<project>/<settings>/<file_name>`.
pub struct YamlRepository<K: AnnotationKind> {
    workspace: Arc<dyn Workspace>,
    file_name: String,
    // Last content written per file; `None` records a delete.
    written: Mutex<HashMap<PathBuf, Option<ContentDigest>>>,
    _kind: PhantomData<fn() -> K>,
}

pub type TagRepository = YamlRepository<TagFile>;
pub type GroupRepository = YamlRepository<GroupFile>;

impl<K: AnnotationKind> YamlRepository<K> {
    pub fn new(workspace: Arc<dyn Workspace>, file_name: &str) -> Self {
        Self {
            workspace,
            file_name: file_name.to_string(),
            written: Mutex::new(HashMap::new()),
            _kind: PhantomData,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    fn record_write(&self, path: &Path, digest: Option<ContentDigest>) -> Option<Option<ContentDigest>> {
        match self.written.lock() {
            Ok(mut written) => written.insert(path.to_path_buf(), digest),
            Err(_) => {
                error!("🚨 CRITICAL: {} write record lock poisoned", K::LABEL);
                None
            }
        }
    }

    fn restore_record(&self, path: &Path, previous: Option<Option<ContentDigest>>) {
        let Ok(mut written) = self.written.lock() else {
            error!("🚨 CRITICAL: {} write record lock poisoned", K::LABEL);
            return;
        };
        match previous {
            Some(previous) => {
                written.insert(path.to_path_buf(), previous);
            }
            None => {
                written.remove(path);
            }
        }
    }

    fn write(&self, path: &Path, storage: &K::Storage) -> Result<(), RepositoryError> {
        let content = K::encode(storage).map_err(|err| RepositoryError::new(err.to_string()))?;
        // Recorded before the rename so a watcher never sees an unrecorded write.
        let previous = self.record_write(path, Some(digest(content.as_bytes())));
        atomic_file::write_atomic(path, K::LABEL, content.as_bytes()).inspect_err(|_| {
            self.restore_record(path, previous);
        })
    }

    fn remove(&self, path: &Path) -> Result<(), RepositoryError> {
        let previous = self.record_write(path, None);
        atomic_file::remove_if_exists(path, K::LABEL)
            .map(|_| ())
            .inspect_err(|_| self.restore_record(path, previous))
    }
}

impl<K: AnnotationKind> Repository<K::Storage> for YamlRepository<K> {
    fn load(&self, project: &str) -> K::Storage {
        let Some(path) = self.file_path(project) else {
            warn!(
                "Cannot load {} for unknown project '{}'",
                K::LABEL,
                project
            );
            return Default::default();
        };
        let content = match atomic_file::read_optional(&path, K::LABEL) {
            Ok(Some(content)) => content,
            Ok(None) => {
                debug!("No {} file for project '{}'", K::LABEL, project);
                return Default::default();
            }
            Err(err) => {
                warn!("{} for project '{}'; starting empty", err, project);
                return Default::default();
            }
        };
        match K::decode(&content) {
            Ok(storage) => {
                debug!("Loaded {} for project '{}'", K::LABEL, project);
                storage
            }
            Err(err) => {
                warn!(
                    "{} in {}; starting with empty {}",
                    err,
                    path.display(),
                    K::LABEL
                );
                Default::default()
            }
        }
    }

    fn save(&self, project: &str, storage: &K::Storage) -> bool {
        let Some(path) = self.file_path(project) else {
            warn!(
                "Cannot save {} for unknown project '{}'",
                K::LABEL,
                project
            );
            return false;
        };
        let result = if K::delete_when_empty(storage) {
            self.remove(&path)
        } else {
            self.write(&path, storage)
        };
        match result {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    "Failed to save {} for project '{}': {}",
                    K::LABEL,
                    project,
                    err
                );
                false
            }
        }
    }

    fn exists(&self, project: &str) -> bool {
        self.file_path(project).is_some_and(|path| path.is_file())
    }

    fn delete(&self, project: &str) -> bool {
        let Some(path) = self.file_path(project) else {
            return false;
        };
        match self.remove(&path) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    "Failed to delete {} for project '{}': {}",
                    K::LABEL,
                    project,
                    err
                );
                false
            }
        }
    }

    fn file_path(&self, project: &str) -> Option<PathBuf> {
        self.workspace
            .settings_dir(project)
            .map(|dir| dir.join(&self.file_name))
    }

    fn is_own_write(&self, path: &Path) -> bool {
        let expected = match self.written.lock() {
            Ok(written) => match written.get(path) {
                Some(expected) => *expected,
                None => return false,
            },
            Err(_) => {
                error!("🚨 CRITICAL: {} write record lock poisoned", K::LABEL);
                return false;
            }
        };
        match std::fs::read(path) {
            Ok(content) => expected == Some(digest(&content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => expected.is_none(),
            Err(_) => false,
        }
    }
}
