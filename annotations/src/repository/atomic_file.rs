// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::error::Error;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const MAX_TEMP_ATTEMPTS: u32 = 100;

#[derive(Debug)]
pub struct RepositoryError {
    message: String,
}

impl RepositoryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for RepositoryError {}

/// Read a file, treating a missing or blank file as absent.
pub(crate) fn read_optional(path: &Path, label: &str) -> Result<Option<String>, RepositoryError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .map_err(|err| RepositoryError::new(format!("Failed to read {} file: {}", label, err)))?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(content))
}

/// Replace `path` with `content` through a synced temp file and a rename.
pub(crate) fn write_atomic(path: &Path, label: &str, content: &[u8]) -> Result<(), RepositoryError> {
    let label_title = title_case(label);
    let parent = path.parent().ok_or_else(|| {
        RepositoryError::new(format!("{} file path has no parent directory", label_title))
    })?;
    let file_name = path.file_name().ok_or_else(|| {
        RepositoryError::new(format!("{} file path has no file name", label_title))
    })?;
    fs::create_dir_all(parent).map_err(|err| {
        RepositoryError::new(format!(
            "Failed to create {} directory {}: {}",
            label,
            parent.display(),
            err
        ))
    })?;
    let (mut file, temp_path) = create_temp_file(parent, file_name, label, &label_title)?;

    if let Ok(metadata) = fs::metadata(path) {
        #[cfg(unix)]
        {
            if let Err(err) = fs::set_permissions(&temp_path, metadata.permissions()) {
                let _ = fs::remove_file(&temp_path);
                return Err(RepositoryError::new(format!(
                    "Failed to set temp {} file permissions: {}",
                    label, err
                )));
            }
        }
        #[cfg(not(unix))]
        let _ = metadata;
    }

    if let Err(err) = file.write_all(content) {
        let _ = fs::remove_file(&temp_path);
        return Err(RepositoryError::new(format!(
            "Failed to write {} temp file: {}",
            label, err
        )));
    }
    if let Err(err) = file.sync_all() {
        let _ = fs::remove_file(&temp_path);
        return Err(RepositoryError::new(format!(
            "Failed to sync {} temp file: {}",
            label, err
        )));
    }
    drop(file);

    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(RepositoryError::new(format!(
            "Failed to replace {} file: {}",
            label, err
        )));
    }

    #[cfg(unix)]
    {
        if let Err(err) = sync_parent_dir(parent) {
            log::warn!("{} directory sync failed: {}", label_title, err);
        }
    }

    Ok(())
}

/// Remove `path`; returns whether a file was there.
pub(crate) fn remove_if_exists(path: &Path, label: &str) -> Result<bool, RepositoryError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(RepositoryError::new(format!(
            "Failed to delete {} file: {}",
            label, err
        ))),
    }
}

fn create_temp_file(
    parent: &Path,
    file_name: &std::ffi::OsStr,
    label: &str,
    label_title: &str,
) -> Result<(fs::File, PathBuf), RepositoryError> {
    let file_name = file_name.to_str().ok_or_else(|| {
        RepositoryError::new(format!("{} file name is not valid UTF-8", label_title))
    })?;
    for attempt in 0..MAX_TEMP_ATTEMPTS {
        let temp_name = format!(".{}.tmp.{}.{}", file_name, std::process::id(), attempt);
        let temp_path = parent.join(temp_name);
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path);
        match file {
            Ok(file) => return Ok((file, temp_path)),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(RepositoryError::new(format!(
                    "Failed to create temp {} file: {}",
                    label, err
                )));
            }
        }
    }
    Err(RepositoryError::new(format!(
        "Failed to create temp {} file after multiple attempts",
        label
    )))
}

#[cfg(unix)]
fn sync_parent_dir(parent: &Path) -> Result<(), std::io::Error> {
    let dir = fs::File::open(parent)?;
    dir.sync_all()
}

fn title_case(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => format!("{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_fixtures::TestFixtureRoot;

    #[test]
    fn test_write_atomic_creates_parent_and_replaces() {
        let fixture = TestFixtureRoot::new_unique("atomic-write").expect("fixture");
        let path = fixture.path().join("nested").join("data.yaml");

        write_atomic(&path, "data", b"first\n").expect("first write");
        write_atomic(&path, "data", b"second\n").expect("second write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "second\n");

        let leftovers: Vec<_> = fs::read_dir(path.parent().expect("parent"))
            .expect("list")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_read_optional_treats_blank_as_absent() {
        let fixture = TestFixtureRoot::new_unique("atomic-read").expect("fixture");
        let path = fixture.path().join("data.yaml");
        assert!(read_optional(&path, "data").expect("missing").is_none());
        fs::write(&path, "  \n").expect("write");
        assert!(read_optional(&path, "data").expect("blank").is_none());
        fs::write(&path, "a: 1\n").expect("write");
        assert_eq!(
            read_optional(&path, "data").expect("read").as_deref(),
            Some("a: 1\n")
        );
    }

    #[test]
    fn test_remove_if_exists() {
        let fixture = TestFixtureRoot::new_unique("atomic-remove").expect("fixture");
        let path = fixture.path().join("data.yaml");
        assert!(!remove_if_exists(&path, "data").expect("missing"));
        fs::write(&path, "x").expect("write");
        assert!(remove_if_exists(&path, "data").expect("remove"));
        assert!(!path.exists());
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("tags"), "Tags");
        assert_eq!(title_case(""), "");
    }
}
