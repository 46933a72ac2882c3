// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::StoreError;

/// Read a YAML state file. A missing file is not an error; callers start
/// from an empty collection.
pub fn read_yaml_file<T: DeserializeOwned>(
    path: &Path,
    label: &str,
) -> Result<Option<T>, StoreError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(StoreError::FileError(format!(
                "Failed to read {} file: {}",
                label, err
            )));
        }
    };
    let value = serde_yaml::from_str(&content).map_err(|err| {
        StoreError::ParseError(format!("Failed to parse {} file: {}", label, err))
    })?;
    Ok(Some(value))
}

/// Write a YAML state file atomically: temp file in the same directory,
/// fsync, rename over the target, then sync the parent directory.
pub fn write_yaml_file<T: Serialize>(path: &Path, label: &str, value: &T) -> Result<(), StoreError> {
    let content = serde_yaml::to_string(value).map_err(|err| {
        StoreError::ParseError(format!("Failed to serialize {} file: {}", label, err))
    })?;

    let parent = path.parent().ok_or_else(|| {
        StoreError::FileError(format!("{} file path has no parent directory", label))
    })?;
    let file_name = path
        .file_name()
        .ok_or_else(|| StoreError::FileError(format!("{} file path has no file name", label)))?;
    let (mut file, temp_path) = create_temp_file(parent, file_name, label)?;

    if let Err(err) = file.write_all(content.as_bytes()) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(StoreError::FileError(format!(
            "Failed to write {} temp file: {}",
            label, err
        )));
    }
    if let Err(err) = file.sync_all() {
        let _ = std::fs::remove_file(&temp_path);
        return Err(StoreError::FileError(format!(
            "Failed to sync {} temp file: {}",
            label, err
        )));
    }
    if let Err(err) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(StoreError::FileError(format!(
            "Failed to replace {} file: {}",
            label, err
        )));
    }

    #[cfg(unix)]
    {
        if let Err(err) = sync_parent_dir(parent) {
            log::warn!("{} directory sync failed: {}", label, err);
        }
    }

    Ok(())
}

fn create_temp_file(
    dir: &Path,
    file_name: &std::ffi::OsStr,
    label: &str,
) -> Result<(std::fs::File, PathBuf), StoreError> {
    use std::fs::OpenOptions;
    const MAX_ATTEMPTS: u32 = 100;
    let base = file_name.to_string_lossy();
    for attempt in 0..MAX_ATTEMPTS {
        let candidate = dir.join(format!(".{}.tmp.{}.{}", base, std::process::id(), attempt));
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => return Ok((file, candidate)),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(StoreError::FileError(format!(
                    "Failed to create {} temp file: {}",
                    label, err
                )));
            }
        }
    }
    Err(StoreError::FileError(format!(
        "Failed to create {} temp file after repeated attempts",
        label
    )))
}

#[cfg(unix)]
fn sync_parent_dir(parent: &Path) -> Result<(), std::io::Error> {
    let dir = std::fs::File::open(parent)?;
    dir.sync_all()
}
