//! Atomic file replacement.
//!
//! Content is written to a temporary file in the target's directory, synced,
//! and renamed over the target, so readers never observe a partial file. Used
//! for the prompt cache and the `write` filter.

use crate::error::{Result, SiestaError};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Atomically write bytes to a file, creating parent directories as needed.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    if !parent.exists() {
        fs::create_dir_all(parent).map_err(|e| {
            SiestaError::Io(format!(
                "failed to create parent directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| {
        SiestaError::Io(format!(
            "failed to create temporary file in '{}': {}",
            parent.display(),
            e
        ))
    })?;

    temp.write_all(content)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| SiestaError::Io(format!("failed to write temporary file: {}", e)))?;

    temp.persist(path).map_err(|e| {
        SiestaError::Io(format!(
            "failed to atomically replace '{}': {}",
            path.display(),
            e.error
        ))
    })?;

    Ok(())
}
