//! Modification-time reading and the staleness rule.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::SystemTime;

/// Read the modification time of a path
///
/// A missing path is absence of evidence and yields `None`, including a path
/// running through a regular file; every other I/O failure (permission
/// denied, broken filesystem) is an error.
pub fn modified_time(path: &Path) -> Result<Option<SystemTime>> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            return Ok(None)
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("Failed to read metadata of {}", path.display()))
        }
    };

    let mtime = metadata
        .modified()
        .with_context(|| format!("Failed to read modification time of {}", path.display()))?;
    Ok(Some(mtime))
}

/// A build is outdated unless its state marker is strictly newer than the source file
pub fn is_outdated(build_time: SystemTime, source_time: SystemTime) -> bool {
    build_time <= source_time
}

/// Format a timestamp in local time for diagnostics
pub fn format_timestamp(time: SystemTime) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}
