// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for exported files and logs

use crate::constants::app_info;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory exports land in when none is configured
///
/// Prefers the user's download directory, then home, then the working directory.
pub fn default_export_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Log file used in terminal mode, where stderr belongs to the UI
pub fn log_file_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(app_info::APP_DIR)
        .join("qr-studio.log")
}

/// Temporary sibling used while writing `path`
fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "export".to_string());
    path.with_file_name(format!(".{}.part", name))
}

/// Write `bytes` to `path` without ever exposing a partially written file
///
/// Data goes to a hidden sibling first and is renamed into place once complete.
/// On failure the sibling is removed and any existing file at `path` is untouched.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let partial = partial_path(path);
    debug!(path = %partial.display(), bytes = bytes.len(), "Writing partial file");

    if let Err(e) = tokio::fs::write(&partial, bytes).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e);
    }

    if let Err(e) = tokio::fs::rename(&partial, path).await {
        warn!(path = %path.display(), error = %e, "Failed to move export into place");
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e);
    }

    Ok(())
}
