//! JSON catalog file: the only thing the crawler persists.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::CrawlError;
use crate::models::CatalogSnapshot;

/// Write `snapshot` to `path` as a pretty-printed JSON array, replacing any
/// existing file.
///
/// The data goes to a sibling temp file first and is renamed into place, so
/// readers never observe a partial catalog. Missing parent directories are an
/// error, not created.
pub fn write(snapshot: &CatalogSnapshot, path: &Path) -> Result<(), CrawlError> {
    let mut json = serde_json::to_string_pretty(snapshot)?;
    json.push('\n');

    let tmp = temp_path(path);
    fs::write(&tmp, json).map_err(|source| CrawlError::Io {
        path: tmp.clone(),
        source,
    })?;

    if let Err(source) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(CrawlError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    info!("Saved {} products to {}", snapshot.len(), path.display());
    Ok(())
}

/// Read a catalog previously produced by [`write`].
pub fn load(path: &Path) -> Result<CatalogSnapshot, CrawlError> {
    let raw = fs::read_to_string(path).map_err(|source| CrawlError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(serde_json::from_str(&raw)?)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
