//! # projdocs-render
//!
//! Site-level output for projdocs: the navigation index and the shared
//! static assets every page links to.

pub mod assets;
pub mod index;

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use assets::emit_assets;
pub use index::{navigation_json, render_index, write_index, IndexTemplate};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write `contents` unless the file already holds exactly those bytes.
///
/// Returns whether anything was written.
pub fn write_if_changed(path: &Path, contents: &[u8]) -> Result<bool, RenderError> {
    if fs::read(path).is_ok_and(|existing| existing == contents) {
        tracing::debug!("Unchanged: {}", path.display());
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| RenderError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| RenderError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("Wrote {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_if_changed_skips_identical_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/file.txt");

        assert!(write_if_changed(&path, b"one").unwrap());
        assert!(!write_if_changed(&path, b"one").unwrap());
        assert!(write_if_changed(&path, b"two").unwrap());
        assert_eq!(fs::read(&path).unwrap(), b"two");
    }
}
