//! Embedded stylesheet and imagery shared by every page.

use crate::{write_if_changed, RenderError};
use include_dir::{include_dir, Dir, DirEntry};
use std::path::Path;

static STATIC_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

/// Copy the embedded assets to the top of the output root.
///
/// Returns the number of files actually written.
pub fn emit_assets(output_root: &Path) -> Result<usize, RenderError> {
    let mut written = 0;
    for entry in STATIC_ASSETS.entries() {
        written += emit_entry(entry, output_root)?;
    }
    if written > 0 {
        tracing::info!("Wrote {} static assets", written);
    }
    Ok(written)
}

fn emit_entry(entry: &DirEntry, dest: &Path) -> Result<usize, RenderError> {
    match entry {
        DirEntry::Dir(dir) => {
            let mut written = 0;
            for sub_entry in dir.entries() {
                written += emit_entry(sub_entry, dest)?;
            }
            Ok(written)
        }
        DirEntry::File(file) => {
            let target = dest.join(file.path());
            Ok(usize::from(write_if_changed(&target, file.contents())?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_assets_land_at_fixed_names() {
        let dir = tempdir().unwrap();
        assert_eq!(emit_assets(dir.path()).unwrap(), 2);

        let css = fs::read_to_string(dir.path().join("podstyle.css")).unwrap();
        assert!(css.contains(".toplink"));
        let svg = fs::read_to_string(dir.path().join("up.svg")).unwrap();
        assert!(svg.starts_with("<svg"));

        assert_eq!(emit_assets(dir.path()).unwrap(), 0);
    }
}
