// src/pipeline/copy.rs
// =============================================================================
// Output tree scaffolding.
//
// The output starts as the old tree with the new tree overlaid on top, so
// pages and images that exist in only one version are all present before
// any diffing happens. The viewer assets land in the output root.
// =============================================================================

use crate::error::{DiffError, Result};
use crate::page::{ASSET_CSS, ASSET_JS};
use log::debug;
use std::path::Path;
use walkdir::WalkDir;

/// Copies every file under `src` to the same relative location under `dst`,
/// creating directories as needed. Returns the number of files copied.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            match e.into_io_error() {
                Some(io) => DiffError::io(path, io),
                None => DiffError::parse(src, "walk failed on a symlink loop"),
            }
        })?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .unwrap_or(entry.path());
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| DiffError::io(&target, e))?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| DiffError::io(parent, e))?;
            }
            debug!("copying {} -> {}", entry.path().display(), target.display());
            std::fs::copy(entry.path(), &target).map_err(|e| DiffError::io(&target, e))?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Writes the viewer stylesheet and script into the output root.
pub fn write_viewer_assets(out_root: &Path) -> Result<()> {
    let css = out_root.join(ASSET_CSS);
    std::fs::write(&css, include_str!("../../static/website_diff.css"))
        .map_err(|e| DiffError::io(&css, e))?;
    let js = out_root.join(ASSET_JS);
    std::fs::write(&js, include_str!("../../static/website_diff.js"))
        .map_err(|e| DiffError::io(&js, e))?;
    Ok(())
}
