// src/page/mod.rs
// =============================================================================
// This module contains all per-page processing.
//
// Submodules:
// - merge: structural merge of raw ins/del markers into coherent regions
// - diff: the full per-page diff step (raw diff -> merge -> tag -> write)
// - links: second-pass anchor annotation against the global classification
// - banner: status banners for pages that exist in only one version
// =============================================================================

mod banner;
mod diff;
mod links;
mod merge;

// Re-export the public API
pub use banner::{insert_banner, BannerKind};
pub use diff::diff_page;
pub use links::annotate_links;
pub use merge::merge_markers;

use crate::dom::Document;
use crate::pathkey::PathKey;

/// Stylesheet written into the output root and referenced from every page.
pub const ASSET_CSS: &str = "website_diff.css";
/// Viewer script written into the output root and referenced from every page.
pub const ASSET_JS: &str = "website_diff.js";

/// Class carried by every highlighted region and changed image.
pub const DIFF_CLASS: &str = "diff";

// References the viewer assets from the page's head, using a relative
// prefix so pages at any depth reach the output root.
pub(crate) fn attach_viewer_assets(doc: &mut Document, page: &PathKey) {
    let Some(head) = doc.find_element("head") else {
        return;
    };
    let prefix = page.root_prefix();

    let css = doc.new_element("link");
    if let Some(el) = doc.element_mut(css) {
        el.set_attr("rel", "stylesheet");
        el.set_attr("href", &format!("{prefix}{ASSET_CSS}"));
        el.set_attr("type", "text/css");
    }
    doc.append(head, css);

    let js = doc.new_element("script");
    if let Some(el) = doc.element_mut(js) {
        el.set_attr("src", &format!("{prefix}{ASSET_JS}"));
    }
    doc.append(head, js);
}

// Shared by the diff, banner, and link passes: serialize and write a page
// into the output tree.
pub(crate) fn write_page(
    doc: &Document,
    out_path: &std::path::Path,
) -> crate::error::Result<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| crate::error::DiffError::io(parent, e))?;
    }
    std::fs::write(out_path, crate::dom::to_html(doc))
        .map_err(|e| crate::error::DiffError::io(out_path, e))
}
