// src/page/banner.rs
// =============================================================================
// Status banners for pages that exist in only one version.
//
// Added and deleted pages have no counterpart to diff against, so they take
// a separate path: the page already sits in the output tree (the new tree
// was overlaid on the old one), and this pass parses it, prepends a banner
// div to the body, and attaches the viewer assets.
// =============================================================================

use super::{attach_viewer_assets, write_page};
use crate::dom::Document;
use crate::error::{DiffError, Result};
use crate::pathkey::PathKey;
use std::path::Path;

/// Which banner a page gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Added,
    Deleted,
}

impl BannerKind {
    fn class(self) -> &'static str {
        match self {
            BannerKind::Added => "page-banner page-added",
            BannerKind::Deleted => "page-banner page-removed",
        }
    }

    fn message(self) -> &'static str {
        match self {
            BannerKind::Added => "This page was added in the new version.",
            BannerKind::Deleted => "This page no longer exists in the new version.",
        }
    }
}

/// Inserts a status banner at the top of the page's body, in place in the
/// output tree.
pub fn insert_banner(out_root: &Path, page: &PathKey, kind: BannerKind) -> Result<()> {
    let path = page.to_path(out_root);
    let html = std::fs::read_to_string(&path).map_err(|e| DiffError::io(&path, e))?;

    let mut doc = Document::parse(&html);
    let Some(body) = doc.find_element("body") else {
        return Err(DiffError::parse(&path, "no body element"));
    };

    let banner = doc.new_element("div");
    if let Some(el) = doc.element_mut(banner) {
        el.set_attr("class", kind.class());
    }
    let text = doc.new_text(kind.message());
    doc.append(banner, text);
    doc.insert_first(body, banner);

    attach_viewer_assets(&mut doc, page);
    write_page(&doc, &path)
}
