// src/page/links.rs
// =============================================================================
// The link annotation pass.
//
// Runs once per common page after every page has been diffed, because an
// anchor's marking depends on the target page's final status: the set of
// pages that actually changed is only complete once the diff stage has
// finished everywhere. Anchors pointing at changed pages get link-to-diff,
// at new pages link-to-add, at removed pages link-to-del. External URLs,
// non-HTML targets, and unchanged targets stay untouched.
// =============================================================================

use crate::classify::Partition;
use crate::dom::Document;
use crate::error::{DiffError, Result};
use crate::pathkey::PathKey;
use log::debug;
use std::collections::BTreeSet;
use std::path::Path;

/// Class for anchors whose target page changed.
pub const LINK_TO_DIFF: &str = "link-to-diff";
/// Class for anchors whose target page is new.
pub const LINK_TO_ADD: &str = "link-to-add";
/// Class for anchors whose target page was removed.
pub const LINK_TO_DEL: &str = "link-to-del";

/// Annotates every same-tree HTML anchor in one output page according to
/// its target's classification. Rewrites the page in place.
pub fn annotate_links(
    out_root: &Path,
    page: &PathKey,
    pages: &Partition<PathKey>,
    diff_pages: &BTreeSet<PathKey>,
) -> Result<()> {
    let path = page.to_path(out_root);
    let html = std::fs::read_to_string(&path).map_err(|e| DiffError::io(&path, e))?;
    let mut doc = Document::parse(&html);

    for id in doc.descendants(doc.root()) {
        let Some(el) = doc.element(id) else {
            continue;
        };
        if el.name != "a" {
            continue;
        }
        let Some(href) = el.attr("href") else {
            continue;
        };
        let Some(target) = PathKey::resolve(page, href) else {
            debug!("{page}: leaving external link {href:?} alone");
            continue;
        };
        if !target.is_html() {
            continue;
        }

        let class = if diff_pages.contains(&target) {
            LINK_TO_DIFF
        } else if pages.added.contains(&target) {
            LINK_TO_ADD
        } else if pages.deleted.contains(&target) {
            LINK_TO_DEL
        } else {
            debug!("{page}: target {target} unchanged, not marking");
            continue;
        };

        if let Some(el) = doc.element_mut(id) {
            el.add_class(class);
        }
    }

    super::write_page(&doc, &path)
}
