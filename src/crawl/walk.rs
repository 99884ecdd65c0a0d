// src/crawl/walk.rs
// =============================================================================
// This module implements the crawl over one website tree on disk.
//
// How it works:
// 1. Start with the entry page in a queue
// 2. Parse the page HTML and restrict discovery to the scope element
// 3. Queue every same-tree relative link ending in an HTML extension
//    (fragment/query suffixes stripped first); record every img src
// 4. Repeat until the queue is empty
//
// A visited set of normalized PathKeys guarantees termination on cyclic
// link graphs and keeps each page's work from happening twice. A reference
// to a page or image that does not exist on disk is recorded in the sitemap
// (with a warning) but is not followed further.
// =============================================================================

use crate::error::{DiffError, Result};
use crate::pathkey::PathKey;
use log::{debug, warn};
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::Path;

/// The crawl result for one tree: every reachable page and every referenced
/// image, as PathKeys relative to the tree root. Built once, never mutated
/// afterward.
#[derive(Debug, Clone)]
pub struct Sitemap {
    pub pages: BTreeSet<PathKey>,
    pub images: BTreeSet<PathKey>,
}

/// Crawls the tree rooted at `root` starting from `entry` (e.g. "index.html"),
/// restricting link and image discovery to the subtree matched by `selector`.
pub fn crawl(root: &Path, entry: &str, selector: &str) -> Result<Sitemap> {
    let scope_sel =
        Selector::parse(selector).map_err(|_| DiffError::InvalidSelector(selector.to_string()))?;
    let link_sel = Selector::parse("a[href]").map_err(|_| DiffError::InvalidSelector("a[href]".into()))?;
    let img_sel = Selector::parse("img[src]").map_err(|_| DiffError::InvalidSelector("img[src]".into()))?;

    let entry_key = PathKey::new(entry)
        .ok_or_else(|| DiffError::parse(root.join(entry), "entry page name does not normalize"))?;

    let mut queue = VecDeque::new();
    queue.push_back(entry_key);

    let mut visited: HashSet<PathKey> = HashSet::new();
    let mut pages: BTreeSet<PathKey> = BTreeSet::new();
    let mut images: BTreeSet<PathKey> = BTreeSet::new();

    while let Some(page) = queue.pop_front() {
        if !visited.insert(page.clone()) {
            continue;
        }

        // Every reachable page belongs in the sitemap, even one that turns
        // out to be missing on disk: it still has an identity to classify
        pages.insert(page.clone());

        let disk_path = page.to_path(root);
        let html = match std::fs::read_to_string(&disk_path) {
            Ok(html) => html,
            // A dangling reference is recorded but not followed, and a page
            // that is not text is isolated; any other I/O problem means we
            // cannot trust the sitemap at all
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("page {page} is referenced but missing on disk");
                continue;
            }
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                warn!("page {page} is not valid UTF-8, skipping its links");
                continue;
            }
            Err(e) => return Err(DiffError::io(&disk_path, e)),
        };

        debug!("crawling {page}");
        let document = Html::parse_document(&html);

        // Discovery is restricted to the scope element; a page without one
        // degrades to whole-document discovery
        let scope: ElementRef = match document.select(&scope_sel).next() {
            Some(el) => el,
            None => {
                warn!("page {page}: selector {selector:?} matched nothing, crawling whole document");
                document.root_element()
            }
        };

        for element in scope.select(&link_sel) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(target) = PathKey::resolve(&page, href) else {
                debug!("  skipping external or non-tree link {href:?}");
                continue;
            };
            if !target.is_html() {
                debug!("  skipping non-HTML link target {target}");
                continue;
            }
            if !visited.contains(&target) {
                queue.push_back(target);
            }
        }

        for element in scope.select(&img_sel) {
            let Some(src) = element.value().attr("src") else {
                continue;
            };
            let Some(target) = PathKey::resolve(&page, src) else {
                debug!("  skipping external image {src:?}");
                continue;
            };
            if !target.to_path(root).exists() {
                warn!("image {target} is referenced by {page} but missing on disk");
            }
            images.insert(target);
        }
    }

    Ok(Sitemap { pages, images })
}
