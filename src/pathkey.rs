// src/pathkey.rs
// =============================================================================
// This module defines PathKey: the identity of a page or image inside one
// website tree.
//
// Two resources are "the same resource across versions" exactly when their
// PathKeys are equal, so every path that enters the system - crawl results,
// img src attributes, anchor hrefs - goes through the single normalization
// implemented here:
// - backslashes become forward slashes
// - "." and empty segments are dropped, ".." collapses into its parent
// - fragment (#...) and query (?...) suffixes are stripped from hrefs
// - hrefs starting with "/" resolve against the tree root
// - anything escaping the tree root is rejected
//
// Case is preserved: folding would conflate distinct files on the
// case-sensitive filesystems this tool runs against.
// =============================================================================

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// A normalized path relative to its tree root.
///
/// Ordered and hashable so it can live in `BTreeSet`s; serialized as a plain
/// string in the JSON summary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PathKey(String);

impl PathKey {
    /// Normalizes a raw relative path into a PathKey.
    ///
    /// Returns None when the path is empty after normalization or when a
    /// ".." segment would climb above the tree root.
    pub fn new(raw: &str) -> Option<PathKey> {
        let cleaned = raw.replace('\\', "/");
        let mut segments: Vec<&str> = Vec::new();

        for segment in cleaned.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    // Climbing above the root means the reference leaves
                    // the tree; there is nothing we could compare it to
                    segments.pop()?;
                }
                s => segments.push(s),
            }
        }

        if segments.is_empty() {
            return None;
        }

        Some(PathKey(segments.join("/")))
    }

    /// Resolves an href or src attribute found on `page` into a PathKey.
    ///
    /// Returns None for anything that is not a same-tree relative reference:
    /// absolute URLs (http:, https:, mailto:, data:, ...), protocol-relative
    /// references, bare fragments, and references escaping the tree root.
    /// Fragment and query suffixes are stripped before resolution.
    pub fn resolve(page: &PathKey, href: &str) -> Option<PathKey> {
        // Strip the fragment first, then the query
        let href = href.split('#').next().unwrap_or("");
        let href = href.split('?').next().unwrap_or("");

        if href.is_empty() || href.starts_with("//") {
            return None;
        }

        // If the whole thing parses as a URL it has a scheme, which makes
        // it external (https:, mailto:, tel:, data:, javascript:, ...)
        if Url::parse(href).is_ok() {
            return None;
        }

        if let Some(rooted) = href.strip_prefix('/') {
            // Site-root-relative reference: resolve against the tree root
            return PathKey::new(rooted);
        }

        // Ordinary relative reference: resolve against the page's directory
        match page.dir() {
            "" => PathKey::new(href),
            dir => PathKey::new(&format!("{dir}/{href}")),
        }
    }

    /// The string form, always forward-slash separated.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The directory part of the key ("" for top-level entries).
    pub fn dir(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// True when the key names an HTML page (.html or .htm, any case).
    pub fn is_html(&self) -> bool {
        let lower = self.0.to_ascii_lowercase();
        lower.ends_with(".html") || lower.ends_with(".htm")
    }

    /// The on-disk location of this resource under `root`.
    pub fn to_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in self.0.split('/') {
            path.push(segment);
        }
        path
    }

    /// Relative prefix from this page's directory back up to the tree root,
    /// e.g. "" for "index.html" and "../../" for "a/b/page.html".
    ///
    /// Used to reference the viewer assets in the output root from any page.
    pub fn root_prefix(&self) -> String {
        "../".repeat(self.0.matches('/').count())
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> PathKey {
        PathKey::new(s).unwrap()
    }

    #[test]
    fn test_separators_and_dot_segments() {
        assert_eq!(key("a\\b/./c.html").as_str(), "a/b/c.html");
        assert_eq!(key("a/b/../c.html").as_str(), "a/c.html");
        assert_eq!(key("./index.html").as_str(), "index.html");
    }

    #[test]
    fn test_escaping_root_is_rejected() {
        assert_eq!(PathKey::new("../up.html"), None);
        assert_eq!(PathKey::new("a/../../up.html"), None);
        assert_eq!(PathKey::new(""), None);
    }

    #[test]
    fn test_resolve_relative_to_page_dir() {
        let page = key("docs/guide/start.html");
        let target = PathKey::resolve(&page, "../api.html").unwrap();
        assert_eq!(target.as_str(), "docs/api.html");
    }

    #[test]
    fn test_resolve_strips_fragment_and_query() {
        let page = key("index.html");
        assert_eq!(
            PathKey::resolve(&page, "b.html#section").unwrap().as_str(),
            "b.html"
        );
        assert_eq!(
            PathKey::resolve(&page, "b.html?v=2").unwrap().as_str(),
            "b.html"
        );
        // A bare fragment points at the page itself, not a tree resource
        assert_eq!(PathKey::resolve(&page, "#top"), None);
    }

    #[test]
    fn test_resolve_skips_external_references() {
        let page = key("index.html");
        assert_eq!(PathKey::resolve(&page, "https://ext.example/e.html"), None);
        assert_eq!(PathKey::resolve(&page, "mailto:someone@example.com"), None);
        assert_eq!(PathKey::resolve(&page, "//cdn.example/lib.js"), None);
        assert_eq!(PathKey::resolve(&page, "javascript:void(0)"), None);
    }

    #[test]
    fn test_resolve_root_relative() {
        let page = key("docs/guide/start.html");
        let target = PathKey::resolve(&page, "/images/logo.png").unwrap();
        assert_eq!(target.as_str(), "images/logo.png");
    }

    #[test]
    fn test_same_target_two_spellings() {
        let page = key("docs/start.html");
        let a = PathKey::resolve(&page, "intro.html").unwrap();
        let b = PathKey::resolve(&page, "./sub/../intro.html#part2").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_is_html() {
        assert!(key("a/b.html").is_html());
        assert!(key("a/B.HTM").is_html());
        assert!(!key("a/logo.png").is_html());
    }

    #[test]
    fn test_root_prefix() {
        assert_eq!(key("index.html").root_prefix(), "");
        assert_eq!(key("a/b/page.html").root_prefix(), "../../");
    }
}
