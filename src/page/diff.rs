// src/page/diff.rs
// =============================================================================
// The per-page diff step for a page that exists in both versions.
//
// Steps:
// 1. Run the raw word-level differ over the old and new HTML
// 2. Parse the combined document and locate the scope element; a page
//    without the scope element cannot be diffed and fails here
// 3. Structural merge of the fragmented ins/del markers
// 4. Tag every remaining marker inside the scope with the diff class, and
//    every img whose resolved target is in the changed-image set
// 5. Attach the viewer assets to the head and write the page into the
//    output tree
//
// Returns whether the page contains at least one highlighted region.
// =============================================================================

use super::{attach_viewer_assets, merge_markers, write_page, DIFF_CLASS};
use crate::dom::Document;
use crate::error::{DiffError, Result};
use crate::htmldiff::HtmlDiff;
use crate::pathkey::PathKey;
use std::collections::BTreeSet;
use std::path::Path;

pub fn diff_page(
    differ: &dyn HtmlDiff,
    old_root: &Path,
    new_root: &Path,
    out_root: &Path,
    page: &PathKey,
    diff_images: &BTreeSet<PathKey>,
    selector: &str,
) -> Result<bool> {
    let old_path = page.to_path(old_root);
    let new_path = page.to_path(new_root);
    let old_html =
        std::fs::read_to_string(&old_path).map_err(|e| DiffError::io(&old_path, e))?;
    let new_html =
        std::fs::read_to_string(&new_path).map_err(|e| DiffError::io(&new_path, e))?;

    let combined = differ.diff(&old_html, &new_html);

    let (mut doc, scope) = Document::parse_with_scope(&combined, selector)?;
    let scope = scope.ok_or_else(|| DiffError::MissingScope {
        selector: selector.to_string(),
        path: new_path.clone(),
    })?;

    merge_markers(&mut doc);

    let mut is_diff = false;
    for id in doc.descendants(scope) {
        let Some(el) = doc.element(id) else {
            continue;
        };
        let mark = match el.name.as_str() {
            "ins" | "del" => true,
            "img" => el
                .attr("src")
                .and_then(|src| PathKey::resolve(page, src))
                .map(|target| diff_images.contains(&target))
                .unwrap_or(false),
            _ => false,
        };
        if mark {
            if let Some(el) = doc.element_mut(id) {
                el.add_class(DIFF_CLASS);
            }
            is_diff = true;
        }
    }

    attach_viewer_assets(&mut doc, page);
    write_page(&doc, &page.to_path(out_root))?;

    Ok(is_diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::htmldiff::WordDiff;
    use std::fs;
    use tempfile::TempDir;

    struct Trees {
        _dir: TempDir,
        old: std::path::PathBuf,
        new: std::path::PathBuf,
        out: std::path::PathBuf,
    }

    fn trees() -> Trees {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("old");
        let new = dir.path().join("new");
        let out = dir.path().join("out");
        fs::create_dir_all(&old).unwrap();
        fs::create_dir_all(&new).unwrap();
        fs::create_dir_all(&out).unwrap();
        Trees { _dir: dir, old, new, out }
    }

    fn page(name: &str) -> PathKey {
        PathKey::new(name).unwrap()
    }

    #[test]
    fn test_changed_page_is_marked() {
        let t = trees();
        fs::write(t.old.join("a.html"), "<html><body><main><p>old words</p></main></body></html>").unwrap();
        fs::write(t.new.join("a.html"), "<html><body><main><p>new words</p></main></body></html>").unwrap();

        let is_diff = diff_page(
            &WordDiff,
            &t.old,
            &t.new,
            &t.out,
            &page("a.html"),
            &BTreeSet::new(),
            "main",
        )
        .unwrap();

        assert!(is_diff);
        let written = fs::read_to_string(t.out.join("a.html")).unwrap();
        assert!(written.contains("class=\"diff\""));
        assert!(written.contains("website_diff.css"));
        assert!(written.contains("website_diff.js"));
    }

    #[test]
    fn test_unchanged_page_is_clean() {
        let t = trees();
        let html = "<html><body><main><p>same words</p></main></body></html>";
        fs::write(t.old.join("a.html"), html).unwrap();
        fs::write(t.new.join("a.html"), html).unwrap();

        let is_diff = diff_page(
            &WordDiff,
            &t.old,
            &t.new,
            &t.out,
            &page("a.html"),
            &BTreeSet::new(),
            "main",
        )
        .unwrap();

        assert!(!is_diff);
        let written = fs::read_to_string(t.out.join("a.html")).unwrap();
        assert!(!written.contains("class=\"diff\""));
    }

    #[test]
    fn test_changed_image_alone_marks_page() {
        let t = trees();
        let html = "<html><body><main><img src=\"img/logo.png\"></main></body></html>";
        fs::write(t.old.join("a.html"), html).unwrap();
        fs::write(t.new.join("a.html"), html).unwrap();

        let mut diff_images = BTreeSet::new();
        diff_images.insert(page("img/logo.png"));

        let is_diff = diff_page(
            &WordDiff,
            &t.old,
            &t.new,
            &t.out,
            &page("a.html"),
            &diff_images,
            "main",
        )
        .unwrap();

        assert!(is_diff);
        let written = fs::read_to_string(t.out.join("a.html")).unwrap();
        assert!(written.contains("<img src=\"img/logo.png\" class=\"diff\">"));
    }

    #[test]
    fn test_marker_outside_scope_does_not_count() {
        let t = trees();
        fs::write(
            t.old.join("a.html"),
            "<html><body><nav>old nav</nav><main><p>text</p></main></body></html>",
        )
        .unwrap();
        fs::write(
            t.new.join("a.html"),
            "<html><body><nav>new nav</nav><main><p>text</p></main></body></html>",
        )
        .unwrap();

        let is_diff = diff_page(
            &WordDiff,
            &t.old,
            &t.new,
            &t.out,
            &page("a.html"),
            &BTreeSet::new(),
            "main",
        )
        .unwrap();

        assert!(!is_diff);
    }

    #[test]
    fn test_missing_scope_is_fatal_for_the_page() {
        let t = trees();
        fs::write(t.old.join("a.html"), "<html><body><p>x</p></body></html>").unwrap();
        fs::write(t.new.join("a.html"), "<html><body><p>x</p></body></html>").unwrap();

        let err = diff_page(
            &WordDiff,
            &t.old,
            &t.new,
            &t.out,
            &page("a.html"),
            &BTreeSet::new(),
            "#content",
        )
        .unwrap_err();

        assert!(matches!(err, DiffError::MissingScope { .. }));
    }

    #[test]
    fn test_deep_page_asset_prefix() {
        let t = trees();
        let rel = "docs/guide/a.html";
        let html = "<html><body><main><p>same</p></main></body></html>";
        write_deep(&t.old, rel, html);
        write_deep(&t.new, rel, html);

        diff_page(
            &WordDiff,
            &t.old,
            &t.new,
            &t.out,
            &page(rel),
            &BTreeSet::new(),
            "main",
        )
        .unwrap();

        let written = fs::read_to_string(t.out.join(rel)).unwrap();
        assert!(written.contains("href=\"../../website_diff.css\""));
    }

    fn write_deep(root: &std::path::Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}
