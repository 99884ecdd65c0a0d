// src/pipeline/mod.rs
// =============================================================================
// The orchestrator: sequences crawling, classification, image diffing, page
// diffing, banners, and link annotation, and assembles the output tree.
//
// Scheduling: one sequential pipeline with three parallel fan-out stages
// (per-image, per-page diff, per-page link annotation). Each stage's items
// are independent and write to disjoint files, so they run on a bounded
// worker pool via buffer_unordered over spawn_blocking. The one ordering
// constraint is the barrier between page diffing and link annotation: an
// anchor can only be classified once every page's diff status is known.
//
// A single page or image failing is isolated: logged, recorded in the
// summary, and the rest of the site is still diffed. Only configuration
// and crawl-time I/O problems abort the run.
// =============================================================================

mod copy;

pub use copy::{copy_tree, write_viewer_assets};

use crate::classify::{classify, Partition};
use crate::crawl::crawl;
use crate::error::{DiffError, Result};
use crate::htmldiff::WordDiff;
use crate::image::{highlight_added, highlight_deleted, images_differ, render_changed};
use crate::page::{annotate_links, diff_page, insert_banner, BannerKind};
use crate::pathkey::PathKey;
use futures::stream::{self, StreamExt};
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task;

/// Everything the pipeline needs to run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Tree containing the old version of the website
    pub old: PathBuf,
    /// Tree containing the new version of the website
    pub new: PathBuf,
    /// Output tree; must not exist yet
    pub out: PathBuf,
    /// CSS selector for the content region diffs are restricted to
    pub selector: String,
    /// Entry page filename, e.g. "index.html"
    pub index: String,
    /// Fan-out width for the parallel stages
    pub jobs: usize,
}

/// One isolated failure, kept for the summary instead of aborting the run.
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub stage: &'static str,
    pub item: PathKey,
    pub error: String,
}

/// What the run produced.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub pages: Partition<PathKey>,
    pub images: Partition<PathKey>,
    /// Common pages whose content or images actually changed
    pub diff_pages: BTreeSet<PathKey>,
    /// Changed images: added ∪ deleted ∪ visually different common ones
    pub diff_images: BTreeSet<PathKey>,
    pub failures: Vec<Failure>,
}

impl Summary {
    /// True when no page or image had to be skipped.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum ImageKind {
    Added,
    Deleted,
    Common,
}

/// Runs the whole diff pipeline.
pub async fn run(cfg: &Config) -> Result<Summary> {
    if cfg.out.exists() {
        return Err(DiffError::OutputExists(cfg.out.clone()));
    }

    // Old tree first, new overlaid on top: resources that exist in only
    // one version are all present in the output before any diffing
    info!("Preparing output tree at {}", cfg.out.display());
    copy_tree(&cfg.old, &cfg.out)?;
    copy_tree(&cfg.new, &cfg.out)?;
    write_viewer_assets(&cfg.out)?;

    info!("Crawling old website at {}", cfg.old.display());
    let old_map = crawl(&cfg.old, &cfg.index, &cfg.selector)?;
    info!("Crawling new website at {}", cfg.new.display());
    let new_map = crawl(&cfg.new, &cfg.index, &cfg.selector)?;

    info!("Separating images into added, deleted, and common");
    let images = classify(&old_map.images, &new_map.images);
    info!("{} newly added images", images.added.len());
    info!("{} deleted images", images.deleted.len());
    info!("{} common images", images.common.len());

    info!("Separating pages into added, deleted, and common");
    let pages = classify(&old_map.pages, &new_map.pages);
    info!("{} newly added pages", pages.added.len());
    info!("{} deleted pages", pages.deleted.len());
    info!("{} common pages", pages.common.len());

    let mut failures: Vec<Failure> = Vec::new();

    // ---- image stage -------------------------------------------------------

    info!("Highlighting added/deleted images and diffing common ones");

    // Added and deleted images are changed by definition; common ones join
    // the set only when the comparison finds a visual difference
    let mut diff_images: BTreeSet<PathKey> =
        images.added.union(&images.deleted).cloned().collect();

    let image_tasks = images
        .added
        .iter()
        .map(|img| (ImageKind::Added, img.clone()))
        .chain(images.deleted.iter().map(|img| (ImageKind::Deleted, img.clone())))
        .chain(images.common.iter().map(|img| (ImageKind::Common, img.clone())))
        .collect::<Vec<_>>();

    let jobs = cfg.jobs.max(1);
    let image_results: Vec<(ImageKind, PathKey, std::result::Result<bool, String>)> =
        stream::iter(image_tasks.into_iter().map(|(kind, img)| {
            let old_root = cfg.old.clone();
            let new_root = cfg.new.clone();
            let out_root = cfg.out.clone();
            async move {
                let key = img.clone();
                let joined = task::spawn_blocking(move || {
                    image_task(kind, &img, &old_root, &new_root, &out_root)
                })
                .await;
                (kind, key, flatten(joined))
            }
        }))
        .buffer_unordered(jobs)
        .collect()
        .await;

    for (kind, img, result) in image_results {
        match (kind, result) {
            (ImageKind::Added, Ok(_)) => info!("Highlighted new image {img}"),
            (ImageKind::Deleted, Ok(_)) => info!("Highlighted deleted image {img}"),
            (ImageKind::Common, Ok(true)) => {
                info!("Image diff {img}: difference!");
                diff_images.insert(img);
            }
            (ImageKind::Common, Ok(false)) => info!("Image diff {img}: same"),
            (_, Err(error)) => {
                warn!("image {img} failed: {error}");
                failures.push(Failure {
                    stage: "images",
                    item: img,
                    error,
                });
            }
        }
    }

    // ---- page diff stage ---------------------------------------------------

    info!("Diffing common website pages");

    let diff_images = Arc::new(diff_images);
    let page_results: Vec<(PathKey, std::result::Result<bool, String>)> =
        stream::iter(pages.common.iter().cloned().map(|page| {
            let old_root = cfg.old.clone();
            let new_root = cfg.new.clone();
            let out_root = cfg.out.clone();
            let selector = cfg.selector.clone();
            let diff_images = Arc::clone(&diff_images);
            async move {
                let key = page.clone();
                let joined = task::spawn_blocking(move || {
                    diff_page(
                        &WordDiff,
                        &old_root,
                        &new_root,
                        &out_root,
                        &page,
                        &diff_images,
                        &selector,
                    )
                })
                .await;
                (key, flatten(joined))
            }
        }))
        .buffer_unordered(jobs)
        .collect()
        .await;

    let mut diff_pages: BTreeSet<PathKey> = BTreeSet::new();
    for (page, result) in page_results {
        match result {
            Ok(true) => {
                info!("Page diff {page}: difference!");
                diff_pages.insert(page);
            }
            Ok(false) => info!("Page diff {page}: same"),
            Err(error) => {
                warn!("page {page} failed: {error}");
                failures.push(Failure {
                    stage: "pages",
                    item: page,
                    error,
                });
            }
        }
    }

    // ---- banners -----------------------------------------------------------

    info!("Adding banners to added and deleted pages");
    let banner_work = pages
        .added
        .iter()
        .map(|p| (p, BannerKind::Added))
        .chain(pages.deleted.iter().map(|p| (p, BannerKind::Deleted)));
    for (page, kind) in banner_work {
        if let Err(e) = insert_banner(&cfg.out, page, kind) {
            warn!("banner for {page} failed: {e}");
            failures.push(Failure {
                stage: "banners",
                item: page.clone(),
                error: e.to_string(),
            });
        }
    }

    // ---- link annotation stage ---------------------------------------------
    // Barrier passed: diff_pages is complete, anchors can be classified

    info!("Highlighting links to changed pages");

    let pages = Arc::new(pages);
    let diff_pages = Arc::new(diff_pages);
    let link_results: Vec<(PathKey, std::result::Result<(), String>)> =
        stream::iter(pages.common.iter().cloned().map(|page| {
            let out_root = cfg.out.clone();
            let pages = Arc::clone(&pages);
            let diff_pages = Arc::clone(&diff_pages);
            async move {
                let key = page.clone();
                let joined = task::spawn_blocking(move || {
                    annotate_links(&out_root, &page, &pages, &diff_pages)
                })
                .await;
                (key, flatten(joined))
            }
        }))
        .buffer_unordered(jobs)
        .collect()
        .await;

    for (page, result) in link_results {
        if let Err(error) = result {
            warn!("link annotation for {page} failed: {error}");
            failures.push(Failure {
                stage: "links",
                item: page,
                error,
            });
        }
    }

    let pages = Arc::try_unwrap(pages).unwrap_or_else(|shared| (*shared).clone());
    let diff_pages = Arc::try_unwrap(diff_pages).unwrap_or_else(|shared| (*shared).clone());
    let diff_images = Arc::try_unwrap(diff_images).unwrap_or_else(|shared| (*shared).clone());

    Ok(Summary {
        pages,
        images,
        diff_pages,
        diff_images,
        failures,
    })
}

fn image_task(
    kind: ImageKind,
    img: &PathKey,
    old_root: &std::path::Path,
    new_root: &std::path::Path,
    out_root: &std::path::Path,
) -> Result<bool> {
    let out = img.to_path(out_root);
    match kind {
        ImageKind::Added => {
            highlight_added(&img.to_path(new_root), &out)?;
            Ok(false)
        }
        ImageKind::Deleted => {
            highlight_deleted(&img.to_path(old_root), &out)?;
            Ok(false)
        }
        ImageKind::Common => {
            let old = img.to_path(old_root);
            let new = img.to_path(new_root);
            if images_differ(&old, &new)? {
                render_changed(&old, &new, &out)?;
                Ok(true)
            } else {
                Ok(false)
            }
        }
    }
}

// A panicking worker is reported like any other per-item failure
fn flatten<T>(
    joined: std::result::Result<Result<T>, task::JoinError>,
) -> std::result::Result<T, String> {
    match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) => Err(format!("worker task failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn write_png(root: &Path, rel: &str, rgb: [u8; 3]) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        RgbImage::from_pixel(16, 16, image::Rgb(rgb)).save(path).unwrap();
    }

    fn key(s: &str) -> PathKey {
        PathKey::new(s).unwrap()
    }

    fn keyset(items: &[&str]) -> BTreeSet<PathKey> {
        items.iter().map(|s| key(s)).collect()
    }

    // One miniature site, end to end
    #[tokio::test]
    async fn test_pipeline_end_to_end() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("old");
        let new = dir.path().join("new");
        let out = dir.path().join("out");

        write(
            &old,
            "index.html",
            "<html><body><main>\
             <a href=\"a.html\">a</a> <a href=\"b.html\">b</a> <a href=\"d.html\">d</a>\
             <img src=\"logo.png\">\
             </main></body></html>",
        );
        write(&old, "a.html", "<html><body><main><p>stable text</p></main></body></html>");
        write(&old, "b.html", "<html><body><main><p>before words</p></main></body></html>");
        write(&old, "d.html", "<html><body><main><p>doomed</p></main></body></html>");
        write_png(&old, "logo.png", [10, 10, 10]);

        write(
            &new,
            "index.html",
            "<html><body><main>\
             <a href=\"a.html\">a</a> <a href=\"b.html\">b</a> <a href=\"c.html\">c</a>\
             <img src=\"logo.png\">\
             </main></body></html>",
        );
        write(&new, "a.html", "<html><body><main><p>stable text</p></main></body></html>");
        write(&new, "b.html", "<html><body><main><p>after words</p></main></body></html>");
        write(&new, "c.html", "<html><body><main><p>brand new</p></main></body></html>");
        write_png(&new, "logo.png", [200, 10, 10]);

        let cfg = Config {
            old,
            new,
            out: out.clone(),
            selector: "main".to_string(),
            index: "index.html".to_string(),
            jobs: 4,
        };

        let summary = run(&cfg).await.unwrap();

        assert!(summary.is_clean(), "failures: {:?}", summary.failures);
        assert_eq!(summary.pages.added, keyset(&["c.html"]));
        assert_eq!(summary.pages.deleted, keyset(&["d.html"]));
        assert_eq!(
            summary.pages.common,
            keyset(&["a.html", "b.html", "index.html"])
        );
        assert_eq!(summary.diff_images, keyset(&["logo.png"]));
        assert!(summary.diff_pages.contains(&key("b.html")));
        assert!(!summary.diff_pages.contains(&key("a.html")));
        // The changed logo marks index.html even aside from its link churn
        assert!(summary.diff_pages.contains(&key("index.html")));

        // Output tree: viewer assets, diffed pages, banners, annotated links
        assert!(out.join("website_diff.css").exists());
        assert!(out.join("website_diff.js").exists());

        let b = fs::read_to_string(out.join("b.html")).unwrap();
        assert!(b.contains("class=\"diff\""));

        let index = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(index.contains("link-to-diff"));
        assert!(index.contains("link-to-add"));

        let c = fs::read_to_string(out.join("c.html")).unwrap();
        assert!(c.contains("page-added"));
        let d = fs::read_to_string(out.join("d.html")).unwrap();
        assert!(d.contains("page-removed"));

        let a = fs::read_to_string(out.join("a.html")).unwrap();
        assert!(!a.contains("class=\"diff\""));
    }

    #[tokio::test]
    async fn test_existing_output_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();

        let cfg = Config {
            old: dir.path().join("old"),
            new: dir.path().join("new"),
            out,
            selector: "html".to_string(),
            index: "index.html".to_string(),
            jobs: 1,
        };

        let err = run(&cfg).await.unwrap_err();
        assert!(matches!(err, DiffError::OutputExists(_)));
    }

    #[tokio::test]
    async fn test_page_failure_is_isolated() {
        // One page has no scope element; the rest of the site still diffs
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("old");
        let new = dir.path().join("new");
        let out = dir.path().join("out");

        write(
            &old,
            "index.html",
            "<html><body><main><a href=\"broken.html\">x</a></main></body></html>",
        );
        write(&old, "broken.html", "<html><body><p>no scope here</p></body></html>");
        write(
            &new,
            "index.html",
            "<html><body><main><a href=\"broken.html\">x</a></main></body></html>",
        );
        write(&new, "broken.html", "<html><body><p>still none</p></body></html>");

        let cfg = Config {
            old,
            new,
            out,
            selector: "main".to_string(),
            index: "index.html".to_string(),
            jobs: 2,
        };

        let summary = run(&cfg).await.unwrap();
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].stage, "pages");
        assert_eq!(summary.failures[0].item, key("broken.html"));
        // index.html itself still made it through
        assert!(summary.pages.common.contains(&key("index.html")));
    }
}
