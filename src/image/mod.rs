// src/image/mod.rs
// =============================================================================
// This module decides whether two versions of an image differ and renders
// the highlight treatments for the output tree.
//
// Decision rule:
// - byte-identical files are equal, no decoding needed
// - a dimension mismatch counts as different
// - otherwise the decoded RGBA buffers are compared pixel by pixel
// - files that differ but cannot be decoded (e.g. SVG) count as different
//
// Rendering:
// - added images get a green tint and border, deleted images a red one
// - common-but-different images are rendered with unchanged pixels darkened
//   for context and changed pixels in solid red
// =============================================================================

use crate::error::{DiffError, Result};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use log::warn;
use std::path::Path;

// Highlight colors, RGBA
const ADDED: Rgba<u8> = Rgba([46, 160, 67, 255]);
const DELETED: Rgba<u8> = Rgba([218, 54, 51, 255]);
const CHANGED: Rgba<u8> = Rgba([218, 54, 51, 255]);

const TINT_ALPHA: f32 = 0.30;
const BORDER: u32 = 6;

/// True when the two images should be treated as changed.
pub fn images_differ(old: &Path, new: &Path) -> Result<bool> {
    let old_bytes = std::fs::read(old).map_err(|e| DiffError::io(old, e))?;
    let new_bytes = std::fs::read(new).map_err(|e| DiffError::io(new, e))?;
    if old_bytes == new_bytes {
        return Ok(false);
    }

    let (Ok(old_img), Ok(new_img)) = (
        image::load_from_memory(&old_bytes),
        image::load_from_memory(&new_bytes),
    ) else {
        // Bytes differ and at least one side is not a decodable raster
        // image, so report a change
        return Ok(true);
    };

    if old_img.dimensions() != new_img.dimensions() {
        return Ok(true);
    }

    Ok(old_img.to_rgba8().as_raw() != new_img.to_rgba8().as_raw())
}

/// Writes a highlighted copy of a newly added image.
pub fn highlight_added(src: &Path, dst: &Path) -> Result<()> {
    highlight(src, dst, ADDED)
}

/// Writes a highlighted copy of a removed image.
pub fn highlight_deleted(src: &Path, dst: &Path) -> Result<()> {
    highlight(src, dst, DELETED)
}

fn highlight(src: &Path, dst: &Path, color: Rgba<u8>) -> Result<()> {
    let Some(img) = decode(src)? else {
        // Nothing to render; the copied original stays in the output tree
        return copy_fallback(src, dst);
    };

    let (w, h) = img.dimensions();
    let source = img.to_rgba8();
    let out = RgbaImage::from_fn(w, h, |x, y| {
        if x < BORDER || y < BORDER || x + BORDER >= w || y + BORDER >= h {
            color
        } else {
            blend(*source.get_pixel(x, y), color, TINT_ALPHA)
        }
    });

    save(out, dst)
}

/// Renders a common-but-different image pair: unchanged pixels darkened,
/// changed pixels (and any area covered by only one version) in solid red.
pub fn render_changed(old: &Path, new: &Path, dst: &Path) -> Result<()> {
    let (Some(old_img), Some(new_img)) = (decode(old)?, decode(new)?) else {
        return copy_fallback(new, dst);
    };

    let old_px = old_img.to_rgba8();
    let new_px = new_img.to_rgba8();
    let w = old_px.width().max(new_px.width());
    let h = old_px.height().max(new_px.height());

    let out = RgbaImage::from_fn(w, h, |x, y| {
        let in_old = x < old_px.width() && y < old_px.height();
        let in_new = x < new_px.width() && y < new_px.height();
        match (in_old, in_new) {
            (true, true) if old_px.get_pixel(x, y) == new_px.get_pixel(x, y) => {
                darken(*new_px.get_pixel(x, y))
            }
            (_, true) => CHANGED,
            (true, false) => CHANGED,
            (false, false) => Rgba([0, 0, 0, 0]),
        }
    });

    save(out, dst)
}

fn decode(path: &Path) -> Result<Option<DynamicImage>> {
    match image::open(path) {
        Ok(img) => Ok(Some(img)),
        Err(image::ImageError::IoError(e)) => Err(DiffError::io(path, e)),
        Err(e) => {
            warn!("image {}: cannot decode ({e}), skipping highlight", path.display());
            Ok(None)
        }
    }
}

fn copy_fallback(src: &Path, dst: &Path) -> Result<()> {
    ensure_parent(dst)?;
    std::fs::copy(src, dst).map_err(|e| DiffError::io(dst, e))?;
    Ok(())
}

fn save(img: RgbaImage, dst: &Path) -> Result<()> {
    ensure_parent(dst)?;
    // JPEG has no alpha channel; the RGB view keeps saving format-agnostic
    let flattened = DynamicImage::ImageRgba8(img).to_rgb8();
    flattened.save(dst).map_err(|e| DiffError::image(dst, e))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DiffError::io(parent, e))?;
    }
    Ok(())
}

fn blend(base: Rgba<u8>, over: Rgba<u8>, alpha: f32) -> Rgba<u8> {
    let mix = |b: u8, o: u8| -> u8 { (b as f32 * (1.0 - alpha) + o as f32 * alpha) as u8 };
    Rgba([
        mix(base[0], over[0]),
        mix(base[1], over[1]),
        mix(base[2], over[2]),
        base[3],
    ])
}

fn darken(px: Rgba<u8>) -> Rgba<u8> {
    Rgba([px[0] / 2, px[1] / 2, px[2] / 2, px[3]])
}
