use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::debug;

use crate::error::Error;

/// Largest dimension kept when converting a source image to PNG.
pub const PNG_MAX_DIMENSION: u32 = 1500;

/// Generate the full image set for one source file: a capped PNG
/// conversion, a WebP conversion, and 400px and 150px squared thumbnails.
///
/// The four tasks run concurrently and the join collects every failure into
/// one aggregate error; the shared source file is removed only after all
/// four completed cleanly.
pub fn generate_set(source: &Path) -> Result<(), Error> {
    let results = thread::scope(|scope| {
        let png = scope.spawn(|| {
            to_png(source, &source.with_extension("png"), Some(PNG_MAX_DIMENSION))
        });
        let webp = scope.spawn(|| to_webp(source, &source.with_extension("webp")));
        let thumb_400 = scope.spawn(|| make_thumb(source, 400));
        let thumb_150 = scope.spawn(|| make_thumb(source, 150));
        [png.join(), webp.join(), thumb_400.join(), thumb_150.join()]
    });

    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => failures.push(err.to_string()),
            Err(_) => failures.push("image task panicked".to_string()),
        }
    }
    if !failures.is_empty() {
        return Err(Error::Thumbnail(failures.join("; ")));
    }

    fs::remove_file(source)?;
    Ok(())
}

/// Convert any supported format to PNG, resizing down when either dimension
/// exceeds `max_dimension`.
pub fn to_png(src: &Path, dest: &Path, max_dimension: Option<u32>) -> Result<(), Error> {
    if src == dest {
        return Ok(()); // already a PNG in place
    }
    let mut img = open_image(src)?;
    if let Some(max) = max_dimension {
        if img.width() > max || img.height() > max {
            debug!("resizing {} down to {} pixels", src.display(), max);
            img = img.resize(max, max, FilterType::Lanczos3);
        }
    }
    img.save_with_format(dest, ImageFormat::Png)?;
    Ok(())
}

/// Convert any supported format to a WebP image. Sources that already are
/// WebP are left alone.
pub fn to_webp(src: &Path, dest: &Path) -> Result<(), Error> {
    let already_webp = src
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("webp"));
    if already_webp {
        return Ok(());
    }
    let img = open_image(src)?;
    let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
    rgba.save_with_format(dest, ImageFormat::WebP)?;
    Ok(())
}

/// Create a squared thumbnail of `size` pixels: resize so the width matches,
/// center-crop to size×size, save as PNG. Works on a `_<size>x` suffixed
/// copy of the source so concurrent tasks never share an open file.
pub fn make_thumb(source: &Path, size: u32) -> Result<(), Error> {
    let copy = copy_with_suffix(source, &format!("_{}x", size))?;
    let img = open_image(&copy)?;
    let resized = img.resize(size, u32::MAX, FilterType::Lanczos3);
    let (width, height) = (resized.width(), resized.height());
    let x = width.saturating_sub(size) / 2;
    let y = height.saturating_sub(size) / 2;
    let cropped = resized.crop_imm(x, y, size.min(width), size.min(height));

    let dest = copy.with_extension("png");
    cropped.save_with_format(&dest, ImageFormat::Png)?;
    if dest != copy {
        fs::remove_file(&copy)?;
    }
    Ok(())
}

/// Duplicate a file, inserting `suffix` between its stem and extension.
pub fn copy_with_suffix(source: &Path, suffix: &str) -> Result<PathBuf, Error> {
    let stem = source
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    let name = match source.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext),
        None => format!("{}{}", stem, suffix),
    };
    let dest = source.with_file_name(name);
    fs::copy(source, &dest)?;
    Ok(dest)
}

fn open_image(path: &Path) -> Result<DynamicImage, Error> {
    // Guess the format from content; extracted entries can be misnamed.
    Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?)
}
