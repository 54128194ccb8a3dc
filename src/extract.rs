use indicatif::HumanBytes;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::catalog::Catalog;
use crate::db::ProofRecord;
use crate::error::Error;
use crate::thumbs;

const IMAGE_EXTENSIONS: &[&str] = &["bmp", "gif", "jpg", "jpeg", "png", "tif", "tiff", "webp"];
const TEXT_EXTENSIONS: &[&str] = &["txt", "nfo", "diz"];

/// Return the entry names contained in an archive.
pub fn list_entries(archive: &Path) -> Result<Vec<String>, Error> {
    let file = File::open(archive)?;
    let zip = ZipArchive::new(file)?;
    Ok(zip.file_names().map(String::from).collect())
}

/// Decompress an archive into the destination directory.
pub fn extract(archive: &Path, dest: &Path) -> Result<(), Error> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(file)?;
    zip.extract(dest)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Text,
    Other,
}

pub fn classify(name: &str) -> MediaKind {
    let ext = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => MediaKind::Image,
        Some(ext) if TEXT_EXTENSIONS.contains(&ext) => MediaKind::Text,
        _ => MediaKind::Other,
    }
}

/// Entries picked out of an extracted archive: the largest image and the
/// first text file in name order.
#[derive(Debug, Default)]
pub struct Selection {
    pub image: Option<PathBuf>,
    pub text: Option<PathBuf>,
}

pub fn select_candidates(dir: &Path) -> Result<Selection, Error> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut image: Option<(PathBuf, u64)> = None;
    let mut text: Option<PathBuf> = None;
    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        let size = entry.metadata()?.len();
        let name = entry.file_name().to_string_lossy().into_owned();
        match classify(&name) {
            MediaKind::Image => {
                if image.as_ref().map_or(true, |(_, largest)| size > *largest) {
                    image = Some((path, size));
                }
            }
            MediaKind::Text => {
                if text.is_none() {
                    text = Some(path);
                }
            }
            MediaKind::Other => {}
        }
    }
    Ok(Selection {
        image: image.map(|(path, _)| path),
        text,
    })
}

/// Run the content-inspection pass over release-proof records: records that
/// are new and lack scanned content have their archive extracted and their
/// best image handed to the thumbnail generator. A missing file on disk is
/// reported, not fatal; the batch continues.
pub fn process_proofs(catalog: &Catalog, records: &[ProofRecord]) -> Result<usize, Error> {
    let mut handled = 0usize;
    for record in records {
        if !record.is_new() || !record.needs_content_scan() {
            continue;
        }
        let source = catalog.uuid.join(&record.uuid);
        if !source.exists() {
            warn!(
                "record {} ({:?}) has no file on disk at {}",
                record.id,
                record.filename,
                source.display()
            );
            continue;
        }
        debug!(
            "scanning record {} platform {}",
            record.id,
            record.platform.as_deref().unwrap_or("unknown")
        );
        scan_archive(&source)?;
        handled += 1;
    }
    info!("total proofs handled: {}", handled);
    Ok(handled)
}

/// Extract one archive into a scratch directory, pick its best image and
/// text entries, and generate the image set. The scratch directory is
/// exclusively owned here and removed when this scope ends.
pub fn scan_archive(source: &Path) -> Result<(), Error> {
    let scratch = tempfile::tempdir()?;
    extract(source, scratch.path())?;

    let picks = select_candidates(scratch.path())?;
    if let Some(text) = &picks.text {
        info!("text candidate: {}", text.display());
    }
    if let Some(image) = &picks.image {
        thumbs::generate_set(image)?;
    }
    log_dir_listing(scratch.path())?;
    Ok(())
}

fn log_dir_listing(dir: &Path) -> Result<(), Error> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let size = entry.metadata()?.len();
        debug!(
            "> {} {}",
            entry.file_name().to_string_lossy(),
            HumanBytes(size)
        );
    }
    Ok(())
}
