use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Error;

/// Filename of the all-zero sentinel placeholder, never treated as an orphan.
pub const SENTINEL: &str = "00000000-0000-0000-0000-000000000000";

/// Characters used for placeholder file content.
const PLACEHOLDER_CHARSET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0987654321 .!?";

/// A logical category of stored files, each mapped to one directory under
/// the base root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// File downloads named by their UUID.
    Uuid,
    /// Emulation assets, extracted text captures.
    Emulation,
    /// Emulation assets, zipped filesystems and cores.
    EmulationZip,
    /// Webapp generated JSON files.
    Json,
    /// 150x150 squared thumbnails.
    Img150,
    /// 400x400 squared thumbnails.
    Img400,
    /// Screen captures and previews.
    Capture,
    /// Description images.
    Description,
    /// Information images.
    Information,
    /// Preview images.
    Preview,
    /// Backup archives of previously removed files.
    Backup,
}

impl Role {
    pub const ALL: [Role; 11] = [
        Role::Uuid,
        Role::Emulation,
        Role::EmulationZip,
        Role::Json,
        Role::Img150,
        Role::Img400,
        Role::Capture,
        Role::Description,
        Role::Information,
        Role::Preview,
        Role::Backup,
    ];

    /// Relative path of this role under the base root.
    pub fn suffix(self) -> &'static str {
        match self {
            Role::Uuid => "uuid",
            Role::Emulation => "files/emularity",
            Role::EmulationZip => "files/emularity.zip",
            Role::Json => "files/json",
            Role::Img150 => "images/150x",
            Role::Img400 => "images/400x",
            Role::Capture => "images/screencapture",
            Role::Description => "images/description",
            Role::Information => "images/information",
            Role::Preview => "images/preview",
            Role::Backup => "files/backups",
        }
    }

    /// Archive label for roles that warrant a backup before deletion.
    /// Roles returning `None` are deleted without an archival pass.
    pub fn backup_label(self) -> Option<&'static str> {
        match self {
            Role::Uuid => Some("uuid"),
            Role::Img150 => Some("img-150xthumbs"),
            Role::Img400 => Some("img-400xthumbs"),
            Role::Capture => Some("img-captures"),
            Role::Description => Some("img-desc"),
            Role::Information => Some("img-info"),
            Role::Preview => Some("img-prev"),
            _ => None,
        }
    }
}

/// Resolved directory paths for every role, computed once at startup and
/// immutable for the run.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub uuid: PathBuf,
    pub emulation: PathBuf,
    pub emulation_zip: PathBuf,
    pub json: PathBuf,
    pub img_150: PathBuf,
    pub img_400: PathBuf,
    pub capture: PathBuf,
    pub description: PathBuf,
    pub information: PathBuf,
    pub preview: PathBuf,
    pub backup: PathBuf,
}

impl Catalog {
    pub fn resolve(base: &Path) -> Self {
        Catalog {
            uuid: base.join(Role::Uuid.suffix()),
            emulation: base.join(Role::Emulation.suffix()),
            emulation_zip: base.join(Role::EmulationZip.suffix()),
            json: base.join(Role::Json.suffix()),
            img_150: base.join(Role::Img150.suffix()),
            img_400: base.join(Role::Img400.suffix()),
            capture: base.join(Role::Capture.suffix()),
            description: base.join(Role::Description.suffix()),
            information: base.join(Role::Information.suffix()),
            preview: base.join(Role::Preview.suffix()),
            backup: base.join(Role::Backup.suffix()),
        }
    }

    pub fn path(&self, role: Role) -> &Path {
        match role {
            Role::Uuid => &self.uuid,
            Role::Emulation => &self.emulation,
            Role::EmulationZip => &self.emulation_zip,
            Role::Json => &self.json,
            Role::Img150 => &self.img_150,
            Role::Img400 => &self.img_400,
            Role::Capture => &self.capture,
            Role::Description => &self.description,
            Role::Information => &self.information,
            Role::Preview => &self.preview,
            Role::Backup => &self.backup,
        }
    }

    /// Create every catalog directory. Existing directories are left alone.
    pub fn create(&self) -> Result<(), Error> {
        for role in Role::ALL {
            fs::create_dir_all(self.path(role))?;
        }
        Ok(())
    }

    /// Provision deterministic placeholder files for testing or initial
    /// setup. Existing placeholders are never overwritten.
    pub fn provision_placeholders(&self) -> Result<(), Error> {
        create_holder_files(&self.uuid, 1_000_000, 9)?;
        create_holder_files(&self.emulation_zip, 1_000_000, 2)?;
        create_holder_files(&self.capture, 1_000_000, 9)?;
        create_holder_files(&self.img_400, 500_000, 9)?;
        create_holder_files(&self.img_150, 100_000, 9)?;
        Ok(())
    }
}

/// Generate placeholder files named with trailing digits `0..=number` in the
/// given directory, each filled with `size` bytes of random printable text.
pub fn create_holder_files(dir: &Path, size: usize, number: u32) -> Result<(), Error> {
    if number > 9 {
        return Err(Error::InvalidPrefix(number));
    }
    for digit in 0..=number {
        create_holder_file(dir, size, digit)?;
    }
    Ok(())
}

fn create_holder_file(dir: &Path, size: usize, prefix: u32) -> Result<(), Error> {
    if prefix > 9 {
        return Err(Error::InvalidPrefix(prefix));
    }
    let name = format!("00000000-0000-0000-0000-00000000000{}", prefix);
    let path = dir.join(&name);
    if path.exists() {
        return Ok(()); // don't overwrite existing files
    }
    debug!("creating placeholder {}", path.display());
    fs::write(&path, random_text(size))?;
    Ok(())
}

fn random_text(n: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    (0..n)
        .map(|_| PLACEHOLDER_CHARSET[rng.random_range(0..PLACEHOLDER_CHARSET.len())])
        .collect()
}
