use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ini::{Ini, Properties};
use tracing::{debug, info, warn};

use crate::error::{AwsxError, Result};
use crate::paths::Paths;

pub mod section;

#[cfg(test)]
pub(crate) mod memory;

/// Section-name to key/value mapping of one store, in file order.
pub type Sections = Ini;

pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum StoreKind {
    /// `~/.aws/config`: region, output and role assumption.
    AwsConfig,
    /// `~/.aws/credentials`: access keys and session tokens.
    AwsCredentials,
    /// `~/.awsx/profiles`: MFA settings, login timestamps and key-age policy.
    Metadata,
}

impl StoreKind {
    pub const ALL: [StoreKind; 3] = [
        StoreKind::AwsConfig,
        StoreKind::AwsCredentials,
        StoreKind::Metadata,
    ];
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreKind::AwsConfig => "AWS config",
            StoreKind::AwsCredentials => "AWS credentials",
            StoreKind::Metadata => "awsx profiles",
        };
        f.write_str(name)
    }
}

/// Whole-file access to the three profile stores.
///
/// Every mutation is a read-modify-write of a full mapping; there is no locking
/// between concurrent invocations, so the last writer wins.
pub trait ProfileStore {
    /// Reads a store. Missing or malformed files yield an empty mapping.
    fn read_store(&self, kind: StoreKind) -> Sections;

    /// Replaces a store with `sections`.
    fn write_store(&self, kind: StoreKind, sections: &Sections) -> Result<()>;
}

/// Looks up a section by exact name, ignoring the unnamed general section.
pub fn section<'a>(sections: &'a Sections, name: &str) -> Option<&'a Properties> {
    sections.section(Some(name))
}

/// Iterates named sections in file order.
pub fn named_sections(sections: &Sections) -> impl Iterator<Item = (&str, &Properties)> {
    sections
        .iter()
        .filter_map(|(name, props)| name.map(|n| (n, props)))
}

/// Replaces (or creates) `name` with exactly `entries`, dropping empty values.
pub fn replace_section<'a, I>(sections: &mut Sections, name: &str, entries: I)
where
    I: IntoIterator<Item = (&'a str, Option<String>)>,
{
    sections.delete(Some(name));
    let mut setter = sections.with_section(Some(name));
    for (key, value) in entries {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            setter.set(key, value);
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileStore {
    paths: Paths,
}

impl FileStore {
    pub fn new(paths: Paths) -> FileStore {
        FileStore { paths }
    }

    pub fn path_for(&self, kind: StoreKind) -> PathBuf {
        match kind {
            StoreKind::AwsConfig => self.paths.aws_config.clone(),
            StoreKind::AwsCredentials => self.paths.aws_credentials.clone(),
            StoreKind::Metadata => self.paths.awsx_profiles(),
        }
    }

    /// Fails unless both AWS files exist. Every command requires them.
    pub fn require_aws_files_present(&self) -> Result<()> {
        let missing = [StoreKind::AwsConfig, StoreKind::AwsCredentials]
            .into_iter()
            .map(|kind| self.path_for(kind))
            .filter(|path| !path.exists())
            .collect::<Vec<_>>();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AwsxError::ConfigurationMissing { missing })
        }
    }

    /// Creates the AWS and awsx home directories when missing.
    ///
    /// The first time the awsx home is created every existing store is backed
    /// up. Returns whether this was the first run.
    pub fn ensure_initialized(&self, now: DateTime<Utc>) -> Result<bool> {
        if let Some(aws_home) = self.paths.aws_home() {
            if !aws_home.exists() {
                fs::create_dir_all(aws_home)?;
                debug!("created {}", aws_home.display());
            }
        }

        if self.paths.awsx_home.exists() {
            return Ok(false);
        }

        fs::create_dir_all(&self.paths.awsx_home)?;
        info!("created {}", self.paths.awsx_home.display());
        self.backup_all(now)?;
        Ok(true)
    }

    /// Copies every existing store next to itself with a `.YYYYMMDDHHMMSS` suffix.
    ///
    /// Absent stores are skipped. Two calls within the same second write the
    /// same backup paths.
    pub fn backup_all(&self, now: DateTime<Utc>) -> Result<Vec<PathBuf>> {
        let suffix = now.format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut written = Vec::new();
        for kind in StoreKind::ALL {
            let source = self.path_for(kind);
            if !source.exists() {
                debug!("skip backup of {}: not found", source.display());
                continue;
            }

            let target = with_suffix(&source, &suffix);
            fs::copy(&source, &target)?;
            info!("backed up {} to {}", source.display(), target.display());
            written.push(target);
        }

        Ok(written)
    }
}

impl ProfileStore for FileStore {
    fn read_store(&self, kind: StoreKind) -> Sections {
        let path = self.path_for(kind);
        if !path.exists() {
            debug!("{} store not found at {}", kind, path.display());
            return Sections::new();
        }

        match Ini::load_from_file(&path) {
            Ok(sections) => sections,
            Err(e) => {
                warn!("ignoring malformed {} store {}: {}", kind, path.display(), e);
                Sections::new()
            }
        }
    }

    fn write_store(&self, kind: StoreKind, sections: &Sections) -> Result<()> {
        let path = self.path_for(kind);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Staged beside the target, then renamed over it.
        let staging = with_suffix(&path, "awsx-tmp");
        sections.write_to_file(&staging)?;
        restrict_permissions(&staging)?;
        fs::rename(&staging, &path)?;

        debug!("wrote {} store {}", kind, path.display());
        Ok(())
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Makes `path` readable and writable by its owner only.
#[cfg(unix)]
pub(crate) fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(0o600);
    fs::set_permissions(path, permissions)?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
