//! Sinks for entries that are not stored in the image

use crate::archive::{ArchiveEntry, EntryKind};
use crate::error::BuildError;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Receives native libraries, commands, configuration and other entries
/// that live next to the image rather than inside it
pub trait ExternalFiles {
    /// Handle one entry of `module`
    fn write(&mut self, module: &str, entry: &ArchiveEntry) -> Result<(), BuildError>;
}

/// Drops every external entry
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardExternalFiles;

impl ExternalFiles for DiscardExternalFiles {
    fn write(&mut self, module: &str, entry: &ArchiveEntry) -> Result<(), BuildError> {
        debug!("Discarding {:?} entry {}/{}", entry.kind, module, entry.path);
        Ok(())
    }
}

/// Extracts external entries into a runtime directory layout
///
/// ```text
/// bin/<path>              native commands
/// lib/<path>              native libraries
/// conf/<path>             configuration
/// include/<path>          header files
/// legal/<module>/<path>   legal notices
/// man/<path>              manual pages
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryExternalFiles {
    root: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectoryExternalFiles {
    /// Extract under `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            written: Vec::new(),
        }
    }

    /// Output root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files written so far
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Destination of `entry` from `module`
    pub fn destination(&self, module: &str, entry: &ArchiveEntry) -> Result<PathBuf, BuildError> {
        let relative = Path::new(&entry.path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(BuildError::InvalidName(format!("{module}/{}", entry.path)));
        }

        let mut path = self.root.join(entry.kind.section());
        if entry.kind == EntryKind::LegalNotice {
            path.push(module);
        }
        path.push(relative);
        Ok(path)
    }
}

impl ExternalFiles for DirectoryExternalFiles {
    fn write(&mut self, module: &str, entry: &ArchiveEntry) -> Result<(), BuildError> {
        let path = self.destination(module, entry)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = BufWriter::new(File::create(&path)?);
        let copied = io::copy(
            &mut entry.source.open()?.take(entry.size.saturating_add(1)),
            &mut out,
        )?;
        out.flush()?;
        entry.check_size(copied)?;

        #[cfg(unix)]
        if entry.kind == EntryKind::NativeCommand {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        }

        debug!("Extracted {}/{} to {}", module, entry.path, path.display());
        self.written.push(path);
        Ok(())
    }
}
