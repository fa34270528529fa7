//! Exploded module directories

use super::{Archive, ArchiveEntry, EntryKind, EntrySource, EntryVisitor};
use crate::error::BuildError;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Module archive read from a directory tree
///
/// A directory containing `classes/` is treated as an unpacked packaged module:
/// each known section directory (`classes`, `lib`, `bin`, `conf`, `include`,
/// `legal`, `man`) supplies entries of the matching [`EntryKind`] and anything
/// else at the top level is ignored. Any other directory is a plain class tree
/// whose files are all resources.
#[derive(Debug, Clone)]
pub struct DirArchive {
    module: String,
    root: PathBuf,
}

impl DirArchive {
    /// Create an archive for `module` rooted at `root`
    pub fn new(module: impl Into<String>, root: impl AsRef<Path>) -> Self {
        Self {
            module: module.into(),
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Create an archive named after the final component of `root`
    pub fn from_path(root: impl AsRef<Path>) -> Result<Self, BuildError> {
        let root = root.as_ref();
        let module = root
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| BuildError::Archive {
                module: root.display().to_string(),
                reason: "cannot derive a module name from the path".to_string(),
            })?;
        Ok(Self::new(module, root))
    }

    /// Directory the entries are read from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the directory uses packaged module sections
    pub fn has_sections(&self) -> bool {
        self.root.join(EntryKind::ClassOrResource.section()).is_dir()
    }

    fn visit_tree(
        &self,
        base: &Path,
        kind: EntryKind,
        visitor: &mut EntryVisitor<'_>,
    ) -> Result<(), BuildError> {
        for entry in WalkDir::new(base).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = self.entry_path(base, entry.path())?;
            let size = entry.metadata()?.len();
            visitor(ArchiveEntry {
                path,
                kind,
                size,
                source: EntrySource::File(entry.into_path()),
            })?;
        }
        Ok(())
    }

    /// `/` separated path of `file` relative to `base`
    fn entry_path(&self, base: &Path, file: &Path) -> Result<String, BuildError> {
        let relative = file.strip_prefix(base).map_err(|e| BuildError::Archive {
            module: self.module.clone(),
            reason: e.to_string(),
        })?;

        let mut parts = Vec::new();
        for component in relative.components() {
            let part = component.as_os_str().to_str().ok_or_else(|| {
                BuildError::InvalidName(format!("{} (not UTF-8)", file.display()))
            })?;
            parts.push(part);
        }
        Ok(parts.join("/"))
    }
}

impl Archive for DirArchive {
    fn module_name(&self) -> &str {
        &self.module
    }

    fn visit_entries(&self, visitor: &mut EntryVisitor<'_>) -> Result<(), BuildError> {
        if !self.root.is_dir() {
            return Err(BuildError::Archive {
                module: self.module.clone(),
                reason: format!("{} is not a directory", self.root.display()),
            });
        }

        if self.has_sections() {
            debug!("Reading sectioned module {} from {}", self.module, self.root.display());
            for kind in EntryKind::ALL {
                let section = self.root.join(kind.section());
                if section.is_dir() {
                    self.visit_tree(&section, kind, visitor)?;
                }
            }
        } else {
            debug!("Reading module {} from {}", self.module, self.root.display());
            self.visit_tree(&self.root, EntryKind::ClassOrResource, visitor)?;
        }
        Ok(())
    }
}
