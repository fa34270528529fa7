//! In-memory module archives

use super::{Archive, ArchiveEntry, EntryKind, EntryVisitor};
use crate::error::BuildError;
use bytes::Bytes;

/// Module archive whose entries are held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    module: String,
    entries: Vec<ArchiveEntry>,
}

impl MemoryArchive {
    /// Create an empty archive for `module`
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            entries: Vec::new(),
        }
    }

    /// Add a class file or resource
    #[must_use]
    pub fn with_resource(self, path: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.with_entry(path, EntryKind::ClassOrResource, data)
    }

    /// Add an entry of any kind
    #[must_use]
    pub fn with_entry(
        mut self,
        path: impl Into<String>,
        kind: EntryKind,
        data: impl Into<Bytes>,
    ) -> Self {
        self.push(ArchiveEntry::from_bytes(path, kind, data));
        self
    }

    /// Append a prepared entry
    pub fn push(&mut self, entry: ArchiveEntry) {
        self.entries.push(entry);
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the archive has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Archive for MemoryArchive {
    fn module_name(&self) -> &str {
        &self.module
    }

    fn visit_entries(&self, visitor: &mut EntryVisitor<'_>) -> Result<(), BuildError> {
        for entry in &self.entries {
            visitor(entry.clone())?;
        }
        Ok(())
    }
}
