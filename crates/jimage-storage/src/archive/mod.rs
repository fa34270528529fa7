//! Archive sources feeding the image writer
//!
//! An [`Archive`] yields the entries of one module. Class files and resources
//! are stored in the image; every other [`EntryKind`] is routed to an
//! [`ExternalFiles`](crate::ExternalFiles) sink.

mod dir;
mod memory;

pub use dir::DirArchive;
pub use memory::MemoryArchive;

use crate::error::BuildError;
use bytes::Bytes;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

/// Kind of an archive entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Class file or resource, stored in the image
    ClassOrResource,
    /// Shared library
    NativeLibrary,
    /// Executable
    NativeCommand,
    /// Configuration file
    Config,
    /// C header file
    HeaderFile,
    /// License or notice file
    LegalNotice,
    /// Manual page
    ManPage,
}

impl EntryKind {
    /// Every kind, in section order
    pub const ALL: [Self; 7] = [
        Self::ClassOrResource,
        Self::NativeLibrary,
        Self::NativeCommand,
        Self::Config,
        Self::HeaderFile,
        Self::LegalNotice,
        Self::ManPage,
    ];

    /// Name of the packaged module section holding this kind
    pub const fn section(self) -> &'static str {
        match self {
            Self::ClassOrResource => "classes",
            Self::NativeLibrary => "lib",
            Self::NativeCommand => "bin",
            Self::Config => "conf",
            Self::HeaderFile => "include",
            Self::LegalNotice => "legal",
            Self::ManPage => "man",
        }
    }

    /// Kind stored under a section directory
    pub fn from_section(section: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.section() == section)
    }

    /// Whether entries of this kind go into the image
    pub const fn is_resource(self) -> bool {
        matches!(self, Self::ClassOrResource)
    }
}

/// Where the bytes of an entry come from
#[derive(Debug, Clone)]
pub enum EntrySource {
    /// Bytes held in memory
    Memory(Bytes),
    /// File on disk, read when the entry is consumed
    File(PathBuf),
}

impl EntrySource {
    /// Open a reader over the entry bytes
    pub fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        match self {
            Self::Memory(bytes) => Ok(Box::new(&bytes[..])),
            Self::File(path) => Ok(Box::new(File::open(path)?)),
        }
    }
}

/// One entry of a module archive
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Path inside the module, `/` separated, without a leading `/`
    pub path: String,
    /// Entry kind
    pub kind: EntryKind,
    /// Declared size in bytes
    pub size: u64,
    /// Entry bytes
    pub source: EntrySource,
}

impl ArchiveEntry {
    /// Create an entry backed by in-memory bytes
    pub fn from_bytes(path: impl Into<String>, kind: EntryKind, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            path: path.into(),
            kind,
            size: data.len() as u64,
            source: EntrySource::Memory(data),
        }
    }

    /// Read the entry bytes, checking them against the declared size
    pub fn read_all(&self) -> Result<Vec<u8>, BuildError> {
        let mut data = Vec::with_capacity(usize::try_from(self.size).unwrap_or(0));
        self.source
            .open()?
            .take(self.size.saturating_add(1))
            .read_to_end(&mut data)?;
        self.check_size(data.len() as u64)?;
        Ok(data)
    }

    pub(crate) fn check_size(&self, actual: u64) -> Result<(), BuildError> {
        if actual == self.size {
            Ok(())
        } else {
            Err(BuildError::SizeMismatch {
                path: self.path.clone(),
                declared: self.size,
                actual,
            })
        }
    }
}

/// Visitor receiving archive entries
pub type EntryVisitor<'a> = dyn FnMut(ArchiveEntry) -> Result<(), BuildError> + 'a;

/// A module archive readable by the image writer
pub trait Archive {
    /// Name of the module the entries belong to
    fn module_name(&self) -> &str;

    /// Pass every entry to `visitor`, stopping at the first error
    fn visit_entries(&self, visitor: &mut EntryVisitor<'_>) -> Result<(), BuildError>;
}
