//! Image writer merging module archives into one image file

use crate::archive::{Archive, ArchiveEntry};
use crate::compression;
use crate::config::WriterConfig;
use crate::error::BuildError;
use crate::external::{DiscardExternalFiles, ExternalFiles};
use jimage_formats::{ByteOrder, ByteString, IndexBuilder, Location, ResourceName};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Statistics of a finished build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    /// Resources stored in the image
    pub resources: usize,
    /// Later copies of already stored names that were dropped
    pub duplicates: usize,
    /// Entries handed to the external files sink
    pub external_files: usize,
    /// Size of the index region
    pub index_size: u64,
    /// Size of the content region
    pub content_size: u64,
    /// Whether resources were compressed
    pub compressed: bool,
    /// Byte order of the image
    pub byte_order: ByteOrder,
}

/// Builds an image from module archives
///
/// Resources are stored in archive order. A name seen a second time is
/// dropped with a warning and reserves no content bytes. The image is written
/// to a temporary file next to the output and moved into place only once
/// complete, so a failed build leaves nothing at the output path.
pub struct ImageWriter {
    config: WriterConfig,
    archives: Vec<Box<dyn Archive>>,
    external: Box<dyn ExternalFiles>,
}

impl Default for ImageWriter {
    fn default() -> Self {
        Self::new(WriterConfig::default())
    }
}

impl std::fmt::Debug for ImageWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageWriter")
            .field("config", &self.config)
            .field("archives", &self.archives.len())
            .finish_non_exhaustive()
    }
}

/// State threaded through the archive visitors
struct Spool {
    content: BufWriter<File>,
    offset: u64,
    index: IndexBuilder,
    duplicates: usize,
    external_files: usize,
}

impl ImageWriter {
    /// Create a writer; external entries are discarded until a sink is set
    pub fn new(config: WriterConfig) -> Self {
        Self {
            config,
            archives: Vec::new(),
            external: Box::new(DiscardExternalFiles),
        }
    }

    /// Writer configuration
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Queue a module archive
    pub fn add_archive(&mut self, archive: impl Archive + 'static) {
        self.archives.push(Box::new(archive));
    }

    /// Builder form of [`add_archive`](Self::add_archive)
    #[must_use]
    pub fn with_archive(mut self, archive: impl Archive + 'static) -> Self {
        self.add_archive(archive);
        self
    }

    /// Route non-resource entries to `external`
    #[must_use]
    pub fn with_external_files(mut self, external: impl ExternalFiles + 'static) -> Self {
        self.external = Box::new(external);
        self
    }

    /// Write the image to `output`
    pub fn build(mut self, output: impl AsRef<Path>) -> Result<BuildSummary, BuildError> {
        let output = output.as_ref();
        let dir = output
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        info!(
            "Building image {} from {} archives (compress: {}, byte order: {})",
            output.display(),
            self.archives.len(),
            self.config.compress,
            self.config.byte_order
        );

        let mut spool = Spool {
            content: BufWriter::new(tempfile::tempfile_in(dir)?),
            offset: 0,
            index: IndexBuilder::new()
                .with_retry_limit(self.config.retry_limit)
                .with_growth_limit(self.config.growth_limit),
            duplicates: 0,
            external_files: 0,
        };

        for archive in &self.archives {
            let module = archive.module_name();
            debug!("Adding module {}", module);
            archive.visit_entries(&mut |entry| {
                if entry.kind.is_resource() {
                    add_resource(&self.config, &mut spool, module, &entry)
                } else {
                    spool.external_files += 1;
                    self.external.write(module, &entry)
                }
            })?;
        }

        let resources = spool.index.len();
        let content_size = spool.offset;
        let index = spool.index.build()?;
        let mut content = spool.content.into_inner().map_err(io::IntoInnerError::into_error)?;

        let mut image = BufWriter::new(NamedTempFile::new_in(dir)?);
        index.write_to(&mut image, self.config.byte_order)?;
        content.seek(SeekFrom::Start(0))?;
        let copied = io::copy(&mut content, &mut image)?;
        debug_assert_eq!(copied, content_size);
        let image = image.into_inner().map_err(io::IntoInnerError::into_error)?;
        image.as_file().sync_all()?;
        image.persist(output)?;

        let summary = BuildSummary {
            resources,
            duplicates: spool.duplicates,
            external_files: spool.external_files,
            index_size: index.size(),
            content_size,
            compressed: self.config.compress,
            byte_order: self.config.byte_order,
        };
        info!(
            "Wrote {} resources to {} ({} index bytes, {} content bytes, {} duplicates dropped)",
            summary.resources,
            output.display(),
            summary.index_size,
            summary.content_size,
            summary.duplicates
        );
        Ok(summary)
    }
}

/// Full resource name of `path` inside `module`, rejecting names that do not
/// survive splitting into location components
fn resource_name(module: &str, path: &str) -> Result<(ByteString, ResourceName), BuildError> {
    let path = path.trim_start_matches('/');
    if module.is_empty() || module.contains('/') || path.is_empty() {
        return Err(BuildError::InvalidName(format!("/{module}/{path}")));
    }

    let full = ByteString::from(format!("/{module}/{path}"));
    let name = ResourceName::parse(&full);
    if !name.is_canonical(&full) {
        return Err(BuildError::InvalidName(full.to_string_lossy()));
    }
    Ok((full, name))
}

fn add_resource(
    config: &WriterConfig,
    spool: &mut Spool,
    module: &str,
    entry: &ArchiveEntry,
) -> Result<(), BuildError> {
    let (full, name) = resource_name(module, &entry.path)?;
    let full = full.to_string_lossy();

    if spool.index.contains(&full) {
        warn!("Skipping duplicate resource {}", full);
        spool.duplicates += 1;
        return Ok(());
    }

    let (stored, compressed_size) = if config.compress {
        let data = entry.read_all()?;
        let compressed = compression::compress(&data, config.compression_level)?;
        spool.content.write_all(&compressed)?;
        (compressed.len() as u64, compressed.len() as u64)
    } else {
        let mut source = entry.source.open()?.take(entry.size.saturating_add(1));
        let copied = io::copy(&mut source, &mut spool.content)?;
        entry.check_size(copied)?;
        (copied, 0)
    };

    let location = Location::new(&name, spool.offset, compressed_size, entry.size);
    spool.offset += stored;
    spool.index.insert(location)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_names() {
        let (full, name) = resource_name("a", "p/X.class").unwrap();
        assert_eq!(full, "/a/p/X.class");
        assert_eq!(name.parent, "p");

        assert!(resource_name("a", "/p/X.class").is_ok());
        for (module, path) in [("", "X.class"), ("a", ""), ("a/b", "X.class"), ("a", "p//X.class")] {
            assert!(
                matches!(resource_name(module, path), Err(BuildError::InvalidName(_))),
                "{module} {path}"
            );
        }
    }
}
