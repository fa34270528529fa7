//! Memory-mapped image reader

use crate::compression;
use crate::config::ReaderConfig;
use crate::error::StorageError;
use crate::Result;
use jimage_formats::{ByteOrder, FormatError, HEADER_SIZE, ImageHeader, IndexView, Location};
use memmap2::{Mmap, MmapOptions};
use serde::Serialize;
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Read-only view of an image file
///
/// The index region is always memory-mapped. The content region is either
/// mapped along with it or, with [`ReaderConfig::map_content`] disabled, read
/// per call with positioned reads. Lookups never mutate shared state, so one
/// reader can serve any number of threads.
#[derive(Debug)]
pub struct ImageReader {
    path: PathBuf,
    file: File,
    map: Mmap,
    header: ImageHeader,
    order: ByteOrder,
    file_size: u64,
    resources: usize,
    content_mapped: bool,
}

/// Outcome of [`ImageReader::verify`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// Resources decoded successfully
    pub resources: usize,
    /// Resources stored compressed
    pub compressed: usize,
    /// Bytes occupied in the content region
    pub stored_bytes: u64,
    /// Bytes after decompression
    pub uncompressed_bytes: u64,
}

impl ImageReader {
    /// Open an image with the default configuration
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &ReaderConfig::default())
    }

    /// Open an image
    ///
    /// Fails with [`FormatError`] when the header is truncated, the magic or
    /// version does not match, or the index region extends past the file.
    pub fn open_with(path: impl AsRef<Path>, config: &ReaderConfig) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();

        let mut prefix = Vec::with_capacity(HEADER_SIZE);
        (&mut file)
            .take(HEADER_SIZE as u64)
            .read_to_end(&mut prefix)?;
        let (header, order) = ImageHeader::read(&prefix)?;

        let index_size = header.index_size();
        if file_size < index_size {
            return Err(FormatError::Truncated {
                segment: "index",
                needed: index_size,
                available: file_size,
            }
            .into());
        }

        let mut options = MmapOptions::new();
        if !config.map_content {
            options.len(usize::try_from(index_size).map_err(io::Error::other)?);
        }

        // The image is never written after it is persisted
        #[allow(unsafe_code)]
        let map = unsafe { options.map(&file)? };
        let resources = IndexView::with_header(header, order, &map)?.len();

        info!(
            "Opened image {} ({} resources, {} byte order, {} bytes)",
            path.display(),
            resources,
            order,
            file_size
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            map,
            header,
            order,
            file_size,
            resources,
            content_mapped: config.map_content,
        })
    }

    fn index(&self) -> Result<IndexView<'_>> {
        Ok(IndexView::with_header(self.header, self.order, &self.map)?)
    }

    /// Path the image was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Image header
    pub fn header(&self) -> &ImageHeader {
        &self.header
    }

    /// Byte order detected from the magic
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Size of the index region; content offsets are relative to its end
    pub fn index_size(&self) -> u64 {
        self.header.index_size()
    }

    /// Size of the content region
    pub fn content_size(&self) -> u64 {
        self.file_size - self.index_size()
    }

    /// Size of the image file
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Number of resources
    pub fn len(&self) -> usize {
        self.resources
    }

    /// Check whether the image holds no resource
    pub fn is_empty(&self) -> bool {
        self.resources == 0
    }

    /// Slots in the index tables, at least the resource count
    pub fn table_size(&self) -> usize {
        self.header.location_count as usize
    }

    /// Look up the location of `name`
    ///
    /// `Ok(None)` when the image has no such resource.
    pub fn find_location(&self, name: &str) -> Result<Option<Location>> {
        Ok(self.index()?.find(name)?)
    }

    /// Full names of every resource, in slot order unless `sorted`
    pub fn list_names(&self, sorted: bool) -> Result<Vec<String>> {
        let mut names = self.index()?.names()?;
        if sorted {
            names.sort_unstable();
        }
        Ok(names)
    }

    /// Every location, in slot order
    pub fn locations(&self) -> Result<Vec<Location>> {
        Ok(self
            .index()?
            .locations()
            .collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Bytes of the resource at `location`, inflated when stored compressed
    pub fn get_resource(&self, location: &Location) -> Result<Vec<u8>> {
        let stored = self.stored_bytes(location)?;

        if !location.is_compressed() {
            return Ok(stored.into_owned());
        }

        let data = compression::decompress(&stored, location.uncompressed_size).map_err(
            |source| StorageError::Decompression {
                name: location.full_name(),
                source,
            },
        )?;
        if data.len() as u64 != location.uncompressed_size {
            return Err(StorageError::Corruption {
                name: location.full_name(),
                expected: location.uncompressed_size,
                actual: data.len() as u64,
            });
        }
        Ok(data)
    }

    /// Look up and read `name` in one step
    pub fn resource(&self, name: &str) -> Result<Option<Vec<u8>>> {
        self.find_location(name)?
            .map(|location| self.get_resource(&location))
            .transpose()
    }

    /// Decode every location and read every resource
    pub fn verify(&self) -> Result<VerifyReport> {
        let mut report = VerifyReport::default();
        for location in self.locations()? {
            let data = self.get_resource(&location)?;
            report.resources += 1;
            report.stored_bytes += location.stored_size();
            report.uncompressed_bytes += data.len() as u64;
            if location.is_compressed() {
                report.compressed += 1;
            }
        }
        debug!(
            "Verified {} resources in {}",
            report.resources,
            self.path.display()
        );
        Ok(report)
    }

    /// Raw bytes of `location` as stored in the content region
    fn stored_bytes(&self, location: &Location) -> Result<Cow<'_, [u8]>> {
        let size = location.stored_size();
        let available = self.content_size();
        let out_of_range = || StorageError::ContentOutOfRange {
            name: location.full_name(),
            offset: location.content_offset,
            size,
            available,
        };

        let end = location
            .content_offset
            .checked_add(size)
            .filter(|&end| end <= available)
            .ok_or_else(out_of_range)?;
        let start = self.index_size() + location.content_offset;

        if self.content_mapped {
            let start = start as usize;
            let end = (self.index_size() + end) as usize;
            return Ok(Cow::Borrowed(&self.map[start..end]));
        }

        let mut buf = vec![0u8; usize::try_from(size).map_err(|_| out_of_range())?];
        read_at(&self.file, &mut buf, start)?;
        Ok(Cow::Owned(buf))
    }
}

#[cfg(unix)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    let mut filled = 0;
    while filled < buf.len() {
        let read = file.seek_read(&mut buf[filled..], offset + filled as u64)?;
        if read == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        filled += read;
    }
    Ok(())
}

#[cfg(not(any(unix, windows)))]
fn read_at(_file: &File, _buf: &mut [u8], _offset: u64) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "positioned reads are not available on this platform",
    ))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use jimage_formats::{IndexBuilder, ResourceName};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_reader_is_send_and_sync() {
        assert_send_sync::<ImageReader>();
    }

    /// Image with one uncompressed resource whose location claims 8 bytes
    /// while the content region holds `content`
    fn image_with_content(content: &[u8]) -> NamedTempFile {
        let name = ResourceName::parse(&"/m/p/C.class".into());
        let mut builder = IndexBuilder::new();
        builder.insert(Location::new(&name, 0, 0, 8)).unwrap();
        let index = builder.build().unwrap();

        let mut file = NamedTempFile::new().unwrap();
        index.write_to(&mut file, ByteOrder::Little).unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_hand_built_image() {
        let file = image_with_content(b"abcdefgh");
        for map_content in [true, false] {
            let config = ReaderConfig::new().with_map_content(map_content);
            let reader = ImageReader::open_with(file.path(), &config).unwrap();
            assert_eq!(reader.len(), 1);
            assert_eq!(reader.content_size(), 8);
            assert_eq!(reader.resource("/m/p/C.class").unwrap().unwrap(), b"abcdefgh");
            assert_eq!(reader.resource("/m/p/D.class").unwrap(), None);
        }
    }

    #[test]
    fn test_oversized_uncompressed_size_is_corruption() {
        let payload = compression::compress(b"class bytes", 6).unwrap();
        let name = ResourceName::parse(&"/m/p/C.class".into());
        let mut builder = IndexBuilder::new();
        builder
            .insert(Location::new(&name, 0, payload.len() as u64, 1 << 50))
            .unwrap();

        let mut file = NamedTempFile::new().unwrap();
        builder
            .build()
            .unwrap()
            .write_to(&mut file, ByteOrder::Little)
            .unwrap();
        file.write_all(&payload).unwrap();
        file.flush().unwrap();

        for map_content in [true, false] {
            let config = ReaderConfig::new().with_map_content(map_content);
            let reader = ImageReader::open_with(file.path(), &config).unwrap();
            let err = reader.resource("/m/p/C.class").unwrap_err();
            assert!(
                matches!(
                    err,
                    StorageError::Corruption {
                        expected: 1_125_899_906_842_624,
                        actual: 11,
                        ..
                    }
                ),
                "{err}"
            );
            assert!(err.is_corruption());
        }
    }

    #[test]
    fn test_content_past_end_of_file() {
        let file = image_with_content(b"abc");
        let reader = ImageReader::open(file.path()).unwrap();
        let location = reader.find_location("/m/p/C.class").unwrap().unwrap();
        let err = reader.get_resource(&location).unwrap_err();
        assert!(matches!(err, StorageError::ContentOutOfRange { size: 8, available: 3, .. }));
        assert!(err.is_corruption());
    }
}
