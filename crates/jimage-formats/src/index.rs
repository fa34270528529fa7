//! Index region: header, redirect and offset tables, location records and
//! strings
//!
//! [`IndexBuilder`] turns the locations collected by the image writer into an
//! [`ImageIndex`] ready to serialize. [`IndexView`] borrows the same layout from
//! a mapped image and answers lookups without copying any table.

use crate::bytestring::ByteString;
use crate::error::{FormatError, FormatResult};
use crate::header::{ByteOrder, ImageHeader};
use crate::location::{Location, LocationAttributes};
use crate::perfect_hash::{PerfectHashBuilder, PerfectHashError, RedirectTable, lookup_slot};
use crate::strings::{StringTable, StringsReader};
use std::collections::HashMap;
use std::io::Write;
use thiserror::Error;

/// Errors raised while building the index region
#[derive(Debug, Error)]
pub enum IndexError {
    /// Perfect hash construction failed
    #[error("perfect hash build failed: {0}")]
    PerfectHash(#[from] PerfectHashError),

    /// A table could not be encoded
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Collects locations and builds the index region
#[derive(Debug, Default)]
pub struct IndexBuilder {
    hash: PerfectHashBuilder<Location>,
}

impl IndexBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of seeds tried per perfect hash bucket
    #[must_use]
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.hash = self.hash.with_retry_limit(retry_limit);
        self
    }

    /// Set how many times the perfect hash table may grow past the key count
    #[must_use]
    pub fn with_growth_limit(mut self, growth_limit: u32) -> Self {
        self.hash = self.hash.with_growth_limit(growth_limit);
        self
    }

    /// Add a location keyed by its full name
    pub fn insert(&mut self, location: Location) -> Result<(), IndexError> {
        let key = ByteString::from(location.full_name());
        self.hash.insert(key, location)?;
        Ok(())
    }

    /// Check whether a location with this full name was added
    pub fn contains(&self, name: &str) -> bool {
        self.hash.contains(&ByteString::from(name))
    }

    /// Number of locations
    pub fn len(&self) -> usize {
        self.hash.len()
    }

    /// Check whether no location was added
    pub fn is_empty(&self) -> bool {
        self.hash.is_empty()
    }

    /// Place every location and encode the tables
    pub fn build(self) -> Result<ImageIndex, IndexError> {
        let (redirect, slots) = self.hash.build()?.into_parts();
        let table_size = redirect.len();

        let mut strings = StringTable::new();
        let mut shared: HashMap<String, u32> = HashMap::new();
        let mut add_string = |s: &str| -> FormatResult<u32> {
            if let Some(&offset) = shared.get(s) {
                return Ok(offset);
            }
            let offset = strings.add(s)?;
            shared.insert(s.to_owned(), offset);
            Ok(offset)
        };

        // Offset 0 holds the empty record and never starts a real one
        let mut locations = LocationAttributes::new().encode();
        let mut offsets = Vec::with_capacity(table_size);
        for slot in slots {
            let Some(entry) = slot else {
                offsets.push(0);
                continue;
            };
            let attributes = entry.value.to_attributes(&mut add_string)?;
            offsets.push(table_offset("locations", locations.len())?);
            attributes.encode_into(&mut locations);
        }
        // Offsets are stored as signed 32-bit values
        if i32::try_from(locations.len()).is_err() {
            return Err(FormatError::TableOverflow {
                table: "locations",
                size: locations.len() as u64,
            }
            .into());
        }
        let locations_size = table_offset("locations", locations.len())?;

        let strings = strings.into_bytes();
        let header = ImageHeader::new(
            table_offset("redirect", table_size)?,
            locations_size,
            table_offset("strings", strings.len())?,
        )?;

        Ok(ImageIndex {
            header,
            redirect,
            offsets,
            locations,
            strings,
        })
    }
}

fn table_offset(table: &'static str, len: usize) -> FormatResult<u32> {
    u32::try_from(len).map_err(|_| FormatError::TableOverflow {
        table,
        size: len as u64,
    })
}

/// Encoded index region, ready to write in front of the content
#[derive(Debug, Clone)]
pub struct ImageIndex {
    header: ImageHeader,
    redirect: Vec<i32>,
    offsets: Vec<u32>,
    locations: Vec<u8>,
    strings: Vec<u8>,
}

impl ImageIndex {
    /// Image header describing the tables
    pub fn header(&self) -> &ImageHeader {
        &self.header
    }

    /// Redirect table
    pub fn redirect(&self) -> &[i32] {
        &self.redirect
    }

    /// Location record offset of every slot
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// Encoded location records
    pub fn location_bytes(&self) -> &[u8] {
        &self.locations
    }

    /// Encoded strings table
    pub fn string_bytes(&self) -> &[u8] {
        &self.strings
    }

    /// Size of the serialized index region in bytes
    pub fn size(&self) -> u64 {
        self.header.index_size()
    }

    /// Serialize the whole index region in `order`
    pub fn write_to<W: Write>(&self, writer: &mut W, order: ByteOrder) -> FormatResult<()> {
        self.header.write_to(writer, order)?;

        let mut table = Vec::with_capacity(self.redirect.len() * 8);
        for &redirect in &self.redirect {
            table.extend_from_slice(&order.i32_bytes(redirect));
        }
        for &offset in &self.offsets {
            // Below i32::MAX, checked in build
            table.extend_from_slice(&order.i32_bytes(offset as i32));
        }
        writer.write_all(&table)?;

        writer.write_all(&self.locations)?;
        writer.write_all(&self.strings)?;
        Ok(())
    }

    /// Serialize into a new buffer
    pub fn to_bytes(&self, order: ByteOrder) -> FormatResult<Vec<u8>> {
        let mut out = Vec::with_capacity(usize::try_from(self.size()).unwrap_or_default());
        self.write_to(&mut out, order)?;
        Ok(out)
    }
}

/// Table of 32-bit integers borrowed from an image in its byte order
#[derive(Debug, Clone, Copy)]
pub struct IntTable<'a> {
    data: &'a [u8],
    order: ByteOrder,
}

impl<'a> IntTable<'a> {
    /// Wrap `data`, whose length must be a multiple of 4
    pub fn new(data: &'a [u8], order: ByteOrder) -> Self {
        Self { data, order }
    }

    /// Value at `index`, `None` past the end
    pub fn get(&self, index: usize) -> Option<i32> {
        let start = index.checked_mul(4)?;
        let bytes = self.data.get(start..start + 4)?;
        Some(
            self.order
                .read_i32([bytes[0], bytes[1], bytes[2], bytes[3]]),
        )
    }

    /// Iterate over every value
    pub fn iter(&self) -> impl Iterator<Item = i32> + use<'a> {
        let order = self.order;
        self.data
            .chunks_exact(4)
            .map(move |b| order.read_i32([b[0], b[1], b[2], b[3]]))
    }
}

impl RedirectTable for IntTable<'_> {
    fn len(&self) -> usize {
        self.data.len() / 4
    }

    fn redirect(&self, index: usize) -> i32 {
        self.get(index).unwrap_or(0)
    }
}

/// Borrowed view over the index region of an image
#[derive(Debug, Clone, Copy)]
pub struct IndexView<'a> {
    header: ImageHeader,
    order: ByteOrder,
    redirect: IntTable<'a>,
    offsets: IntTable<'a>,
    locations: &'a [u8],
    strings: StringsReader<'a>,
}

impl<'a> IndexView<'a> {
    /// Parse the header at the start of `data` and borrow the tables after it
    ///
    /// `data` may extend past the index region; content bytes are ignored.
    pub fn parse(data: &'a [u8]) -> FormatResult<Self> {
        let (header, order) = ImageHeader::read(data)?;
        Self::with_header(header, order, data)
    }

    /// Borrow the tables described by an already validated header
    pub fn with_header(header: ImageHeader, order: ByteOrder, data: &'a [u8]) -> FormatResult<Self> {
        let index_size = header.index_size();
        if (data.len() as u64) < index_size {
            return Err(FormatError::Truncated {
                segment: "index",
                needed: index_size,
                available: data.len() as u64,
            });
        }

        // Bounds were checked against index_size above
        let slice = |start: u64, end: u64| &data[start as usize..end as usize];

        Ok(Self {
            header,
            order,
            redirect: IntTable::new(
                slice(header.redirect_offset(), header.offsets_offset()),
                order,
            ),
            offsets: IntTable::new(
                slice(header.offsets_offset(), header.locations_offset()),
                order,
            ),
            locations: slice(header.locations_offset(), header.strings_offset()),
            strings: StringsReader::new(slice(header.strings_offset(), index_size)),
        })
    }

    /// Image header
    pub fn header(&self) -> &ImageHeader {
        &self.header
    }

    /// Byte order of the image
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Number of slots in the redirect and offset tables
    pub fn table_size(&self) -> usize {
        self.header.location_count as usize
    }

    /// Number of resources, counted over the non-empty slots
    pub fn len(&self) -> usize {
        self.offsets.iter().filter(|&offset| offset != 0).count()
    }

    /// Check whether the image holds no resource
    pub fn is_empty(&self) -> bool {
        self.offsets.iter().all(|offset| offset == 0)
    }

    /// Redirect table
    pub fn redirect(&self) -> IntTable<'a> {
        self.redirect
    }

    /// Location record offsets, one per slot
    pub fn offsets(&self) -> IntTable<'a> {
        self.offsets
    }

    /// Strings table
    pub fn strings(&self) -> StringsReader<'a> {
        self.strings
    }

    /// Look up the location stored under the full name `name`
    ///
    /// A name outside the image can land on any slot, so the candidate is
    /// compared against `name` before it is returned.
    pub fn find(&self, name: &str) -> FormatResult<Option<Location>> {
        let Some(slot) = lookup_slot(&self.redirect, name.as_bytes()) else {
            return Ok(None);
        };
        let Some(offset) = self.offsets.get(slot) else {
            return Ok(None);
        };
        if offset == 0 {
            return Ok(None);
        }

        let location = self.location_at(offset as u32)?;
        Ok(location.matches(name).then_some(location))
    }

    /// Decode the location record at `offset` in the location table
    pub fn location_at(&self, offset: u32) -> FormatResult<Location> {
        let start = offset as usize;
        if start == 0 || start >= self.locations.len() {
            return Err(FormatError::LocationOffsetOutOfRange(offset));
        }

        let attributes = LocationAttributes::decode(self.locations, start)?;
        Location::from_attributes(&attributes, &self.strings)
    }

    /// Iterate over every location in slot order
    pub fn locations(&self) -> impl Iterator<Item = FormatResult<Location>> + use<'a> {
        let view = *self;
        self.offsets
            .iter()
            .filter(|&offset| offset != 0)
            .map(move |offset| view.location_at(offset as u32))
    }

    /// Full names of every resource in slot order
    pub fn names(&self) -> FormatResult<Vec<String>> {
        self.locations()
            .map(|location| location.map(|l| l.full_name()))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::location::ResourceName;
    use pretty_assertions::assert_eq;

    fn location(name: &str, offset: u64, size: u64) -> Location {
        Location::new(&ResourceName::parse(&ByteString::from(name)), offset, 0, size)
    }

    fn build(names: &[&str]) -> ImageIndex {
        let mut builder = IndexBuilder::new();
        let mut offset = 0;
        for (i, name) in names.iter().enumerate() {
            let size = (i as u64 + 1) * 10;
            builder.insert(location(name, offset, size)).unwrap();
            offset += size;
        }
        builder.build().unwrap()
    }

    const NAMES: [&str; 3] = ["/a/p/X.class", "/a/p/Y.class", "/b/q/Z.txt"];

    #[test]
    fn test_find_in_both_byte_orders() {
        let index = build(&NAMES);
        for order in [ByteOrder::Little, ByteOrder::Big] {
            let bytes = index.to_bytes(order).unwrap();
            assert_eq!(bytes.len() as u64, index.size());

            let view = IndexView::parse(&bytes).unwrap();
            assert_eq!(view.byte_order(), order);
            assert_eq!(view.len(), 3);

            let x = view.find("/a/p/X.class").unwrap().unwrap();
            assert_eq!(x.uncompressed_size, 10);
            assert_eq!(x.content_offset, 0);
            let y = view.find("/a/p/Y.class").unwrap().unwrap();
            assert_eq!(y.uncompressed_size, 20);
            assert_eq!(y.content_offset, 10);
            let z = view.find("/b/q/Z.txt").unwrap().unwrap();
            assert_eq!(z.module, "b");
            assert_eq!(z.extension, "txt");

            assert_eq!(view.find("/missing").unwrap(), None);
            assert_eq!(view.find("/a/p/X.clas").unwrap(), None);
        }
    }

    #[test]
    fn test_names_cover_every_resource() {
        let index = build(&NAMES);
        let bytes = index.to_bytes(ByteOrder::native()).unwrap();
        let view = IndexView::parse(&bytes).unwrap();

        let mut names = view.names().unwrap();
        names.sort();
        assert_eq!(names, NAMES.to_vec());
    }

    #[test]
    fn test_grown_table_leaves_empty_slots() {
        let names = ["/a/p/X.class", "/a/p/Y.class", "/b/q/Z.txt", "/b/q/W.txt"];
        let index = build(&names);
        assert_eq!(index.header().location_count, 5);
        assert_eq!(index.offsets().iter().filter(|&&o| o == 0).count(), 1);

        let bytes = index.to_bytes(ByteOrder::Big).unwrap();
        let view = IndexView::parse(&bytes).unwrap();
        assert_eq!(view.table_size(), 5);
        assert_eq!(view.len(), 4);
        for (i, name) in names.iter().enumerate() {
            let location = view.find(name).unwrap().unwrap();
            assert_eq!(location.uncompressed_size, (i as u64 + 1) * 10);
        }
        assert_eq!(view.names().unwrap().len(), 4);
        assert_eq!(view.find("/b/q/V.txt").unwrap(), None);
    }

    #[test]
    fn test_empty_index() {
        let index = IndexBuilder::new().build().unwrap();
        assert_eq!(index.header().location_count, 0);
        // Empty record plus the empty string
        assert_eq!(index.location_bytes(), &[0]);
        assert_eq!(index.string_bytes(), &[0]);

        let bytes = index.to_bytes(ByteOrder::Big).unwrap();
        let view = IndexView::parse(&bytes).unwrap();
        assert!(view.is_empty());
        assert_eq!(view.find("/anything").unwrap(), None);
        assert!(view.names().unwrap().is_empty());
    }

    #[test]
    fn test_strings_shared_between_records() {
        let index = build(&NAMES);
        let strings = StringsReader::new(index.string_bytes());

        // Module "a" and parent "p" of X and Y are stored once
        let mut seen = Vec::new();
        let mut offset = 2u32;
        while (offset as usize) < index.string_bytes().len() {
            let s = strings.get(offset).unwrap();
            let len = s.len() as u32 + 1;
            seen.push(s);
            offset += len + (offset + len) % 2;
        }
        seen.sort();
        assert_eq!(seen, vec!["X", "Y", "Z", "a", "b", "class", "p", "q", "txt"]);
    }

    #[test]
    fn test_location_offset_zero_is_never_a_record() {
        let index = build(&NAMES);
        assert!(index.offsets().iter().all(|&offset| offset != 0));

        let bytes = index.to_bytes(ByteOrder::Little).unwrap();
        let view = IndexView::parse(&bytes).unwrap();
        assert!(matches!(
            view.location_at(0),
            Err(FormatError::LocationOffsetOutOfRange(0))
        ));
        assert!(matches!(
            view.location_at(10_000),
            Err(FormatError::LocationOffsetOutOfRange(10_000))
        ));
    }

    #[test]
    fn test_truncated_index_rejected() {
        let bytes = build(&NAMES).to_bytes(ByteOrder::Little).unwrap();
        assert!(matches!(
            IndexView::parse(&bytes[..bytes.len() - 1]),
            Err(FormatError::Truncated {
                segment: "index",
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_location_rejected() {
        let mut builder = IndexBuilder::new();
        builder.insert(location("/a/p/X.class", 0, 1)).unwrap();
        assert!(builder.contains("/a/p/X.class"));
        assert!(matches!(
            builder.insert(location("/a/p/X.class", 1, 1)),
            Err(IndexError::PerfectHash(PerfectHashError::DuplicateKey(_)))
        ));
    }
}
