//! Location records
//!
//! A location describes one stored resource: the four name components and
//! where its bytes live in the content region. On disk it is a packed record
//! of [`LocationAttributes`] whose name attributes are strings table offsets.

mod attribute;
mod name;

pub use attribute::{AttributeKind, LocationAttributes};
pub use name::ResourceName;

use crate::error::FormatResult;
use crate::strings::StringsReader;
use serde::Serialize;

/// Decoded location of one resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    /// Module name
    pub module: String,
    /// Parent directory inside the module
    pub parent: String,
    /// Base file name
    pub base: String,
    /// Extension without the dot
    pub extension: String,
    /// Offset of the stored bytes relative to the start of the content region
    pub content_offset: u64,
    /// Stored size when compressed, 0 when stored as is
    pub compressed_size: u64,
    /// Size of the resource bytes
    pub uncompressed_size: u64,
}

impl Location {
    /// Create a location for `name` with the given placement
    pub fn new(
        name: &ResourceName,
        content_offset: u64,
        compressed_size: u64,
        uncompressed_size: u64,
    ) -> Self {
        Self {
            module: name.module.to_string_lossy(),
            parent: name.parent.to_string_lossy(),
            base: name.base.to_string_lossy(),
            extension: name.extension.to_string_lossy(),
            content_offset,
            compressed_size,
            uncompressed_size,
        }
    }

    /// Whether the stored bytes need inflating
    pub fn is_compressed(&self) -> bool {
        self.compressed_size != 0
    }

    /// Number of bytes occupied in the content region
    pub fn stored_size(&self) -> u64 {
        if self.is_compressed() {
            self.compressed_size
        } else {
            self.uncompressed_size
        }
    }

    /// Reassemble `/module/parent/base.extension`
    pub fn full_name(&self) -> String {
        let mut buf = Vec::with_capacity(
            self.module.len() + self.parent.len() + self.base.len() + self.extension.len() + 4,
        );
        name::write_full_name(
            &mut buf,
            self.module.as_bytes(),
            self.parent.as_bytes(),
            self.base.as_bytes(),
            self.extension.as_bytes(),
        );
        // Only ASCII separators were inserted between valid UTF-8 parts
        String::from_utf8(buf).unwrap_or_default()
    }

    /// Compare against a full name without building it
    pub fn matches(&self, name: &str) -> bool {
        let mut rest = name;

        if !self.module.is_empty() {
            let Some(tail) = rest
                .strip_prefix('/')
                .and_then(|r| r.strip_prefix(self.module.as_str()))
                .and_then(|r| r.strip_prefix('/'))
            else {
                return false;
            };
            rest = tail;
        }

        if !self.parent.is_empty() {
            let Some(tail) = rest
                .strip_prefix(self.parent.as_str())
                .and_then(|r| r.strip_prefix('/'))
            else {
                return false;
            };
            rest = tail;
        }

        let Some(tail) = rest.strip_prefix(self.base.as_str()) else {
            return false;
        };
        rest = tail;

        if !self.extension.is_empty() {
            let Some(tail) = rest
                .strip_prefix('.')
                .and_then(|r| r.strip_prefix(self.extension.as_str()))
            else {
                return false;
            };
            rest = tail;
        }

        rest.is_empty()
    }

    /// Decode from raw attributes, resolving name offsets through `strings`
    pub fn from_attributes(
        attributes: &LocationAttributes,
        strings: &StringsReader<'_>,
    ) -> FormatResult<Self> {
        // Offsets past u32 cannot be valid and fail the range check
        let string = |kind: AttributeKind| -> FormatResult<String> {
            strings.get(u32::try_from(attributes.get(kind)).unwrap_or(u32::MAX))
        };

        Ok(Self {
            module: string(AttributeKind::Module)?,
            parent: string(AttributeKind::Parent)?,
            base: string(AttributeKind::Base)?,
            extension: string(AttributeKind::Extension)?,
            content_offset: attributes.get(AttributeKind::Offset),
            compressed_size: attributes.get(AttributeKind::Compressed),
            uncompressed_size: attributes.get(AttributeKind::Uncompressed),
        })
    }

    /// Encode into raw attributes
    ///
    /// `add_string` stores a name component and returns its strings table
    /// offset, usually by calling [`crate::strings::StringTable::add`].
    pub fn to_attributes(
        &self,
        mut add_string: impl FnMut(&str) -> FormatResult<u32>,
    ) -> FormatResult<LocationAttributes> {
        Ok(LocationAttributes::new()
            .with(AttributeKind::Module, u64::from(add_string(&self.module)?))
            .with(AttributeKind::Parent, u64::from(add_string(&self.parent)?))
            .with(AttributeKind::Base, u64::from(add_string(&self.base)?))
            .with(
                AttributeKind::Extension,
                u64::from(add_string(&self.extension)?),
            )
            .with(AttributeKind::Offset, self.content_offset)
            .with(AttributeKind::Compressed, self.compressed_size)
            .with(AttributeKind::Uncompressed, self.uncompressed_size))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::bytestring::ByteString;
    use crate::strings::StringTable;
    use pretty_assertions::assert_eq;

    fn location(name: &str) -> Location {
        Location::new(&ResourceName::parse(&ByteString::from(name)), 40, 0, 10)
    }

    #[test]
    fn test_full_name_and_matches() {
        for name in [
            "/java.base/java/lang/Object.class",
            "/java.base/module-info.class",
            "/m/p/README",
            "/m/.hidden",
            "top/level.txt",
            "plain",
        ] {
            let loc = location(name);
            assert_eq!(loc.full_name(), name);
            assert!(loc.matches(name), "{name} should match");
        }
    }

    #[test]
    fn test_matches_rejects_near_misses() {
        let loc = location("/a/p/X.class");
        assert!(!loc.matches("/a/p/X.clas"));
        assert!(!loc.matches("/a/p/X.classes"));
        assert!(!loc.matches("/a/p/Y.class"));
        assert!(!loc.matches("/b/p/X.class"));
        assert!(!loc.matches("a/p/X.class"));
        assert!(!loc.matches("/a/X.class"));
        assert!(!loc.matches(""));
    }

    #[test]
    fn test_stored_size() {
        let mut loc = location("/a/p/X.class");
        assert!(!loc.is_compressed());
        assert_eq!(loc.stored_size(), 10);

        loc.compressed_size = 7;
        assert!(loc.is_compressed());
        assert_eq!(loc.stored_size(), 7);
    }

    #[test]
    fn test_attributes_round_trip_through_strings() {
        let loc = Location {
            compressed_size: 12,
            uncompressed_size: 300,
            content_offset: 1 << 40,
            ..location("/java.desktop/java/awt/Component\u{e9}.class")
        };

        let mut strings = StringTable::new();
        let attrs = loc.to_attributes(|s| strings.add(s)).unwrap();
        let encoded = attrs.encode();

        let decoded = LocationAttributes::decode(&encoded, 0).unwrap();
        let bytes = strings.into_bytes();
        let reader = StringsReader::new(&bytes);
        assert_eq!(Location::from_attributes(&decoded, &reader).unwrap(), loc);
    }

    #[test]
    fn test_empty_components_use_offset_zero() {
        let loc = location("plain");
        let mut strings = StringTable::new();
        let attrs = loc.to_attributes(|s| strings.add(s)).unwrap();

        assert_eq!(attrs.get(AttributeKind::Module), 0);
        assert_eq!(attrs.get(AttributeKind::Parent), 0);
        assert_eq!(attrs.get(AttributeKind::Extension), 0);
        assert_ne!(attrs.get(AttributeKind::Base), 0);
    }
}
