//! Splitting resource names into location components

use crate::bytestring::ByteString;
use std::fmt;

/// A full resource name split into its four components
///
/// `/java.base/java/lang/Object.class` splits into module `java.base`,
/// parent `java/lang`, base `Object` and extension `class`. Components share
/// the buffer of the name they were parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceName {
    /// Module name, empty for names outside any module
    pub module: ByteString,
    /// Directory path inside the module, without leading or trailing `/`
    pub parent: ByteString,
    /// File name without extension
    pub base: ByteString,
    /// Extension without the dot
    pub extension: ByteString,
}

impl ResourceName {
    /// Split a full name
    ///
    /// A leading `/` followed by a second `/` delimits the module. The last
    /// `/` of the remainder separates parent from base, and the last `.` of the
    /// base (unless it is the final character) separates the extension.
    pub fn parse(name: &ByteString) -> Self {
        let mut start = 0;
        let mut module = ByteString::default();

        if name.as_bytes().first() == Some(&b'/')
            && let Some(end) = name.index_of(b'/', 1)
        {
            module = name.substring(1..end);
            start = end + 1;
        }

        let rest = name.substring(start..);
        let (parent, file) = match rest.last_index_of(b'/') {
            Some(slash) => (rest.substring(..slash), rest.substring(slash + 1..)),
            None => (ByteString::default(), rest),
        };

        let (base, extension) = match file.last_index_of(b'.') {
            Some(dot) if dot + 1 < file.len() => (file.substring(..dot), file.substring(dot + 1..)),
            _ => (file, ByteString::default()),
        };

        Self {
            module,
            parent,
            base,
            extension,
        }
    }

    /// Build the full name for `path` inside `module`
    pub fn from_module_path(module: &str, path: &str) -> Self {
        let path = path.trim_start_matches('/');
        Self::parse(&ByteString::from(format!("/{module}/{path}")))
    }

    /// Reassemble the full name
    pub fn full_name(&self) -> ByteString {
        let mut buf = Vec::with_capacity(
            self.module.len() + self.parent.len() + self.base.len() + self.extension.len() + 4,
        );
        write_full_name(
            &mut buf,
            self.module.as_bytes(),
            self.parent.as_bytes(),
            self.base.as_bytes(),
            self.extension.as_bytes(),
        );
        ByteString::from(buf)
    }

    /// Check whether reassembling the components yields `name` exactly
    ///
    /// Names with empty path segments such as `/m//C.class` do not survive
    /// splitting, and cannot be stored.
    pub fn is_canonical(&self, name: &ByteString) -> bool {
        self.full_name() == *name
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.full_name(), f)
    }
}

/// Append `/module/parent/base.extension` to `out`, omitting empty parts
pub(crate) fn write_full_name(
    out: &mut Vec<u8>,
    module: &[u8],
    parent: &[u8],
    base: &[u8],
    extension: &[u8],
) {
    if !module.is_empty() {
        out.push(b'/');
        out.extend_from_slice(module);
        out.push(b'/');
    }
    if !parent.is_empty() {
        out.extend_from_slice(parent);
        out.push(b'/');
    }
    out.extend_from_slice(base);
    if !extension.is_empty() {
        out.push(b'.');
        out.extend_from_slice(extension);
    }
}
