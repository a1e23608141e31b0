use std::io::Cursor;

use crate::error;
use crate::types::{FromCursor, StringMultimap};

/// Body of a SUPPORTED response: the server's advertised `CQL_VERSION`, `COMPRESSION`, and
/// (v5+) `PROTOCOL_VERSIONS` option sets, as a `[string multimap]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BodyResSupported {
    pub data: StringMultimap,
}

impl BodyResSupported {
    pub fn supports_compression(&self, name: &str) -> bool {
        self.data
            .data
            .get("COMPRESSION")
            .map(|values| values.iter().any(|v| v.eq_ignore_ascii_case(name)))
            .unwrap_or(false)
    }
}

impl FromCursor for BodyResSupported {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        Ok(BodyResSupported {
            data: StringMultimap::from_cursor(cursor)?,
        })
    }
}
