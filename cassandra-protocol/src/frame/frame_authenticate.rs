use std::io::Cursor;

use crate::error;
use crate::types::{from_cursor_str, FromCursor};

/// Body of an AUTHENTICATE response: the fully-qualified class name of the `IAuthenticator`
/// the server wants the client to satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyResAuthenticate {
    pub authenticator: String,
}

impl FromCursor for BodyResAuthenticate {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        Ok(BodyResAuthenticate {
            authenticator: from_cursor_str(cursor)?.to_string(),
        })
    }
}
