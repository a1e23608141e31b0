use std::io::Cursor;

use crate::error;
use crate::types::{from_cursor_bytes, FromCursor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyResAuthChallenge {
    pub data: Option<Vec<u8>>,
}

impl FromCursor for BodyResAuthChallenge {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        Ok(BodyResAuthChallenge {
            data: from_cursor_bytes(cursor)?,
        })
    }
}
