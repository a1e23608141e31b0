use std::io::Cursor;

use crate::error;
use crate::frame::{Direction, Flags, Frame, Opcode, Version};
use crate::types::{FromCursor, Serialize};

/// READY has an empty body; its mere presence means the connection has completed startup (no
/// authentication required, or authentication already done).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BodyResReady;

impl Serialize for BodyResReady {
    fn serialize(&self, _cursor: &mut Cursor<&mut Vec<u8>>) {}
}

impl FromCursor for BodyResReady {
    fn from_cursor(_cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        Ok(BodyResReady)
    }
}

impl Frame {
    #[cfg(test)]
    pub fn new_res_ready(version: Version) -> Frame {
        Frame::new(
            version,
            Direction::Response,
            Flags::empty(),
            Opcode::Ready,
            BodyResReady.serialize_to_vec(),
            None,
            vec![],
        )
    }
}
