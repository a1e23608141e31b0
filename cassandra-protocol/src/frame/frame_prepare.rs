use std::io::Cursor;

use crate::frame::{Direction, Flags, Frame, Opcode, Version};
use crate::types::{serialize_long_str, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyReqPrepare {
    pub query: String,
}

impl Serialize for BodyReqPrepare {
    fn serialize(&self, cursor: &mut Cursor<&mut Vec<u8>>) {
        serialize_long_str(cursor, &self.query);
    }
}

impl Frame {
    pub fn new_req_prepare(version: Version, query: String, flags: Flags) -> Frame {
        let body = BodyReqPrepare { query };
        Frame::new(
            version,
            Direction::Request,
            flags,
            Opcode::Prepare,
            body.serialize_to_vec(),
            None,
            vec![],
        )
    }
}
