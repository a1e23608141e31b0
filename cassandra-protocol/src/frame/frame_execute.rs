use std::io::Cursor;

use crate::frame::{Direction, Flags, Frame, Opcode, Version};
use crate::query::QueryParams;
use crate::types::{serialize_short_bytes, Serialize};

#[derive(Debug, Clone)]
pub struct BodyReqExecute<'a> {
    pub id: &'a [u8],
    pub params: &'a QueryParams,
}

impl Serialize for BodyReqExecute<'_> {
    fn serialize(&self, cursor: &mut Cursor<&mut Vec<u8>>) {
        serialize_short_bytes(cursor, self.id);
        self.params.serialize(cursor);
    }
}

impl Frame {
    pub fn new_req_execute(version: Version, id: &[u8], params: &QueryParams, flags: Flags) -> Frame {
        let body = BodyReqExecute { id, params };
        Frame::new(
            version,
            Direction::Request,
            flags,
            Opcode::Execute,
            body.serialize_to_vec(),
            None,
            vec![],
        )
    }
}
