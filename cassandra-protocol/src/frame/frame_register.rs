use std::io::Cursor;

use crate::frame::events::SimpleServerEvent;
use crate::frame::{Direction, Flags, Frame, Opcode, Version};
use crate::types::{CIntShort, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyReqRegister {
    pub events: Vec<SimpleServerEvent>,
}

impl Serialize for BodyReqRegister {
    fn serialize(&self, cursor: &mut Cursor<&mut Vec<u8>>) {
        (self.events.len() as CIntShort).serialize(cursor);
        for event in &self.events {
            event.serialize(cursor);
        }
    }
}

impl Frame {
    pub fn new_req_register(version: Version, events: Vec<SimpleServerEvent>) -> Frame {
        let body = BodyReqRegister { events };
        Frame::new(
            version,
            Direction::Request,
            Flags::empty(),
            Opcode::Register,
            body.serialize_to_vec(),
            None,
            vec![],
        )
    }
}
