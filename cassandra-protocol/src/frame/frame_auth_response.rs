use std::io::Cursor;

use crate::frame::{Direction, Flags, Frame, Opcode, Version};
use crate::types::{serialize_bytes, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyReqAuthResponse {
    pub token: Vec<u8>,
}

impl BodyReqAuthResponse {
    pub fn new(token: Vec<u8>) -> Self {
        BodyReqAuthResponse { token }
    }
}

impl Serialize for BodyReqAuthResponse {
    fn serialize(&self, cursor: &mut Cursor<&mut Vec<u8>>) {
        serialize_bytes(cursor, Some(&self.token));
    }
}

impl Frame {
    pub fn new_req_auth_response(version: Version, token: Vec<u8>) -> Frame {
        let body = BodyReqAuthResponse::new(token);
        Frame::new(
            version,
            Direction::Request,
            Flags::empty(),
            Opcode::AuthResponse,
            body.serialize_to_vec(),
            None,
            vec![],
        )
    }
}
