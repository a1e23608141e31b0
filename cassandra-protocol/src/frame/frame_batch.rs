use crate::frame::{Direction, Flags, Frame, Opcode, Version};
use crate::query::QueryBatch;
use crate::types::Serialize;

impl Frame {
    pub fn new_req_batch(version: Version, batch: QueryBatch, flags: Flags) -> Frame {
        Frame::new(
            version,
            Direction::Request,
            flags,
            Opcode::Batch,
            batch.serialize_to_vec(),
            None,
            vec![],
        )
    }
}
