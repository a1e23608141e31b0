use std::io::Cursor;

use crate::frame::{Direction, Flags, Frame, Opcode, Version};
use crate::query::{Query, QueryParams};
use crate::types::{serialize_long_str, Serialize};

impl Serialize for Query {
    fn serialize(&self, cursor: &mut Cursor<&mut Vec<u8>>) {
        serialize_long_str(cursor, &self.query);
        self.params.serialize(cursor);
    }
}

impl Frame {
    pub fn new_query(version: Version, query: Query, flags: Flags) -> Frame {
        Frame::new(
            version,
            Direction::Request,
            flags,
            Opcode::Query,
            query.serialize_to_vec(),
            None,
            vec![],
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::consistency::Consistency;

    #[test]
    fn new_query_carries_the_query_string() {
        let query = Query {
            query: "SELECT * FROM system.local".to_string(),
            params: QueryParams {
                consistency: Consistency::One,
                ..Default::default()
            },
        };
        let frame = Frame::new_query(Version::V4, query, Flags::empty());
        assert_eq!(frame.opcode, Opcode::Query);
        assert!(!frame.body.is_empty());
    }
}
