//! The three event classes a connection can REGISTER for, and the server-pushed EVENT bodies
//! themselves (`frame_event.rs` decodes the latter).

use std::io::Cursor;

use derive_more::Display;

use crate::types::{serialize_str, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum SimpleServerEvent {
    #[display("TOPOLOGY_CHANGE")]
    TopologyChange,
    #[display("STATUS_CHANGE")]
    StatusChange,
    #[display("SCHEMA_CHANGE")]
    SchemaChange,
}

impl Serialize for SimpleServerEvent {
    fn serialize(&self, cursor: &mut Cursor<&mut Vec<u8>>) {
        serialize_str(cursor, &self.to_string());
    }
}
