use std::io::Cursor;
use std::net::SocketAddr;

use crate::error;
use crate::types::{from_cursor_inet, from_cursor_str, FromCursor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyChangeType {
    NewNode,
    RemovedNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChangeType {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaChangeType {
    Created,
    Updated,
    Dropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaChangeTarget {
    Keyspace,
    Table,
    Type,
    Function,
    Aggregate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaChange {
    pub change_type: SchemaChangeType,
    pub target: SchemaChangeTarget,
    pub keyspace: String,
    /// Table/type/function/aggregate name; absent for keyspace-level changes.
    pub name: Option<String>,
    /// Function/aggregate argument types, as raw CQL type strings (arg-type *parsing* is an
    /// external collaborator; the driver only needs them to disambiguate overloads).
    pub arg_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    TopologyChange {
        change_type: TopologyChangeType,
        addr: SocketAddr,
    },
    StatusChange {
        change_type: StatusChangeType,
        addr: SocketAddr,
    },
    SchemaChange(SchemaChange),
}

impl ServerEvent {
    pub fn is_schema_change(&self) -> bool {
        matches!(self, ServerEvent::SchemaChange(_))
    }
}

impl FromCursor for ServerEvent {
    fn from_cursor(cursor: &mut Cursor<&[u8]>) -> error::Result<Self> {
        let event_type = from_cursor_str(cursor)?.to_string();

        match event_type.as_str() {
            "TOPOLOGY_CHANGE" => {
                let change = from_cursor_str(cursor)?.to_string();
                let addr = from_cursor_inet(cursor)?;
                let change_type = match change.as_str() {
                    "NEW_NODE" => TopologyChangeType::NewNode,
                    "REMOVED_NODE" => TopologyChangeType::RemovedNode,
                    other => {
                        return Err(error::Error::General(format!(
                            "unknown TOPOLOGY_CHANGE kind: {other}"
                        )))
                    }
                };
                Ok(ServerEvent::TopologyChange { change_type, addr })
            }
            "STATUS_CHANGE" => {
                let change = from_cursor_str(cursor)?.to_string();
                let addr = from_cursor_inet(cursor)?;
                let change_type = match change.as_str() {
                    "UP" => StatusChangeType::Up,
                    "DOWN" => StatusChangeType::Down,
                    other => {
                        return Err(error::Error::General(format!(
                            "unknown STATUS_CHANGE kind: {other}"
                        )))
                    }
                };
                Ok(ServerEvent::StatusChange { change_type, addr })
            }
            "SCHEMA_CHANGE" => {
                let change = from_cursor_str(cursor)?.to_string();
                let change_type = match change.as_str() {
                    "CREATED" => SchemaChangeType::Created,
                    "UPDATED" => SchemaChangeType::Updated,
                    "DROPPED" => SchemaChangeType::Dropped,
                    other => {
                        return Err(error::Error::General(format!(
                            "unknown SCHEMA_CHANGE kind: {other}"
                        )))
                    }
                };

                let target = from_cursor_str(cursor)?.to_string();
                let target = match target.as_str() {
                    "KEYSPACE" => SchemaChangeTarget::Keyspace,
                    "TABLE" => SchemaChangeTarget::Table,
                    "TYPE" => SchemaChangeTarget::Type,
                    "FUNCTION" => SchemaChangeTarget::Function,
                    "AGGREGATE" => SchemaChangeTarget::Aggregate,
                    other => {
                        return Err(error::Error::General(format!(
                            "unknown SCHEMA_CHANGE target: {other}"
                        )))
                    }
                };

                let keyspace = from_cursor_str(cursor)?.to_string();
                let (name, arg_types) = if target == SchemaChangeTarget::Keyspace {
                    (None, Vec::new())
                } else {
                    let name = from_cursor_str(cursor)?.to_string();
                    let arg_types =
                        if matches!(
                            target,
                            SchemaChangeTarget::Function | SchemaChangeTarget::Aggregate
                        ) {
                            Vec::<String>::from_cursor(cursor)?
                        } else {
                            Vec::new()
                        };
                    (Some(name), arg_types)
                };

                Ok(ServerEvent::SchemaChange(SchemaChange {
                    change_type,
                    target,
                    keyspace,
                    name,
                    arg_types,
                }))
            }
            other => Err(error::Error::General(format!(
                "unknown server event type: {other}"
            ))),
        }
    }
}
