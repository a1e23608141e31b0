use std::io::Cursor;

use crate::consistency::Consistency;
use crate::query::query_values::QueryValues;
use crate::types::{serialize_long_str, serialize_short_bytes, CIntShort, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BatchType {
    Logged = 0,
    Unlogged = 1,
    Counter = 2,
}

/// One statement inside a BATCH: either a plain query string or a prepared-statement id, each
/// with its own bound values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchQuery {
    Simple { query: String, values: QueryValues },
    Prepared { id: Vec<u8>, values: QueryValues },
}

impl Serialize for BatchQuery {
    fn serialize(&self, cursor: &mut Cursor<&mut Vec<u8>>) {
        match self {
            BatchQuery::Simple { query, values } => {
                cursor.get_mut().push(0);
                serialize_long_str(cursor, query);
                values.serialize(cursor);
            }
            BatchQuery::Prepared { id, values } => {
                cursor.get_mut().push(1);
                serialize_short_bytes(cursor, id);
                values.serialize(cursor);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBatch {
    pub batch_type: BatchType,
    pub queries: Vec<BatchQuery>,
    pub consistency: Consistency,
    pub serial_consistency: Option<Consistency>,
    pub timestamp: Option<i64>,
    pub is_idempotent: bool,
    /// Partition-key bytes used by token-aware routing; never sent on the wire. Callers batching
    /// statements against the same partition can set this so the whole batch routes to the
    /// owning replica instead of the load balancer's default rotation.
    pub routing_key: Option<Vec<u8>>,
    /// Names an execution profile to resolve defaults from; never sent on the wire. See
    /// `QueryParams::execution_profile`.
    pub execution_profile: Option<String>,
}

impl Serialize for QueryBatch {
    fn serialize(&self, cursor: &mut Cursor<&mut Vec<u8>>) {
        cursor.get_mut().push(self.batch_type as u8);
        (self.queries.len() as CIntShort).serialize(cursor);
        for query in &self.queries {
            query.serialize(cursor);
        }

        self.consistency.serialize(cursor);

        let mut flags: u8 = 0;
        if self.serial_consistency.is_some() {
            flags |= 0x10;
        }
        if self.timestamp.is_some() {
            flags |= 0x20;
        }
        cursor.get_mut().push(flags);

        if let Some(serial_consistency) = self.serial_consistency {
            serial_consistency.serialize(cursor);
        }
        if let Some(timestamp) = self.timestamp {
            timestamp.serialize(cursor);
        }
    }
}

/// Mirrors `QueryParamsBuilder`'s chaining style.
#[derive(Debug)]
pub struct BatchQueryBuilder {
    batch_type: BatchType,
    queries: Vec<BatchQuery>,
    consistency: Consistency,
    serial_consistency: Option<Consistency>,
    timestamp: Option<i64>,
    is_idempotent: bool,
    routing_key: Option<Vec<u8>>,
    execution_profile: Option<String>,
}

impl Default for BatchQueryBuilder {
    fn default() -> Self {
        BatchQueryBuilder {
            batch_type: BatchType::Logged,
            queries: Vec::new(),
            consistency: Consistency::default(),
            serial_consistency: None,
            timestamp: None,
            is_idempotent: false,
            routing_key: None,
            execution_profile: None,
        }
    }
}

impl BatchQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_type(mut self, batch_type: BatchType) -> Self {
        self.batch_type = batch_type;
        self
    }

    pub fn add_query(mut self, query: impl ToString, values: QueryValues) -> Self {
        self.queries.push(BatchQuery::Simple {
            query: query.to_string(),
            values,
        });
        self
    }

    pub fn add_prepared(mut self, id: Vec<u8>, values: QueryValues) -> Self {
        self.queries.push(BatchQuery::Prepared { id, values });
        self
    }

    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = consistency;
        self
    }

    pub fn serial_consistency(mut self, consistency: Consistency) -> Self {
        self.serial_consistency = Some(consistency);
        self
    }

    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn idempotent(mut self, is_idempotent: bool) -> Self {
        self.is_idempotent = is_idempotent;
        self
    }

    pub fn routing_key(mut self, routing_key: Vec<u8>) -> Self {
        self.routing_key = Some(routing_key);
        self
    }

    pub fn execution_profile(mut self, name: impl Into<String>) -> Self {
        self.execution_profile = Some(name.into());
        self
    }

    pub fn finalize(self) -> QueryBatch {
        QueryBatch {
            batch_type: self.batch_type,
            queries: self.queries,
            consistency: self.consistency,
            serial_consistency: self.serial_consistency,
            timestamp: self.timestamp,
            is_idempotent: self.is_idempotent,
            routing_key: self.routing_key,
            execution_profile: self.execution_profile,
        }
    }
}
