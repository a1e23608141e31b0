use std::io::Cursor;

use bitflags::bitflags;

use crate::consistency::Consistency;
use crate::query::query_values::QueryValues;
use crate::types::value::Value;
use crate::types::{serialize_bytes, CInt, CLong, Serialize};

bitflags! {
    /// Query flags (v3+, §6 of the design doc). v1/v2 only ever set `VALUES`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct QueryFlags: u8 {
        const VALUES             = 0x01;
        const SKIP_METADATA      = 0x02;
        const PAGE_SIZE          = 0x04;
        const PAGING_STATE       = 0x08;
        const SERIAL_CONSISTENCY = 0x10;
        const DEFAULT_TIMESTAMP  = 0x20;
        const NAMES_FOR_VALUES   = 0x40;
    }
}

/// Parameters shared by QUERY, EXECUTE, and (per-statement, inside) BATCH.
///
/// This is also the vehicle for everything the spec calls "per-request overrides": a field left
/// `None` here falls through to the execution profile, then the cluster default, when the
/// request wrapper resolves it (§3 Request wrapper).
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pub consistency: Consistency,
    pub values: Option<QueryValues>,
    pub skip_metadata: bool,
    pub page_size: Option<i32>,
    pub paging_state: Option<Vec<u8>>,
    pub serial_consistency: Option<Consistency>,
    pub timestamp: Option<i64>,
    /// Not idempotent by default: the request handler must be told explicitly that retrying a
    /// write-timeout/server-error is safe (§4.3 step 6).
    pub is_idempotent: bool,
    /// Partition-key bytes used by token-aware routing; never sent on the wire.
    pub routing_key: Option<Vec<u8>>,
    /// Names an execution profile to resolve defaults from (consistency, timeout, retry,
    /// speculative execution, keyspace) where this struct's own fields were left at their
    /// default; never sent on the wire. Unknown name fails the request with
    /// `EXECUTION_PROFILE_INVALID` rather than silently falling back to the cluster default.
    pub execution_profile: Option<String>,
}

impl QueryParams {
    fn flags(&self) -> QueryFlags {
        let mut flags = QueryFlags::empty();
        if self.values.as_ref().is_some_and(|v| !v.is_empty()) {
            flags.insert(QueryFlags::VALUES);
            if self.values.as_ref().unwrap().is_named() {
                flags.insert(QueryFlags::NAMES_FOR_VALUES);
            }
        }
        if self.skip_metadata {
            flags.insert(QueryFlags::SKIP_METADATA);
        }
        if self.page_size.is_some() {
            flags.insert(QueryFlags::PAGE_SIZE);
        }
        if self.paging_state.is_some() {
            flags.insert(QueryFlags::PAGING_STATE);
        }
        if self.serial_consistency.is_some() {
            flags.insert(QueryFlags::SERIAL_CONSISTENCY);
        }
        if self.timestamp.is_some() {
            flags.insert(QueryFlags::DEFAULT_TIMESTAMP);
        }
        flags
    }
}

impl Serialize for QueryParams {
    fn serialize(&self, cursor: &mut Cursor<&mut Vec<u8>>) {
        self.consistency.serialize(cursor);
        cursor.get_mut().push(self.flags().bits());

        if let Some(values) = &self.values {
            if !values.is_empty() {
                values.serialize(cursor);
            }
        }

        if let Some(page_size) = self.page_size {
            (page_size as CInt).serialize(cursor);
        }

        if let Some(paging_state) = &self.paging_state {
            serialize_bytes(cursor, Some(paging_state));
        }

        if let Some(serial_consistency) = self.serial_consistency {
            serial_consistency.serialize(cursor);
        }

        if let Some(timestamp) = self.timestamp {
            (timestamp as CLong).serialize(cursor);
        }
    }
}

/// Builder matching the teacher's query-builder style elsewhere in the crate (see
/// `BatchQueryBuilder`): every setter takes `self` by value so calls chain without a mutable
/// local.
#[derive(Debug, Default)]
pub struct QueryParamsBuilder {
    params: QueryParams,
}

impl QueryParamsBuilder {
    pub fn new() -> Self {
        QueryParamsBuilder::default()
    }

    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.params.consistency = consistency;
        self
    }

    pub fn values(mut self, values: QueryValues) -> Self {
        self.params.values = Some(values);
        self
    }

    pub fn page_size(mut self, page_size: i32) -> Self {
        self.params.page_size = Some(page_size);
        self
    }

    pub fn paging_state(mut self, paging_state: Vec<u8>) -> Self {
        self.params.paging_state = Some(paging_state);
        self
    }

    pub fn serial_consistency(mut self, consistency: Consistency) -> Self {
        self.params.serial_consistency = Some(consistency);
        self
    }

    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.params.timestamp = Some(timestamp);
        self
    }

    pub fn idempotent(mut self, is_idempotent: bool) -> Self {
        self.params.is_idempotent = is_idempotent;
        self
    }

    pub fn routing_key(mut self, routing_key: Vec<u8>) -> Self {
        self.params.routing_key = Some(routing_key);
        self
    }

    pub fn execution_profile(mut self, name: impl Into<String>) -> Self {
        self.params.execution_profile = Some(name.into());
        self
    }

    pub fn finalize(self) -> QueryParams {
        self.params
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_values_do_not_set_the_values_flag() {
        let params = QueryParamsBuilder::new()
            .values(QueryValues::SimpleValues(vec![]))
            .finalize();
        assert!(!params.flags().contains(QueryFlags::VALUES));
    }

    #[test]
    fn named_values_set_both_flags() {
        let mut map = std::collections::HashMap::new();
        map.insert("a".to_string(), Value::from(1i32));
        let params = QueryParamsBuilder::new()
            .values(QueryValues::NamedValues(map))
            .finalize();
        assert!(params.flags().contains(QueryFlags::VALUES));
        assert!(params.flags().contains(QueryFlags::NAMES_FOR_VALUES));
    }
}
