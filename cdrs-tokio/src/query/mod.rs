//! Re-exports the wire-level request shapes from `cassandra-protocol`, plus the driver-level
//! helpers (`send_frame` and friends) that actually dispatch them through a `Session`.

pub use cassandra_protocol::query::{
    BatchQuery, BatchQueryBuilder, BatchType, PreparedQuery, Query, QueryBatch, QueryParams,
    QueryParamsBuilder, QueryValues,
};

pub mod utils;
