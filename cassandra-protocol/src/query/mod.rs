//! QUERY/PREPARE/EXECUTE/BATCH request shapes, one level above the raw frame encoders: these
//! types are what application code (and the driver crate's `Session`) actually builds.

pub mod batch_query_builder;
pub mod query_params;
pub mod query_values;
pub mod utils;

use std::sync::RwLock;

pub use batch_query_builder::{BatchQuery, BatchQueryBuilder, BatchType, QueryBatch};
pub use query_params::{QueryParams, QueryParamsBuilder};
pub use query_values::QueryValues;

/// A plain CQL statement plus its bound parameters.
#[derive(Debug, Clone)]
pub struct Query {
    pub query: String,
    pub params: QueryParams,
}

/// A previously-PREPAREd statement. `id` is behind a lock because transparent re-preparation
/// (§4.3 step 8, triggered by an UNPREPARED error) swaps it in place without invalidating
/// outstanding references to the same `PreparedQuery`.
#[derive(Debug)]
pub struct PreparedQuery {
    pub id: RwLock<Vec<u8>>,
    pub query: String,
}

impl PreparedQuery {
    pub fn current_id(&self) -> Vec<u8> {
        self.id.read().expect("prepared id lock poisoned").clone()
    }
}
