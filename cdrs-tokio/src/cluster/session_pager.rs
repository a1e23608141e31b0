use cassandra_protocol::frame::frame_result::BodyResResultRows;
use cassandra_protocol::frame::Frame;
use cassandra_protocol::query::{PreparedQuery, QueryParams, QueryParamsBuilder, QueryValues};

use crate::cluster::connection_manager::ConnectionManager;
use crate::error;
use crate::load_balancing::LoadBalancingStrategy;
use crate::transport::CdrsTransport;
use crate::Session;

/// Drives manual paging over a query or a prepared statement: each `next()` call sends one page
/// and stashes the server's `paging_state` for the next call, until the server reports no more
/// pages remain (§4.9's cousin for result sets rather than schema).
pub struct SessionPager<'a, T, CM, LB>
where
    T: CdrsTransport + Send + Sync + 'static,
    CM: ConnectionManager<T>,
    LB: LoadBalancingStrategy<CM> + Send + Sync,
{
    session: &'a Session<T, CM, LB>,
    page_size: i32,
    paging_state: Option<Vec<u8>>,
    has_more_pages: bool,
}

impl<'a, T, CM, LB> SessionPager<'a, T, CM, LB>
where
    T: CdrsTransport + Send + Sync + 'static,
    CM: ConnectionManager<T>,
    LB: LoadBalancingStrategy<CM> + Send + Sync,
{
    pub fn new(session: &'a Session<T, CM, LB>, page_size: i32) -> Self {
        SessionPager {
            session,
            page_size,
            paging_state: None,
            has_more_pages: true,
        }
    }

    /// `false` once the server has reported the last page; calling `query`/`exec` again after
    /// that starts over from the beginning with a fresh `None` paging state.
    pub fn has_more_pages(&self) -> bool {
        self.has_more_pages
    }

    fn params(&self, values: Option<QueryValues>) -> QueryParams {
        let mut builder = QueryParamsBuilder::new().page_size(self.page_size);
        if let Some(values) = values {
            builder = builder.values(values);
        }
        if let Some(paging_state) = self.paging_state.clone() {
            builder = builder.paging_state(paging_state);
        }
        builder.finalize()
    }

    fn record_page(&mut self, rows: &BodyResResultRows) {
        self.paging_state = rows.metadata.paging_state.clone();
        self.has_more_pages = self.paging_state.is_some();
    }

    /// Fetches the next page of a plain query.
    pub async fn query<Q: ToString + Send>(&mut self, query: Q) -> error::Result<Frame> {
        let params = self.params(None);
        let frame = self.session.query_with_params(query, params).await?;
        if let Some(rows) = frame.body()?.into_rows() {
            self.record_page(&rows);
        }
        Ok(frame)
    }

    /// Fetches the next page of a prepared statement, with bound values re-sent on every page.
    pub async fn exec_with_values(
        &mut self,
        prepared: &PreparedQuery,
        values: QueryValues,
    ) -> error::Result<Frame> {
        let params = self.params(Some(values));
        let frame = self.session.exec_with_params(prepared, params).await?;
        if let Some(rows) = frame.body()?.into_rows() {
            self.record_page(&rows);
        }
        Ok(frame)
    }
}
