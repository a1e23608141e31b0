use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::error;
use crate::retry::ReconnectionPolicy;
use crate::transport::CdrsTransport;

/// Up to `size` live connections to one host (§4.4): on an outbound request, picks the least-busy
/// one among those currently up; an empty or broken slot is (re)established via `establish`,
/// retried per `reconnection_policy` the same way a single connection would be. The pool counts
/// as "up" as soon as any slot holds a live connection and "down" only once every slot does not.
#[derive(Debug)]
pub struct ConnectionPool<T> {
    slots: Vec<ArcSwapOption<T>>,
}

impl<T: CdrsTransport> ConnectionPool<T> {
    /// `size` is clamped to at least 1 - a pool with no slots could never hold a connection.
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        ConnectionPool {
            slots: (0..size).map(|_| ArcSwapOption::empty()).collect(),
        }
    }

    pub async fn connection<F, Fut>(
        &self,
        reconnection_policy: &dyn ReconnectionPolicy,
        establish: F,
    ) -> error::Result<Arc<T>>
    where
        F: Fn(&ArcSwapOption<T>) -> Fut,
        Fut: Future<Output = error::Result<Arc<T>>>,
    {
        let mut best: Option<Arc<T>> = None;
        let mut needs_establish = None;

        for slot in &self.slots {
            match slot.load_full() {
                Some(connection) if !connection.is_broken() => {
                    best = Some(least_busy(best, connection));
                }
                _ => {
                    if needs_establish.is_none() {
                        needs_establish = Some(slot);
                    }
                }
            }
        }

        let Some(slot) = needs_establish else {
            return best.ok_or(error::Error::NoHostsAvailable);
        };

        let mut schedule = reconnection_policy.new_schedule();
        loop {
            match establish(slot).await {
                Ok(connection) => return Ok(least_busy(best, connection)),
                Err(err) => {
                    if let Some(connection) = &best {
                        return Ok(connection.clone());
                    }
                    match schedule.next_delay() {
                        Some(delay) => {
                            if !delay.is_zero() {
                                tokio::time::sleep(delay).await;
                            }
                        }
                        None => return Err(err),
                    }
                }
            }
        }
    }
}

fn least_busy<T: CdrsTransport>(best: Option<Arc<T>>, candidate: Arc<T>) -> Arc<T> {
    match best {
        Some(current) if current.in_flight() <= candidate.in_flight() => current,
        _ => candidate,
    }
}
