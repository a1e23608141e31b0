use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cassandra_protocol::consistency::Consistency;
use cassandra_protocol::token::Token;

use crate::load_balancing::LoadBalancingStrategy;

/// Anything a `LoadBalancingStrategy` needs to know about a node besides how to reach it: its
/// address and (optionally) its datacenter, for policies that care about locality.
pub trait NodeDistance {
    fn addr(&self) -> SocketAddr;

    fn datacenter(&self) -> Option<&str> {
        None
    }
}

/// Prefers nodes in `local_dc`, falling back to other datacenters only once the local ones are
/// exhausted. Matches `DCAwareRoundRobinPolicy` from the Java/Python drivers, including its two
/// knobs for how far that fallback is allowed to go:
///
/// - `used_hosts_per_remote_dc` caps how many nodes from each remote DC are even considered,
///   rather than piling every remote node into the fallback rotation.
/// - `allow_remote_for_local_cl` additionally refuses the remote fallback outright when the
///   request's consistency level is a `LOCAL_*` one, since a remote node can't serve those.
#[derive(Debug)]
pub struct DcAwareRoundRobin<CM> {
    local_dc: String,
    used_hosts_per_remote_dc: usize,
    allow_remote_for_local_cl: bool,
    local: Vec<Arc<CM>>,
    remote: Vec<Arc<CM>>,
    local_position: AtomicUsize,
    remote_position: AtomicUsize,
}

impl<CM> DcAwareRoundRobin<CM> {
    /// `used_hosts_per_remote_dc` nodes are kept per remote datacenter; the rest are never
    /// routed to. `allow_remote_for_local_cl` controls whether a `LOCAL_*` consistency request
    /// is allowed to fall back to a remote node at all once the local DC is exhausted.
    pub fn new(
        local_dc: impl Into<String>,
        used_hosts_per_remote_dc: usize,
        allow_remote_for_local_cl: bool,
    ) -> Self {
        DcAwareRoundRobin {
            local_dc: local_dc.into(),
            used_hosts_per_remote_dc,
            allow_remote_for_local_cl,
            local: Vec::new(),
            remote: Vec::new(),
            local_position: AtomicUsize::new(0),
            remote_position: AtomicUsize::new(0),
        }
    }

    fn next_remote(&self) -> Option<Arc<CM>> {
        if self.remote.is_empty() {
            return None;
        }

        let index = self.remote_position.fetch_add(1, Ordering::Relaxed) % self.remote.len();
        Some(self.remote[index].clone())
    }
}

impl<CM: NodeDistance> LoadBalancingStrategy<CM> for DcAwareRoundRobin<CM> {
    fn init(&mut self, cluster: Vec<Arc<CM>>) {
        let mut local = Vec::new();
        let mut remote = Vec::new();
        let mut remote_dc_counts: HashMap<String, usize> = HashMap::new();

        for cm in cluster {
            match cm.datacenter() {
                Some(dc) if dc == self.local_dc => local.push(cm),
                Some(dc) => {
                    let count = remote_dc_counts.entry(dc.to_string()).or_insert(0);
                    if *count < self.used_hosts_per_remote_dc {
                        *count += 1;
                        remote.push(cm);
                    }
                }
                None => {}
            }
        }

        self.local = local;
        self.remote = remote;
        self.local_position.store(0, Ordering::Relaxed);
        self.remote_position.store(0, Ordering::Relaxed);
    }

    fn next(&self) -> Option<Arc<CM>> {
        if !self.local.is_empty() {
            let index = self.local_position.fetch_add(1, Ordering::Relaxed) % self.local.len();
            return Some(self.local[index].clone());
        }

        self.next_remote()
    }

    fn next_for_request(&self, _token: Option<Token>, consistency: Consistency) -> Option<Arc<CM>> {
        if !self.local.is_empty() {
            let index = self.local_position.fetch_add(1, Ordering::Relaxed) % self.local.len();
            return Some(self.local[index].clone());
        }

        if consistency.is_local() && !self.allow_remote_for_local_cl {
            return None;
        }

        self.next_remote()
    }

    fn size(&self) -> usize {
        self.local.len() + self.remote.len()
    }

    fn find<F>(&self, mut filter: F) -> Option<Arc<CM>>
    where
        F: FnMut(&Arc<CM>) -> bool,
    {
        self.local
            .iter()
            .chain(self.remote.iter())
            .find(|cm| filter(cm))
            .cloned()
    }

    fn all(&self) -> Vec<Arc<CM>> {
        self.local.iter().chain(self.remote.iter()).cloned().collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug)]
    struct Node {
        addr: SocketAddr,
        dc: &'static str,
    }

    impl NodeDistance for Node {
        fn addr(&self) -> SocketAddr {
            self.addr
        }

        fn datacenter(&self) -> Option<&str> {
            Some(self.dc)
        }
    }

    fn node(port: u16, dc: &'static str) -> Arc<Node> {
        Arc::new(Node {
            addr: format!("127.0.0.1:{port}").parse().unwrap(),
            dc,
        })
    }

    #[test]
    fn prefers_local_dc() {
        let mut policy = DcAwareRoundRobin::new("dc1", 2, true);
        policy.init(vec![node(1, "dc2"), node(2, "dc1"), node(3, "dc1")]);

        for _ in 0..4 {
            assert_eq!(policy.next().unwrap().dc, "dc1");
        }
    }

    #[test]
    fn falls_back_to_remote_when_local_empty() {
        let mut policy = DcAwareRoundRobin::new("dc1", 2, true);
        policy.init(vec![node(1, "dc2")]);
        assert_eq!(policy.next().unwrap().dc, "dc2");
    }

    #[test]
    fn caps_hosts_considered_per_remote_dc() {
        let mut policy = DcAwareRoundRobin::new("dc1", 1, true);
        policy.init(vec![node(1, "dc2"), node(2, "dc2"), node(3, "dc2")]);

        assert_eq!(policy.size(), 1);
    }

    #[test]
    fn disallows_remote_fallback_for_local_consistency_when_configured() {
        let mut policy = DcAwareRoundRobin::new("dc1", 2, false);
        policy.init(vec![node(1, "dc2")]);

        assert!(policy
            .next_for_request(None, Consistency::LocalQuorum)
            .is_none());
        assert!(policy.next_for_request(None, Consistency::Quorum).is_some());
    }

    #[test]
    fn allows_remote_fallback_for_local_consistency_when_configured() {
        let mut policy = DcAwareRoundRobin::new("dc1", 2, true);
        policy.init(vec![node(1, "dc2")]);

        assert!(policy
            .next_for_request(None, Consistency::LocalQuorum)
            .is_some());
    }
}
