use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use cassandra_protocol::consistency::Consistency;
use cassandra_protocol::token::Token;

use crate::load_balancing::dc_aware_round_robin::NodeDistance;
use crate::load_balancing::LoadBalancingStrategy;

/// Wraps a fallback policy with a token ring (§4.2's `Murmur3Partitioner` ordering), so requests
/// carrying a routing key can be sent straight to a replica instead of going through the fallback
/// policy's rotation. `next()` always defers to the fallback; `replica_for_token` is the
/// token-aware entry point the request handler calls when it has a routing key.
#[derive(Debug)]
pub struct TokenAwareRoundRobin<CM, F> {
    fallback: F,
    ring: RwLock<BTreeMap<Token, Arc<CM>>>,
}

impl<CM, F: LoadBalancingStrategy<CM>> TokenAwareRoundRobin<CM, F> {
    pub fn new(fallback: F) -> Self {
        TokenAwareRoundRobin {
            fallback,
            ring: RwLock::new(BTreeMap::new()),
        }
    }

    /// Replaces the token -> node assignment, typically called by the control connection after
    /// refreshing `system.peers`.
    pub fn set_ring(&self, ring: BTreeMap<Token, Arc<CM>>) {
        *self.ring.write().unwrap() = ring;
    }

    /// Finds the node owning the first token at or after `token` in ring order, wrapping to the
    /// smallest token if `token` is past every assigned range - `Murmur3Partitioner`'s ring is
    /// circular.
    pub fn replica_for_token(&self, token: Token) -> Option<Arc<CM>> {
        let ring = self.ring.read().unwrap();
        ring.range(token..)
            .next()
            .or_else(|| ring.iter().next())
            .map(|(_, cm)| cm.clone())
    }
}

impl<CM: NodeDistance, F: LoadBalancingStrategy<CM>> LoadBalancingStrategy<CM>
    for TokenAwareRoundRobin<CM, F>
{
    fn init(&mut self, cluster: Vec<Arc<CM>>) {
        self.fallback.init(cluster);
    }

    fn next(&self) -> Option<Arc<CM>> {
        self.fallback.next()
    }

    fn next_for_request(&self, token: Option<Token>, consistency: Consistency) -> Option<Arc<CM>> {
        if let Some(token) = token {
            if let Some(replica) = self.replica_for_token(token) {
                return Some(replica);
            }
        }

        self.fallback.next_for_request(token, consistency)
    }

    fn size(&self) -> usize {
        self.fallback.size()
    }

    fn find<Filter>(&self, filter: Filter) -> Option<Arc<CM>>
    where
        Filter: FnMut(&Arc<CM>) -> bool,
    {
        self.fallback.find(filter)
    }

    fn all(&self) -> Vec<Arc<CM>> {
        self.fallback.all()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::load_balancing::RoundRobin;
    use std::net::SocketAddr;

    #[derive(Debug)]
    struct Node(SocketAddr);

    impl NodeDistance for Node {
        fn addr(&self) -> SocketAddr {
            self.0
        }
    }

    #[test]
    fn finds_owning_replica() {
        let policy = TokenAwareRoundRobin::new(RoundRobin::new());
        let node_a = Arc::new(Node("127.0.0.1:1".parse().unwrap()));
        let node_b = Arc::new(Node("127.0.0.1:2".parse().unwrap()));

        let mut ring = BTreeMap::new();
        ring.insert(0, node_a.clone());
        ring.insert(100, node_b.clone());
        policy.set_ring(ring);

        assert_eq!(policy.replica_for_token(50).unwrap().0, node_b.0);
        assert_eq!(policy.replica_for_token(150).unwrap().0, node_a.0);
    }

    #[test]
    fn next_for_token_routes_to_the_owning_replica() {
        let mut policy = TokenAwareRoundRobin::new(RoundRobin::new());
        let node_a = Arc::new(Node("127.0.0.1:1".parse().unwrap()));
        let node_b = Arc::new(Node("127.0.0.1:2".parse().unwrap()));

        LoadBalancingStrategy::init(&mut policy, vec![node_a.clone(), node_b.clone()]);

        let mut ring = BTreeMap::new();
        ring.insert(0, node_a.clone());
        ring.insert(100, node_b.clone());
        policy.set_ring(ring);

        assert_eq!(
            policy
                .next_for_request(Some(50), Consistency::One)
                .unwrap()
                .0,
            node_b.0
        );
        // No token: falls back to the wrapped policy instead of consulting the ring.
        assert!(policy.next_for_request(None, Consistency::One).is_some());
    }
}
