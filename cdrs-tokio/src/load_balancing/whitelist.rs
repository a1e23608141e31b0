use std::net::SocketAddr;
use std::sync::Arc;

use crate::load_balancing::dc_aware_round_robin::NodeDistance;
use crate::load_balancing::LoadBalancingStrategy;

/// Restricts a wrapped policy to only the given addresses - useful for pinning a session to a set
/// of analytics or reporting nodes.
#[derive(Debug)]
pub struct Whitelist<CM, F> {
    fallback: F,
    allowed: Vec<SocketAddr>,
    _node: std::marker::PhantomData<CM>,
}

impl<CM, F> Whitelist<CM, F> {
    pub fn new(fallback: F, allowed: Vec<SocketAddr>) -> Self {
        Whitelist {
            fallback,
            allowed,
            _node: std::marker::PhantomData,
        }
    }
}

impl<CM: NodeDistance, F: LoadBalancingStrategy<CM>> LoadBalancingStrategy<CM> for Whitelist<CM, F> {
    fn init(&mut self, cluster: Vec<Arc<CM>>) {
        let filtered = cluster
            .into_iter()
            .filter(|cm| self.allowed.contains(&cm.addr()))
            .collect();
        self.fallback.init(filtered);
    }

    fn next(&self) -> Option<Arc<CM>> {
        self.fallback.next()
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

/// The inverse of `Whitelist`: excludes the given addresses from a wrapped policy's rotation.
#[derive(Debug)]
pub struct Blacklist<CM, F> {
    fallback: F,
    denied: Vec<SocketAddr>,
    _node: std::marker::PhantomData<CM>,
}

impl<CM, F> Blacklist<CM, F> {
    pub fn new(fallback: F, denied: Vec<SocketAddr>) -> Self {
        Blacklist {
            fallback,
            denied,
            _node: std::marker::PhantomData,
        }
    }
}

impl<CM: NodeDistance, F: LoadBalancingStrategy<CM>> LoadBalancingStrategy<CM> for Blacklist<CM, F> {
    fn init(&mut self, cluster: Vec<Arc<CM>>) {
        let filtered = cluster
            .into_iter()
            .filter(|cm| !self.denied.contains(&cm.addr()))
            .collect();
        self.fallback.init(filtered);
    }

    fn next(&self) -> Option<Arc<CM>> {
        self.fallback.next()
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
