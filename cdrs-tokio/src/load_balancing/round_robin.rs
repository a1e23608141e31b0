use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancing::LoadBalancingStrategy;

/// Cycles through every known node in turn, wrapping around. The simplest policy, and the
/// fallback when a cluster has a single datacenter and no particular routing preference.
#[derive(Debug, Default)]
pub struct RoundRobin<CM> {
    cluster: Vec<Arc<CM>>,
    position: AtomicUsize,
}

impl<CM> RoundRobin<CM> {
    pub fn new() -> Self {
        RoundRobin {
            cluster: Vec::new(),
            position: AtomicUsize::new(0),
        }
    }
}

impl<CM> LoadBalancingStrategy<CM> for RoundRobin<CM> {
    fn init(&mut self, cluster: Vec<Arc<CM>>) {
        self.cluster = cluster;
        self.position.store(0, Ordering::Relaxed);
    }

    fn next(&self) -> Option<Arc<CM>> {
        if self.cluster.is_empty() {
            return None;
        }

        let index = self.position.fetch_add(1, Ordering::Relaxed) % self.cluster.len();
        Some(self.cluster[index].clone())
    }

    fn size(&self) -> usize {
        self.cluster.len()
    }

    fn find<F>(&self, mut filter: F) -> Option<Arc<CM>>
    where
        F: FnMut(&Arc<CM>) -> bool,
    {
        self.cluster.iter().find(|cm| filter(cm)).cloned()
    }

    fn all(&self) -> Vec<Arc<CM>> {
        self.cluster.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug)]
    struct Node(u8);

    #[test]
    fn cycles_through_nodes() {
        let mut rr = RoundRobin::new();
        rr.init(vec![Arc::new(Node(1)), Arc::new(Node(2)), Arc::new(Node(3))]);

        let picks: Vec<u8> = (0..6).map(|_| rr.next().unwrap().0).collect();
        assert_eq!(picks, vec![1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn empty_cluster_returns_none() {
        let rr: RoundRobin<Node> = RoundRobin::new();
        assert!(rr.next().is_none());
    }
}
