use std::sync::Arc;

use rand::seq::IndexedRandom;

use crate::load_balancing::LoadBalancingStrategy;

/// Picks a uniformly random node per request. Cheaper than round robin under contention (no
/// shared counter to fight over) at the cost of uneven short-term distribution.
#[derive(Debug, Default)]
pub struct Random<CM> {
    cluster: Vec<Arc<CM>>,
}

impl<CM> Random<CM> {
    pub fn new() -> Self {
        Random {
            cluster: Vec::new(),
        }
    }
}

impl<CM> LoadBalancingStrategy<CM> for Random<CM> {
    fn init(&mut self, cluster: Vec<Arc<CM>>) {
        self.cluster = cluster;
    }

    fn next(&self) -> Option<Arc<CM>> {
        self.cluster.choose(&mut rand::rng()).cloned()
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
